//! Shell completion: candidates, protocol flags and completion scripts.
//!
//! Generated scripts call the program back with `--complete-bash` or
//! `--complete-zsh` followed by the words typed so far (the last one being
//! the word under the cursor, possibly empty).

use std::collections::BTreeMap;
use std::io::{self, Write};

use cmdroute_core::Completion;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::resolve::{Arity, looks_like_flag, token_arity};

impl Dispatcher {
    /// Registered paths starting with `prefix` (normalized), sorted.
    pub fn command_completions(&self, prefix: &str) -> Vec<Completion> {
        let prefix = crate::normalize_path(prefix);
        self.entries()
            .into_iter()
            .filter(|entry| entry.path.starts_with(&prefix))
            .map(|entry| Completion {
                value: entry.path.clone(),
                description: entry.usage.clone(),
                nullary: false,
            })
            .collect()
    }

    /// Candidates for the last word of `args`, given the words before it.
    ///
    /// Before a command is identified, candidates are the next words of
    /// matching command paths. Once a command is identified, they are its
    /// sub-command words plus its flags (flags only when the current word is
    /// empty or starts with `-`). Nothing is offered while a value-taking
    /// flag waits for its value.
    pub fn complete(&self, args: &[String]) -> Vec<Completion> {
        let (current, preceding) = match args.split_last() {
            Some((last, rest)) => (last.as_str(), rest),
            None => ("", &[][..]),
        };

        let Some(resolved) = self.resolve(preceding) else {
            let words: Vec<&str> = preceding
                .iter()
                .map(String::as_str)
                .filter(|token| !looks_like_flag(token))
                .collect();
            return self.next_words(&words, current);
        };
        let Some(entry) = self.commands.get(&resolved.path) else {
            return Vec::new();
        };

        if let Some(last) = resolved.args.last() {
            if looks_like_flag(last) && token_arity(entry.flags(), last) == Some(Arity::NeedsValue) {
                debug!(flag = %last, "completing a flag value; no candidates");
                return Vec::new();
            }
        }

        let path_words: Vec<&str> = entry.path.split(' ').collect();
        let mut candidates = self.next_words(&path_words, current);
        if current.is_empty() || current.starts_with('-') {
            candidates.extend(entry.flags().flag_completions(current));
        }
        candidates
    }

    /// Distinct words that follow `words` in registered paths and start with
    /// `current`. A word carries the usage text of the command it completes.
    fn next_words(&self, words: &[&str], current: &str) -> Vec<Completion> {
        let mut found: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in self.commands.values() {
            let path: Vec<&str> = entry.path.split(' ').collect();
            if path.len() <= words.len() || path[..words.len()] != *words {
                continue;
            }
            let word = path[words.len()];
            if !word.starts_with(current) {
                continue;
            }
            let description = found.entry(word).or_default();
            if path.len() == words.len() + 1 {
                *description = entry.usage.as_str();
            }
        }

        found
            .into_iter()
            .map(|(word, description)| Completion {
                value: word.to_string(),
                description: description.to_string(),
                nullary: false,
            })
            .collect()
    }

    /// Answers a completion request if `args` is one. Returns whether it was.
    pub(crate) fn handle_completion<W: Write>(&self, args: &[String], out: &mut W) -> io::Result<bool> {
        if let Some(var) = &self.config().completion_env {
            if std::env::var_os(var).is_some_and(|value| !value.is_empty()) {
                self.write_bash_completions(args, out)?;
                return Ok(true);
            }
        }

        if !self.config().completion_flags {
            return Ok(false);
        }
        let Some((first, rest)) = args.split_first() else {
            return Ok(false);
        };
        match first.as_str() {
            "--complete-bash" => self.write_bash_completions(rest, out)?,
            "--complete-zsh" => self.write_zsh_completions(rest, out)?,
            "--generate-bash-completion" => out.write_all(self.bash_completion_script().as_bytes())?,
            "--generate-zsh-completion" => out.write_all(self.zsh_completion_script().as_bytes())?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// One candidate per line.
    pub fn write_bash_completions<W: Write>(&self, args: &[String], out: &mut W) -> io::Result<()> {
        for candidate in self.complete(args) {
            writeln!(out, "{}", candidate.value)?;
        }
        Ok(())
    }

    /// `value:description` per line (`value` alone without a description),
    /// with colons in the value escaped for `_describe`.
    pub fn write_zsh_completions<W: Write>(&self, args: &[String], out: &mut W) -> io::Result<()> {
        for candidate in self.complete(args) {
            let value = candidate.value.replace(':', "\\:");
            if candidate.description.is_empty() {
                writeln!(out, "{value}")?;
            } else {
                writeln!(out, "{value}:{}", candidate.description)?;
            }
        }
        Ok(())
    }

    /// A bash script that registers completion for the program.
    pub fn bash_completion_script(&self) -> String {
        let name = self.name();
        let function = format!("_{}_completion", shell_identifier(name));
        format!(
            r#"# bash completion for {name}
{function}() {{
    local cur="${{COMP_WORDS[COMP_CWORD]}}"
    local IFS=$'\n'
    local completions
    completions=$({name} --complete-bash "${{COMP_WORDS[@]:1:$COMP_CWORD}}")
    COMPREPLY=( $(compgen -W "$completions" -- "$cur") )
}}

complete -F {function} {name}
"#
        )
    }

    /// A zsh script that registers completion for the program.
    pub fn zsh_completion_script(&self) -> String {
        let name = self.name();
        let function = format!("_{}", shell_identifier(name));
        format!(
            r#"#compdef {name}

{function}() {{
    local -a candidates
    candidates=("${{(@f)$({name} --complete-zsh "${{(@)words[2,CURRENT]}}")}}")
    _describe 'command' candidates
}}

{function} "$@"
"#
        )
    }
}

/// Replaces characters that cannot appear in a shell function name.
fn shell_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
