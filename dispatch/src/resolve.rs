//! Command-path resolution with interspersed flags.
//!
//! Callers may put flags before, between or after the words of a multi-word
//! command path. The option schema that decides whether a flag takes a value
//! is only known once the command is identified, so resolution works in two
//! steps:
//!
//! 1. Classify tokens into path-word candidates and flags. A flag followed
//!    by a non-flag token tentatively treats that token as a further path
//!    word when doing so still prefixes a registered path, and as the flag's
//!    value otherwise.
//! 2. Try the candidate words longest-first. For each registered prefix,
//!    check every tentative decision made before the end of the path against
//!    the matched command's own schema: each flag must be known to it, and
//!    none may have been given a value it cannot take. The first prefix whose
//!    decisions all hold wins.

use cmdroute_core::FlagSet;
use tracing::debug;

use crate::dispatcher::{Dispatcher, normalize_path};

/// A matched command path and the argument vector its schema should parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: String,
    pub args: Vec<String>,
}

/// How many tokens a flag token accounts for, given a concrete schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    /// Complete on its own: a nullary flag, `--name=value`, or a short
    /// cluster carrying its value inline.
    Complete,
    /// Needs the following token as its value.
    NeedsValue,
}

/// A flag-looking token set aside during classification.
#[derive(Debug)]
struct Skipped<'a> {
    flag: &'a str,
    value: Option<&'a str>,
    index: usize,
}

/// Whether the parser would treat `token` as a flag (a bare `-` is a literal).
pub(crate) fn looks_like_flag(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

pub(crate) fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

/// Arity of `token` against `flags`, or `None` if any part of it is not
/// registered.
pub(crate) fn token_arity(flags: &FlagSet, token: &str) -> Option<Arity> {
    if let Some(body) = token.strip_prefix("--") {
        return match body.split_once('=') {
            Some((name, _)) => flags.lookup(name).map(|_| Arity::Complete),
            None => flags.lookup(body).map(|flag| {
                if flag.is_nullary() {
                    Arity::Complete
                } else {
                    Arity::NeedsValue
                }
            }),
        };
    }

    let mut chars = token.strip_prefix('-')?.chars().peekable();
    while let Some(c) = chars.next() {
        let flag = flags.lookup_short(c)?;
        if !flag.is_nullary() {
            return Some(if chars.peek().is_some() {
                Arity::Complete
            } else {
                Arity::NeedsValue
            });
        }
    }
    Some(Arity::Complete)
}

/// Whether the tentative value decision for `item` is compatible with
/// `flags`. Only a value given to a flag that cannot take one is refuted; a
/// value-taking flag left without one picks up its value when the command
/// parses its arguments.
fn assumption_holds(flags: &FlagSet, item: &Skipped<'_>) -> bool {
    match token_arity(flags, item.flag) {
        Some(Arity::Complete) => item.value.is_none(),
        Some(Arity::NeedsValue) => true,
        None => is_help_flag(item.flag),
    }
}

impl Dispatcher {
    /// Finds the command `args` address, allowing flags anywhere around the
    /// path words.
    ///
    /// The returned vector holds the flags (and their values) that appeared
    /// up to the last path word, in their original order, followed by every
    /// token after the last path word verbatim. Returns `None` when no
    /// registered path validates.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdroute_core::FlagSet;
    /// use cmdroute_dispatch::{Dispatcher, FnCommand};
    ///
    /// let mut fs = FlagSet::new("start");
    /// fs.add_string("config", Some('C'), "", "config file")
    ///     .add_bool("verbose", Some('v'), false, "");
    ///
    /// let mut d = Dispatcher::new("app");
    /// d.dispatch("server start", FnCommand::new(fs, |_: &FlagSet, _: &[String]| Ok(())));
    ///
    /// let args: Vec<String> = ["server", "-C", "prod.yml", "start", "-v", "web"]
    ///     .into_iter()
    ///     .map(String::from)
    ///     .collect();
    /// let resolved = d.resolve(&args).unwrap();
    /// assert_eq!(resolved.path, "server start");
    /// assert_eq!(resolved.args, ["-C", "prod.yml", "-v", "web"]);
    /// ```
    pub fn resolve(&self, args: &[String]) -> Option<Resolved> {
        let mut words: Vec<(usize, &str)> = Vec::new();
        let mut skipped: Vec<Skipped<'_>> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "--" {
                break;
            }
            if !looks_like_flag(arg) {
                words.push((i, arg));
                i += 1;
                continue;
            }

            let attached = arg.starts_with("--") && arg.contains('=');
            let next = args
                .get(i + 1)
                .map(String::as_str)
                .filter(|next| !looks_like_flag(next));

            match next {
                Some(value) if !attached && !self.extends_path(&words, value) => {
                    skipped.push(Skipped {
                        flag: arg,
                        value: Some(value),
                        index: i,
                    });
                    i += 2;
                }
                _ => {
                    skipped.push(Skipped {
                        flag: arg,
                        value: None,
                        index: i,
                    });
                    i += 1;
                }
            }
        }

        for end in (1..=words.len()).rev() {
            let joined: Vec<&str> = words[..end].iter().map(|&(_, word)| word).collect();
            let path = normalize_path(&joined.join(" "));
            let Some(entry) = self.commands.get(&path) else {
                continue;
            };

            let boundary = words[end - 1].0;
            let before: Vec<&Skipped<'_>> = skipped.iter().filter(|item| item.index <= boundary).collect();

            if let Some(bad) = before.iter().find(|item| !assumption_holds(&entry.flags, item)) {
                debug!(
                    path = %path,
                    flag = bad.flag,
                    assumed_value = ?bad.value,
                    "candidate path rejected by its option schema"
                );
                continue;
            }

            let mut sub_args = Vec::with_capacity(args.len());
            for item in before {
                sub_args.push(item.flag.to_string());
                if let Some(value) = item.value {
                    sub_args.push(value.to_string());
                }
            }
            sub_args.extend_from_slice(&args[boundary + 1..]);

            debug!(path = %path, args = ?sub_args, "resolved command");
            return Some(Resolved { path, args: sub_args });
        }

        debug!(args = ?args, "no command path matched");
        None
    }

    /// Whether `words` plus `next` is a word-wise prefix of a registered path.
    fn extends_path(&self, words: &[(usize, &str)], next: &str) -> bool {
        let candidate: Vec<&str> = words
            .iter()
            .flat_map(|&(_, word)| word.split_whitespace())
            .chain(next.split_whitespace())
            .collect();

        self.commands.keys().any(|path| {
            let mut registered = path.split_whitespace();
            candidate.iter().all(|word| registered.next() == Some(*word))
        })
    }

    /// Plain longest-prefix lookup: the longest run of leading tokens that
    /// names a registered path, and the tokens after it.
    pub fn find_command<'a>(&self, args: &'a [String]) -> Option<(&crate::CommandEntry, &'a [String])> {
        (1..=args.len()).rev().find_map(|end| {
            let path = normalize_path(&args[..end].join(" "));
            self.commands.get(&path).map(|entry| (entry, &args[end..]))
        })
    }
}
