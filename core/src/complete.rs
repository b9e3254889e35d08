//! Flag-level completion candidates.

use serde::Serialize;

use crate::flag::Flag;
use crate::flagset::FlagSet;

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub value: String,
    pub description: String,
    /// The candidate is a flag that takes no value.
    pub nullary: bool,
}

impl Completion {
    fn for_flag(value: String, flag: &Flag) -> Self {
        Self {
            value,
            description: flag.usage.clone(),
            nullary: flag.is_nullary(),
        }
    }
}

impl FlagSet {
    /// Completion candidates for a partially typed flag token.
    ///
    /// - `--ver` matches long names starting with `ver`.
    /// - `-` lists every short flag; `-v` yields `-v` if registered.
    /// - An empty prefix lists every long and short flag.
    ///
    /// Anything else yields nothing. Candidates are sorted by value.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdroute_core::FlagSet;
    ///
    /// let mut fs = FlagSet::new("build");
    /// fs.add_bool("verbose", Some('v'), false, "verbose output")
    ///     .add_string("version-file", None, "", "");
    ///
    /// let values: Vec<String> = fs.flag_completions("--ver").into_iter().map(|c| c.value).collect();
    /// assert_eq!(values, ["--verbose", "--version-file"]);
    /// ```
    pub fn flag_completions(&self, prefix: &str) -> Vec<Completion> {
        let long = |search: &str| {
            self.long
                .iter()
                .filter(|(name, _)| name.starts_with(search))
                .map(|(name, &i)| Completion::for_flag(format!("--{name}"), &self.flags[i]))
                .collect::<Vec<_>>()
        };
        let short = || {
            self.short
                .iter()
                .map(|(c, &i)| Completion::for_flag(format!("-{c}"), &self.flags[i]))
                .collect::<Vec<_>>()
        };

        let mut completions = if let Some(search) = prefix.strip_prefix("--") {
            long(search)
        } else if prefix == "-" {
            short()
        } else if let Some(rest) = prefix.strip_prefix('-') {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => self
                    .lookup_short(c)
                    .map(|flag| vec![Completion::for_flag(prefix.to_string(), flag)])
                    .unwrap_or_default(),
                _ => Vec::new(),
            }
        } else if prefix.is_empty() {
            let mut all = long("");
            all.extend(short());
            all
        } else {
            Vec::new()
        };

        completions.sort_by(|a, b| a.value.cmp(&b.value));
        completions
    }
}
