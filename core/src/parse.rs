//! Token-level flag, positional and rest parsing.
//!
//! A single left-to-right scan over the token vector:
//!
//! - `--` stops scanning; every remaining token becomes a literal.
//! - `--name` / `--name=value` is a long flag. Nullary flags without an
//!   attached value are set to `true`; value-taking flags without one
//!   consume the next token.
//! - `-abc` is a short cluster, processed character by character. A
//!   value-taking flag inside the cluster takes the rest of the cluster as its
//!   value, or the next token when it is the last character.
//! - Anything else is a literal token.
//!
//! After the scan, literal tokens are converted into positional fields by
//! index, the rest capture receives the whole literal sequence, and the
//! unknown capture receives the absorbed unknown tokens.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::flagset::FlagSet;

enum Step {
    /// Continue scanning at this token index.
    Next(usize),
    /// An unknown flag absorbed every remaining token.
    Absorbed,
}

impl FlagSet {
    /// Parses `arguments` (without the program or command name) and updates
    /// bound values.
    ///
    /// Each call resets the leftover literal tokens and the unknown-flag list.
    /// Flag and positional values are *not* reset to their defaults: a value
    /// only changes when the new token vector sets it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered. Tokens scanned before it
    /// may already have updated bound values.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdroute_core::FlagSet;
    ///
    /// let mut fs = FlagSet::new("ls");
    /// fs.add_bool("verbose", Some('v'), false, "")
    ///     .add_bool("long", Some('l'), false, "")
    ///     .add_bool("all", Some('a'), false, "");
    ///
    /// fs.parse(["-vla"]).unwrap();
    /// assert_eq!(fs.get_bool("verbose"), Some(true));
    /// assert_eq!(fs.get_bool("long"), Some(true));
    /// assert_eq!(fs.get_bool("all"), Some(true));
    /// assert!(fs.args().is_empty());
    /// ```
    pub fn parse<I, S>(&mut self, arguments: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let arguments: Vec<String> = arguments
            .into_iter()
            .map(|arg| arg.as_ref().to_string())
            .collect();

        self.parsed = true;
        self.args.clear();
        self.unknown_flags.clear();

        let mut i = 0;
        while i < arguments.len() {
            let arg = arguments[i].as_str();
            let step = if arg == "--" {
                self.args.extend_from_slice(&arguments[i + 1..]);
                break;
            } else if let Some(body) = arg.strip_prefix("--") {
                self.parse_long(body, &arguments, i)?
            } else if arg.len() > 1 && arg.starts_with('-') {
                self.parse_short(&arg[1..], &arguments, i)?
            } else {
                self.args.push(arg.to_string());
                Step::Next(i + 1)
            };

            match step {
                Step::Next(next) => i = next,
                Step::Absorbed => break,
            }
        }

        self.bind_positionals()?;

        if let Some(rest) = &mut self.rest {
            rest.values = self.args.clone();
        }
        if let Some(unknown) = &mut self.unknown {
            unknown.values = self.unknown_flags.clone();
        }

        Ok(())
    }

    fn parse_long(&mut self, body: &str, args: &[String], i: usize) -> Result<Step> {
        let (name, attached) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let token = format!("--{name}");

        let Some(&index) = self.long.get(name) else {
            return self.absorb_unknown(token, args, i);
        };

        let mut next = i + 1;
        let value = match attached {
            Some(value) => value,
            None if self.flags[index].is_nullary() => "true",
            None => {
                let value = args.get(i + 1).ok_or_else(|| ParseError::MissingValue(token.clone()))?;
                next += 1;
                value.as_str()
            }
        };

        self.set_flag(index, &token, value)?;
        Ok(Step::Next(next))
    }

    fn parse_short(&mut self, cluster: &str, args: &[String], i: usize) -> Result<Step> {
        let chars: Vec<char> = cluster.chars().collect();

        for (pos, &c) in chars.iter().enumerate() {
            let token = format!("-{c}");
            let Some(&index) = self.short.get(&c) else {
                return self.absorb_unknown(token, args, i);
            };

            if self.flags[index].is_nullary() {
                self.set_flag(index, &token, "true")?;
                continue;
            }

            if pos + 1 < chars.len() {
                // Two value-taking flags cannot share one cluster.
                let next_takes_value = self
                    .short
                    .get(&chars[pos + 1])
                    .is_some_and(|&j| !self.flags[j].is_nullary());
                if next_takes_value {
                    return Err(ParseError::MissingValue(token));
                }
                let value: String = chars[pos + 1..].iter().collect();
                self.set_flag(index, &token, &value)?;
                return Ok(Step::Next(i + 1));
            }

            // Last character: the next token is the value, whatever it looks like.
            let value = args.get(i + 1).ok_or(ParseError::MissingValue(token.clone()))?;
            self.set_flag(index, &token, value)?;
            return Ok(Step::Next(i + 2));
        }

        Ok(Step::Next(i + 1))
    }

    fn absorb_unknown(&mut self, token: String, args: &[String], i: usize) -> Result<Step> {
        if !self.allow_unknown {
            return Err(ParseError::UnknownFlag(token));
        }
        debug!(
            set = %self.name(),
            flag = %token,
            absorbed = args.len() - i,
            "unknown flag; capturing it and all remaining tokens"
        );
        self.unknown_flags.extend_from_slice(&args[i..]);
        Ok(Step::Absorbed)
    }

    fn set_flag(&mut self, index: usize, token: &str, raw: &str) -> Result<()> {
        self.flags[index]
            .value
            .set(raw)
            .map_err(|source| ParseError::InvalidValue {
                flag: token.to_string(),
                source,
            })
    }

    fn bind_positionals(&mut self) -> Result<()> {
        for (&position, field) in self.positional.iter_mut() {
            if let Some(raw) = self.args.get(position) {
                field
                    .value
                    .set(raw)
                    .map_err(|source| ParseError::PositionalConversion { position, source })?;
            }
        }
        Ok(())
    }
}
