//! Help text rendering.

use std::io::{self, Write};

use cmdroute_core::{Flag, FlagSet};

use crate::dispatcher::{CommandEntry, Dispatcher};

/// Width of the left column in option and argument listings.
const COLUMN: usize = 30;

impl Dispatcher {
    /// Writes the general help: usage line, sorted command list and a
    /// pointer to per-command help.
    pub fn write_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Usage: {} <command> [arguments]", self.name())?;
        if let Some(description) = &self.config().description {
            writeln!(out, "\n{description}")?;
        }
        writeln!(out)?;
        writeln!(out, "Available commands:")?;

        let entries = self.entries();
        let width = entries.iter().map(|e| e.path.len()).max().unwrap_or(0) + 2;
        for entry in entries {
            if entry.usage.is_empty() {
                writeln!(out, "  {}", entry.path)?;
            } else {
                writeln!(out, "  {:<width$}  {}", entry.path, entry.usage)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Use '<command> --help' for more information about a command.")
    }

    /// Writes help for the command at `path`. Returns `false` when no such
    /// command is registered.
    pub fn write_command_help<W: Write>(&self, path: &str, out: &mut W) -> io::Result<bool> {
        match self.get_entry(path) {
            Some(entry) => {
                write_entry_help(self.name(), entry, out)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn write_entry_help<W: Write>(program: &str, entry: &CommandEntry, out: &mut W) -> io::Result<()> {
    let flags = entry.flags();
    let takes_arguments = flags.has_positional_args() || flags.has_rest_args();

    write!(out, "Usage: {program} {} [options]", entry.path)?;
    if takes_arguments {
        write!(out, " [arguments]")?;
    }
    writeln!(out)?;

    if !entry.usage.is_empty() {
        writeln!(out, "\n{}", entry.usage)?;
    }

    let mut lines = Vec::new();
    flags.visit_all(|flag| lines.push(option_line(flag)));
    if !lines.is_empty() {
        writeln!(out, "\nOptions:")?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
    }

    if takes_arguments {
        writeln!(out, "\nArguments:")?;
        for line in argument_lines(flags) {
            writeln!(out, "{line}")?;
        }
    }

    Ok(())
}

fn option_line(flag: &Flag) -> String {
    let mut left = match (flag.short, flag.name.is_empty()) {
        (Some(c), false) => format!("  -{c}, --{}", flag.name),
        (Some(c), true) => format!("  -{c}"),
        (None, _) => format!("      --{}", flag.name),
    };
    if !flag.is_nullary() {
        left.push_str(" <value>");
    }
    describe(left, &flag.usage, &flag.default_text())
}

fn argument_lines(flags: &FlagSet) -> Vec<String> {
    let mut lines: Vec<String> = flags
        .positional_fields()
        .map(|field| describe(format!("  <{}>", field.name), &field.usage, &field.default.to_string()))
        .collect();
    if let Some(rest) = flags.rest_capture() {
        lines.push(describe(format!("  [{}...]", rest.name), &rest.usage, ""));
    }
    lines
}

/// Pads `left` into the listing column and appends usage and default.
fn describe(left: String, usage: &str, default: &str) -> String {
    if usage.is_empty() {
        return left;
    }
    let mut line = format!("{left:<width$} {usage}", width = COLUMN);
    if !matches!(default, "" | "false" | "0") {
        line.push_str(&format!(" (default: {default})"));
    }
    line
}
