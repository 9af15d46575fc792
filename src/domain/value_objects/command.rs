//! Command value objects
//!
//! Commands are plain shell lines. They are composed here and executed by a
//! [`RemoteShell`](crate::domain::ports::RemoteShell) implementation.

use std::fmt;

use super::toggle::parse_flag;

/// A single shell line to execute on a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    line: String,
    tty: bool,
}

impl RemoteCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            tty: false,
        }
    }

    /// A `python manage.py <subcommand> ...` invocation
    pub fn manage(subcommand: &str, args: &ManageArgs) -> Self {
        Self::new(join(&["python manage.py", subcommand, &args.render()]))
    }

    /// Request a pseudo-terminal (interactive management commands)
    pub fn with_tty(mut self) -> Self {
        self.tty = true;
        self
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn wants_tty(&self) -> bool {
        self.tty
    }

    /// Same command with a different line, keeping the tty request
    pub fn map_line(&self, f: impl FnOnce(&str) -> String) -> Self {
        Self {
            line: f(&self.line),
            tty: self.tty,
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Positional arguments plus `key=value` options for a management command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManageArgs {
    pub positionals: Vec<String>,
    pub options: Vec<(String, String)>,
}

impl ManageArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, value: impl Into<String>) -> Self {
        self.positionals.push(value.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    /// Options first, then positionals.
    ///
    /// A true-ish option value renders as a bare `--key`; anything else,
    /// false-ish values included, renders as `--key=value`.
    pub fn render(&self) -> String {
        let options: Vec<String> = self
            .options
            .iter()
            .map(|(key, value)| match parse_flag(value) {
                Some(true) => format!("--{}", key),
                _ => format!("--{}={}", key, quote(value)),
            })
            .collect();
        let positionals: Vec<String> = self.positionals.iter().map(|p| quote(p)).collect();

        join(&[&options.join(" "), &positionals.join(" ")])
    }
}

/// Join non-empty fragments with single spaces
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a word for POSIX shells, leaving obviously safe words untouched
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}
