use crossterm::style::{Color, Stylize};
use is_terminal::IsTerminal;

use super::cli::ColorWhen;

/// Design tokens for hoist output.
///
/// Only 5 semantic colors; every icon comes from this module.
pub mod colors {
    use super::Color;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const INFO: Color = Color::Cyan;
    pub const DIM: Color = Color::DarkGrey;
}

pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const ERROR: &str = "✗";
    pub const WARNING: &str = "⚠";
    pub const PROGRESS: &str = "●";
    pub const PENDING: &str = "○";
    pub const SKIPPED: &str = "–";
    pub const DEPLOY: &str = "📦";
}

pub mod icons_ascii {
    pub const SUCCESS: &str = "[OK]";
    pub const ERROR: &str = "[FAIL]";
    pub const WARNING: &str = "[WARN]";
    pub const PROGRESS: &str = "[..]";
    pub const PENDING: &str = "[ ]";
    pub const SKIPPED: &str = "[-]";
    pub const DEPLOY: &str = "[DEPLOY]";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Success,
    Error,
    Warning,
    Progress,
    Pending,
    Skipped,
    Deploy,
}

/// Resolved rendering capabilities for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub color: bool,
    pub unicode: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self {
            color: false,
            unicode: false,
        }
    }

    /// Decide from `--color`, `NO_COLOR`, `TERM` and whether stdout is a tty
    pub fn detect(when: Option<ColorWhen>) -> Self {
        Self::from_env(
            when,
            std::io::stdout().is_terminal(),
            |key| std::env::var(key).ok(),
        )
    }

    fn from_env(
        when: Option<ColorWhen>,
        is_tty: bool,
        get_env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let term = get_env("TERM").unwrap_or_default();
        let dumb = term.eq_ignore_ascii_case("dumb");
        let color = match when {
            Some(ColorWhen::Always) => true,
            Some(ColorWhen::Never) => false,
            Some(ColorWhen::Auto) | None => is_tty && !dumb && get_env("NO_COLOR").is_none(),
        };
        Self {
            color,
            unicode: !dumb,
        }
    }

    pub fn icon(&self, icon: Icon) -> &'static str {
        match (icon, self.unicode) {
            (Icon::Success, true) => icons::SUCCESS,
            (Icon::Success, false) => icons_ascii::SUCCESS,
            (Icon::Error, true) => icons::ERROR,
            (Icon::Error, false) => icons_ascii::ERROR,
            (Icon::Warning, true) => icons::WARNING,
            (Icon::Warning, false) => icons_ascii::WARNING,
            (Icon::Progress, true) => icons::PROGRESS,
            (Icon::Progress, false) => icons_ascii::PROGRESS,
            (Icon::Pending, true) => icons::PENDING,
            (Icon::Pending, false) => icons_ascii::PENDING,
            (Icon::Skipped, true) => icons::SKIPPED,
            (Icon::Skipped, false) => icons_ascii::SKIPPED,
            (Icon::Deploy, true) => icons::DEPLOY,
            (Icon::Deploy, false) => icons_ascii::DEPLOY,
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            format!("{}", text.with(color))
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, colors::SUCCESS)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, colors::ERROR)
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, colors::WARNING)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, colors::INFO)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, colors::DIM)
    }

    pub fn bold(&self, text: &str) -> String {
        if self.color {
            format!("{}", text.bold())
        } else {
            text.to_string()
        }
    }
}
