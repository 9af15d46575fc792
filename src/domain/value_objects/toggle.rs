//! Boolean-like tokens and the maintenance state
//!
//! Task arguments arrive as strings (`on`, `True`, `0`, ...). They are parsed
//! once, before any task runs.

use std::fmt;
use std::str::FromStr;

use crate::error::HoistError;

/// Parse a boolean-like token.
///
/// Case-insensitive. Returns `None` for anything that is not clearly true or false.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Desired state of the remote maintenance page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceState {
    /// Placeholder page is mirrored into the maintenance directory
    On,
    /// Maintenance directory is emptied
    Off,
}

impl From<bool> for MaintenanceState {
    fn from(on: bool) -> Self {
        if on {
            MaintenanceState::On
        } else {
            MaintenanceState::Off
        }
    }
}

impl FromStr for MaintenanceState {
    type Err = HoistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_flag(s)
            .map(MaintenanceState::from)
            .ok_or_else(|| HoistError::InvalidToggle {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for MaintenanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceState::On => write!(f, "on"),
            MaintenanceState::Off => write!(f, "off"),
        }
    }
}
