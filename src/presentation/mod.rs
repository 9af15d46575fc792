//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Wiring infrastructure into the task runner
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - clap definitions and conversion into tasks
//! - `factory` - Loads configuration and creates the runtime (dependency injection)
//! - `console` - Human-readable event sink
//! - `output` - Summaries, warnings and errors
//! - `theme` - Colors and icons

pub mod cli;
pub mod console;
pub mod factory;
pub mod output;
pub mod theme;

pub use cli::{Cli, ColorWhen, Commands};
pub use console::ConsoleEventSink;
pub use factory::{create_runtime, select_environment, Runtime, RuntimeOptions};
pub use theme::Palette;
