//! Remote shell implementations

pub mod ssh;
pub mod vagrant;

pub use ssh::{expand_home, SshOptions, SshShell};
pub use vagrant::{discover_identity_file, parse_identity_file, VAGRANT_ENVIRONMENT};
