//! File Transfer Implementations
//!
//! Provides concrete implementations of the FileTransfer port:
//! - RsyncTransfer: checksum-based mirroring over ssh

mod rsync;

pub use rsync::{RsyncTransfer, RSYNC_DEFAULT_OPTS};
