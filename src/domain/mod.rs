//! Domain Layer
//!
//! Value types and port traits. Nothing here spawns processes or touches the
//! network; the application layer drives the ports and infrastructure implements
//! them.
//!
//! ## Structure
//!
//! - `value_objects/` - Hosts, commands, revisions, phases and steps
//! - `ports/` - Interface definitions for infrastructure

pub mod ports;
pub mod value_objects;
