//! Workspace placeholder crate.
//!
//! Host applications (a web front-end, a CLI, a desktop shell) depend on
//! `library-workspace` and get the whole record store through the
//! `core-service` façade without wiring each workspace crate individually.

pub use core_service::*;
