//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the library record store:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other crates depend on.
//! It establishes the logging conventions and the validated configuration
//! from which the database pool and the service façade are built.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
