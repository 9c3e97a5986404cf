//! # Library Record Store
//!
//! Owns the canonical library database and provides repository patterns for
//! data access, plus the lending ledger that keeps copy availability in step
//! with open loans.
//!
//! ## Overview
//!
//! This crate manages:
//! - SQLite database schema and migrations
//! - Domain models with validation (authors, books, readers, lendings, ...)
//! - Repository patterns for the catalog and the reader directory
//! - The [`LendingLedger`](ledger::LendingLedger) state machine

pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use ledger::LendingLedger;
