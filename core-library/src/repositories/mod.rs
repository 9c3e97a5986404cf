//! # Repository Pattern Implementation
//!
//! This module provides repository traits and implementations for data access.
//! Each entity has a corresponding repository with CRUD operations, querying,
//! and pagination support.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is supported via the `Page<T>` wrapper
//! - Unique-constraint failures surface as [`LibraryError::Uniqueness`]
//!
//! ## Available Repositories
//!
//! Catalog:
//! - `AuthorRepository` - Book authors
//! - `GenreRepository` - Genres (unique names)
//! - `PublishingRepository` - Publishing houses (unique names)
//! - `BookRepository` - Books and their author links
//!
//! Reader directory:
//! - `ReaderRepository` - Readers (unique emails)
//! - `PhoneRepository` - Reader phone numbers (unique numbers)
//! - `AddressRepository` - Reader postal address (one per reader)
//!
//! Lending:
//! - `LendingRepository` - Read side and non-state edits of lending records;
//!   state transitions go through [`LendingLedger`](crate::ledger::LendingLedger)

pub mod address;
pub mod author;
pub mod book;
pub mod genre;
pub mod lending;
pub mod pagination;
pub mod phone;
pub mod publishing;
pub mod reader;

pub use address::{AddressRepository, SqliteAddressRepository};
pub use author::{AuthorRepository, SqliteAuthorRepository};
pub use book::{BookRepository, SqliteBookRepository};
pub use genre::{GenreRepository, SqliteGenreRepository};
pub use lending::{LendingRepository, SqliteLendingRepository};
pub use pagination::{Page, PageRequest};
pub use phone::{PhoneRepository, SqlitePhoneRepository};
pub use publishing::{PublishingRepository, SqlitePublishingRepository};
pub use reader::{ReaderRepository, SqliteReaderRepository};

use crate::error::{LibraryError, Result};
use sqlx::{Sqlite, SqliteExecutor};

/// Fail with `NotFound` unless `table` has a row with `id`
///
/// `table` is always a literal from this crate, never caller input.
pub(crate) async fn ensure_exists<'e, E>(
    executor: E,
    table: &'static str,
    entity_type: &str,
    id: &str,
) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    let (exists,): (bool,) = sqlx::query_as::<Sqlite, (bool,)>(&sql)
        .bind(id)
        .fetch_one(executor)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(LibraryError::not_found(entity_type, id))
    }
}
