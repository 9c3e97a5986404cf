//! Lending read side
//!
//! Lendings are opened and returned only through
//! [`LendingLedger`](crate::ledger::LendingLedger), and are removed only by
//! book or reader cascades. This repository reads them and corrects the
//! lending date, which never affects availability.

use crate::error::{LibraryError, Result};
use crate::models::Lending;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{query, query_as, SqlitePool};
use tracing::info;

#[async_trait]
pub trait LendingRepository: Send + Sync {
    /// Find a lending by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Lending>>;

    /// All lendings, newest first
    async fn query(&self, page_request: PageRequest) -> Result<Page<Lending>>;

    /// Lendings that are not returned yet, oldest first
    async fn query_active(&self, page_request: PageRequest) -> Result<Page<Lending>>;

    async fn count(&self) -> Result<i64>;

    /// Full lending history of a reader, newest first
    async fn find_by_reader(&self, reader_id: &str) -> Result<Vec<Lending>>;

    /// Full lending history of a book, newest first
    async fn find_by_book(&self, book_id: &str) -> Result<Vec<Lending>>;

    /// Number of copies of a book currently out on loan
    async fn count_active_for_book(&self, book_id: &str) -> Result<i64>;

    /// Correct the recorded lending date
    ///
    /// # Errors
    /// `NotFound` if the lending does not exist
    async fn update_lending_date(&self, id: &str, lending_date: NaiveDate) -> Result<()>;
}

pub struct SqliteLendingRepository {
    pool: SqlitePool,
}

impl SqliteLendingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LendingRepository for SqliteLendingRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Lending>> {
        let lending = query_as::<_, Lending>("SELECT * FROM lendings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lending)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Lending>> {
        let total = self.count().await?;

        let lendings = query_as::<_, Lending>(
            "SELECT * FROM lendings ORDER BY lending_date DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(lendings, total as u64, page_request))
    }

    async fn query_active(&self, page_request: PageRequest) -> Result<Page<Lending>> {
        let total: i64 = query_as("SELECT COUNT(*) FROM lendings WHERE returned = 0")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        let lendings = query_as::<_, Lending>(
            r#"
            SELECT * FROM lendings
            WHERE returned = 0
            ORDER BY lending_date ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(lendings, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM lendings")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_reader(&self, reader_id: &str) -> Result<Vec<Lending>> {
        let lendings = query_as::<_, Lending>(
            "SELECT * FROM lendings WHERE reader_id = ? ORDER BY lending_date DESC, id ASC",
        )
        .bind(reader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lendings)
    }

    async fn find_by_book(&self, book_id: &str) -> Result<Vec<Lending>> {
        let lendings = query_as::<_, Lending>(
            "SELECT * FROM lendings WHERE book_id = ? ORDER BY lending_date DESC, id ASC",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lendings)
    }

    async fn count_active_for_book(&self, book_id: &str) -> Result<i64> {
        let count: i64 =
            query_as("SELECT COUNT(*) FROM lendings WHERE book_id = ? AND returned = 0")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await
                .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn update_lending_date(&self, id: &str, lending_date: NaiveDate) -> Result<()> {
        let result = query("UPDATE lendings SET lending_date = ? WHERE id = ?")
            .bind(lending_date)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Lending", id));
        }

        info!(lending_id = %id, %lending_date, "Lending date corrected");
        Ok(())
    }
}
