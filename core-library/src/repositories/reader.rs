//! Reader repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Reader;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Reader repository interface for data access operations
#[async_trait]
pub trait ReaderRepository: Send + Sync {
    /// Find a reader by its ID
    ///
    /// # Returns
    /// - `Ok(Some(reader))` if found
    /// - `Ok(None)` if not found
    async fn find_by_id(&self, id: &str) -> Result<Option<Reader>>;

    /// Insert a new reader
    ///
    /// # Errors
    /// Returns error if:
    /// - Reader validation fails (e.g. malformed email)
    /// - Another reader already uses the email (`Uniqueness`)
    async fn insert(&self, reader: &Reader) -> Result<()>;

    /// Update an existing reader
    async fn update(&self, reader: &Reader) -> Result<()>;

    /// Delete a reader, cascading to phones, address and lendings
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Query readers ordered by surname, then first name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Reader>>;

    /// Count total readers
    async fn count(&self) -> Result<i64>;

    /// Find a reader by contact email
    async fn find_by_email(&self, email: &str) -> Result<Option<Reader>>;
}

/// SQLite implementation of ReaderRepository
pub struct SqliteReaderRepository {
    pool: SqlitePool,
}

impl SqliteReaderRepository {
    /// Create a new SqliteReaderRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validated(reader: &Reader) -> Result<()> {
    reader.validate().map_err(|e| LibraryError::InvalidInput {
        field: "Reader".to_string(),
        message: e,
    })
}

#[async_trait]
impl ReaderRepository for SqliteReaderRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Reader>> {
        let reader = query_as::<_, Reader>("SELECT * FROM readers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reader)
    }

    async fn insert(&self, reader: &Reader) -> Result<()> {
        validated(reader)?;

        query(
            r#"
            INSERT INTO readers (
                id, surname, first_name, last_name, birth_date, email, gender,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&reader.id)
        .bind(&reader.surname)
        .bind(&reader.first_name)
        .bind(&reader.last_name)
        .bind(reader.birth_date)
        .bind(&reader.email)
        .bind(reader.gender)
        .bind(reader.created_at)
        .bind(reader.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Reader", &[("email", reader.email.as_str())], &[]))?;

        Ok(())
    }

    async fn update(&self, reader: &Reader) -> Result<()> {
        validated(reader)?;

        let result = query(
            r#"
            UPDATE readers
            SET surname = ?, first_name = ?, last_name = ?, birth_date = ?, email = ?,
                gender = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&reader.surname)
        .bind(&reader.first_name)
        .bind(&reader.last_name)
        .bind(reader.birth_date)
        .bind(&reader.email)
        .bind(reader.gender)
        .bind(reader.updated_at)
        .bind(&reader.id)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Reader", &[("email", reader.email.as_str())], &[]))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Reader", reader.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM readers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Reader>> {
        let total = self.count().await?;

        let readers = query_as::<_, Reader>(
            "SELECT * FROM readers ORDER BY surname ASC, first_name ASC LIMIT ? OFFSET ?",
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(readers, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM readers")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Reader>> {
        let reader = query_as::<_, Reader>("SELECT * FROM readers WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(reader)
    }
}
