//! Reader phone number repository

use crate::error::{LibraryError, Result};
use crate::models::Phone;
use crate::repositories::{ensure_exists, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait PhoneRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>>;

    /// Insert a phone number for an existing reader
    ///
    /// # Errors
    /// - `NotFound` if the reader does not exist
    /// - `Uniqueness` if the number is already registered
    async fn insert(&self, phone: &Phone) -> Result<()>;

    async fn update(&self, phone: &Phone) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    async fn query(&self, page_request: PageRequest) -> Result<Page<Phone>>;

    async fn count(&self) -> Result<i64>;

    /// All phone numbers of a reader
    async fn find_by_reader(&self, reader_id: &str) -> Result<Vec<Phone>>;

    /// Find the owner record of a number
    async fn find_by_number(&self, phone: &str) -> Result<Option<Phone>>;
}

pub struct SqlitePhoneRepository {
    pool: SqlitePool,
}

impl SqlitePhoneRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validated(phone: &Phone) -> Result<()> {
    phone
        .validate()
        .map_err(|e| LibraryError::invalid_input("Phone", e))
}

#[async_trait]
impl PhoneRepository for SqlitePhoneRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Phone>> {
        let phone = query_as::<_, Phone>("SELECT * FROM phones WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(phone)
    }

    async fn insert(&self, phone: &Phone) -> Result<()> {
        validated(phone)?;
        ensure_exists(&self.pool, "readers", "Reader", &phone.reader_id).await?;

        query("INSERT INTO phones (id, reader_id, phone) VALUES (?, ?, ?)")
            .bind(&phone.id)
            .bind(&phone.reader_id)
            .bind(&phone.phone)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                LibraryError::from_write(
                    e,
                    "Phone",
                    &[("phone", phone.phone.as_str())],
                    &[("Reader", phone.reader_id.as_str())],
                )
            })?;

        Ok(())
    }

    async fn update(&self, phone: &Phone) -> Result<()> {
        validated(phone)?;
        ensure_exists(&self.pool, "readers", "Reader", &phone.reader_id).await?;

        let result = query("UPDATE phones SET reader_id = ?, phone = ? WHERE id = ?")
            .bind(&phone.reader_id)
            .bind(&phone.phone)
            .bind(&phone.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                LibraryError::from_write(
                    e,
                    "Phone",
                    &[("phone", phone.phone.as_str())],
                    &[("Reader", phone.reader_id.as_str())],
                )
            })?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Phone", phone.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM phones WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Phone>> {
        let total = self.count().await?;

        let phones = query_as::<_, Phone>("SELECT * FROM phones ORDER BY phone ASC LIMIT ? OFFSET ?")
            .bind(page_request.limit())
            .bind(page_request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(phones, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM phones")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_reader(&self, reader_id: &str) -> Result<Vec<Phone>> {
        let phones =
            query_as::<_, Phone>("SELECT * FROM phones WHERE reader_id = ? ORDER BY phone ASC")
                .bind(reader_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(phones)
    }

    async fn find_by_number(&self, phone: &str) -> Result<Option<Phone>> {
        let phone = query_as::<_, Phone>("SELECT * FROM phones WHERE phone = ?")
            .bind(phone.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(phone)
    }
}
