//! Reader address repository
//!
//! A reader has at most one address; a second insert for the same reader is
//! reported as a `Uniqueness` error on `reader_id`.

use crate::error::{LibraryError, Result};
use crate::models::Address;
use crate::repositories::{ensure_exists, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Address>>;

    async fn insert(&self, address: &Address) -> Result<()>;

    async fn update(&self, address: &Address) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;

    async fn query(&self, page_request: PageRequest) -> Result<Page<Address>>;

    async fn count(&self) -> Result<i64>;

    /// The address of a reader, if one is on file
    async fn find_by_reader(&self, reader_id: &str) -> Result<Option<Address>>;
}

pub struct SqliteAddressRepository {
    pool: SqlitePool,
}

impl SqliteAddressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validated(address: &Address) -> Result<()> {
    address
        .validate()
        .map_err(|e| LibraryError::invalid_input("Address", e))
}

#[async_trait]
impl AddressRepository for SqliteAddressRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Address>> {
        let address = query_as::<_, Address>("SELECT * FROM addresses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(address)
    }

    async fn insert(&self, address: &Address) -> Result<()> {
        validated(address)?;
        ensure_exists(&self.pool, "readers", "Reader", &address.reader_id).await?;

        query(
            r#"
            INSERT INTO addresses (
                id, reader_id, country, region, area, city, street, building,
                apartment, entrance, room
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&address.id)
        .bind(&address.reader_id)
        .bind(&address.country)
        .bind(&address.region)
        .bind(&address.area)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.building)
        .bind(&address.apartment)
        .bind(&address.entrance)
        .bind(&address.room)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            LibraryError::from_write(
                e,
                "Address",
                &[("reader_id", address.reader_id.as_str())],
                &[("Reader", address.reader_id.as_str())],
            )
        })?;

        Ok(())
    }

    async fn update(&self, address: &Address) -> Result<()> {
        validated(address)?;
        ensure_exists(&self.pool, "readers", "Reader", &address.reader_id).await?;

        let result = query(
            r#"
            UPDATE addresses
            SET reader_id = ?, country = ?, region = ?, area = ?, city = ?, street = ?,
                building = ?, apartment = ?, entrance = ?, room = ?
            WHERE id = ?
            "#,
        )
        .bind(&address.reader_id)
        .bind(&address.country)
        .bind(&address.region)
        .bind(&address.area)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.building)
        .bind(&address.apartment)
        .bind(&address.entrance)
        .bind(&address.room)
        .bind(&address.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            LibraryError::from_write(
                e,
                "Address",
                &[("reader_id", address.reader_id.as_str())],
                &[("Reader", address.reader_id.as_str())],
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Address", address.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM addresses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Address>> {
        let total = self.count().await?;

        let addresses = query_as::<_, Address>(
            "SELECT * FROM addresses ORDER BY country, city, street, building LIMIT ? OFFSET ?",
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(addresses, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM addresses")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_reader(&self, reader_id: &str) -> Result<Option<Address>> {
        let address = query_as::<_, Address>("SELECT * FROM addresses WHERE reader_id = ?")
            .bind(reader_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(address)
    }
}
