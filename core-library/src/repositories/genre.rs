//! Genre repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Genre;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Genre repository interface
#[async_trait]
pub trait GenreRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Genre>>;

    /// Insert a new genre
    ///
    /// # Errors
    /// `Uniqueness` when another genre already has the name
    async fn insert(&self, genre: &Genre) -> Result<()>;

    /// Rename a genre
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Uniqueness` for a taken name
    async fn update(&self, genre: &Genre) -> Result<()>;

    /// Delete a genre; books that referenced it keep existing with no genre
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn query(&self, page_request: PageRequest) -> Result<Page<Genre>>;

    async fn count(&self) -> Result<i64>;

    /// Find a genre by its exact name
    async fn find_by_name(&self, name: &str) -> Result<Option<Genre>>;
}

/// SQLite implementation of GenreRepository
pub struct SqliteGenreRepository {
    pool: SqlitePool,
}

impl SqliteGenreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreRepository for SqliteGenreRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Genre>> {
        let genre = query_as::<_, Genre>("SELECT * FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(genre)
    }

    async fn insert(&self, genre: &Genre) -> Result<()> {
        genre.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Genre".to_string(),
            message: e,
        })?;

        query("INSERT INTO genres (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&genre.id)
            .bind(&genre.name)
            .bind(genre.created_at)
            .bind(genre.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| LibraryError::from_write(e, "Genre", &[("name", genre.name.as_str())], &[]))?;

        Ok(())
    }

    async fn update(&self, genre: &Genre) -> Result<()> {
        genre.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Genre".to_string(),
            message: e,
        })?;

        let result = query("UPDATE genres SET name = ?, updated_at = ? WHERE id = ?")
            .bind(&genre.name)
            .bind(genre.updated_at)
            .bind(&genre.id)
            .execute(&self.pool)
            .await
            .map_err(|e| LibraryError::from_write(e, "Genre", &[("name", genre.name.as_str())], &[]))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Genre", genre.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM genres WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Genre>> {
        let total = self.count().await?;

        let genres = query_as::<_, Genre>("SELECT * FROM genres ORDER BY name ASC LIMIT ? OFFSET ?")
            .bind(page_request.limit())
            .bind(page_request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(genres, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM genres")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Genre>> {
        let genre = query_as::<_, Genre>("SELECT * FROM genres WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(genre)
    }
}
