//! Publishing house repository

use crate::error::{LibraryError, Result};
use crate::models::Publishing;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait PublishingRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Publishing>>;

    /// Insert a new publishing house (names are unique)
    async fn insert(&self, publishing: &Publishing) -> Result<()>;

    async fn update(&self, publishing: &Publishing) -> Result<()>;

    /// Delete a publishing house; its books lose the reference
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn query(&self, page_request: PageRequest) -> Result<Page<Publishing>>;

    async fn count(&self) -> Result<i64>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Publishing>>;
}

pub struct SqlitePublishingRepository {
    pool: SqlitePool,
}

impl SqlitePublishingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validated(publishing: &Publishing) -> Result<()> {
    publishing
        .validate()
        .map_err(|e| LibraryError::invalid_input("Publishing", e))
}

#[async_trait]
impl PublishingRepository for SqlitePublishingRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Publishing>> {
        let publishing = query_as::<_, Publishing>("SELECT * FROM publishings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(publishing)
    }

    async fn insert(&self, publishing: &Publishing) -> Result<()> {
        validated(publishing)?;

        query(
            r#"
            INSERT INTO publishings (id, name, country, city, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&publishing.id)
        .bind(&publishing.name)
        .bind(&publishing.country)
        .bind(&publishing.city)
        .bind(publishing.created_at)
        .bind(publishing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Publishing", &[("name", publishing.name.as_str())], &[]))?;

        Ok(())
    }

    async fn update(&self, publishing: &Publishing) -> Result<()> {
        validated(publishing)?;

        let result = query(
            r#"
            UPDATE publishings
            SET name = ?, country = ?, city = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&publishing.name)
        .bind(&publishing.country)
        .bind(&publishing.city)
        .bind(publishing.updated_at)
        .bind(&publishing.id)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Publishing", &[("name", publishing.name.as_str())], &[]))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Publishing", publishing.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM publishings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Publishing>> {
        let total = self.count().await?;

        let publishings =
            query_as::<_, Publishing>("SELECT * FROM publishings ORDER BY name ASC LIMIT ? OFFSET ?")
                .bind(page_request.limit())
                .bind(page_request.offset())
                .fetch_all(&self.pool)
                .await?;

        Ok(Page::new(publishings, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM publishings")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Publishing>> {
        let publishing = query_as::<_, Publishing>("SELECT * FROM publishings WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(publishing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn viking() -> Publishing {
        Publishing::new("Viking".into(), "USA".into(), "New York".into())
    }

    #[tokio::test]
    async fn test_insert_update_find() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlitePublishingRepository::new(pool);

        let mut publishing = viking();
        repo.insert(&publishing).await.unwrap();

        publishing.city = "Boston".to_string();
        repo.update(&publishing).await.unwrap();

        let found = repo.find_by_name("Viking").await.unwrap().unwrap();
        assert_eq!(found.city, "Boston");
        assert_eq!(found.country, "USA");
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlitePublishingRepository::new(pool);

        repo.insert(&viking()).await.unwrap();
        let result = repo.insert(&viking()).await;
        assert!(matches!(
            result,
            Err(LibraryError::Uniqueness { ref field, .. }) if field == "name"
        ));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlitePublishingRepository::new(pool);

        let publishing = Publishing::new(" ".into(), String::new(), String::new());
        assert!(matches!(
            repo.insert(&publishing).await,
            Err(LibraryError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_and_count() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqlitePublishingRepository::new(pool);

        let publishing = viking();
        repo.insert(&publishing).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.delete(&publishing.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.query(PageRequest::default()).await.unwrap().is_empty());
    }
}
