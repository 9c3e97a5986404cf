//! Author repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Author;
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

/// Author repository interface for data access operations
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Find an author by its ID
    ///
    /// # Returns
    /// - `Ok(Some(author))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>>;

    /// Insert a new author
    ///
    /// # Errors
    /// Returns error if:
    /// - Author validation fails
    /// - Database error occurs
    async fn insert(&self, author: &Author) -> Result<()>;

    /// Update an existing author
    ///
    /// # Errors
    /// Returns `NotFound` if the author does not exist
    async fn update(&self, author: &Author) -> Result<()>;

    /// Delete an author by ID
    ///
    /// Book links are removed with the author; the books themselves stay.
    ///
    /// # Returns
    /// - `Ok(true)` if author was deleted
    /// - `Ok(false)` if author was not found
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Query authors ordered by surname, then first name
    async fn query(&self, page_request: PageRequest) -> Result<Page<Author>>;

    /// Count total authors
    async fn count(&self) -> Result<i64>;

    /// Find an author by exact first name and surname
    async fn find_by_name(&self, first_name: &str, surname: &str) -> Result<Option<Author>>;
}

/// SQLite implementation of AuthorRepository
pub struct SqliteAuthorRepository {
    pool: SqlitePool,
}

impl SqliteAuthorRepository {
    /// Create a new SqliteAuthorRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn validated(author: &Author) -> Result<()> {
    author.validate().map_err(|e| LibraryError::InvalidInput {
        field: "Author".to_string(),
        message: e,
    })
}

#[async_trait]
impl AuthorRepository for SqliteAuthorRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Author>> {
        let author = query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    async fn insert(&self, author: &Author) -> Result<()> {
        validated(author)?;

        query(
            r#"
            INSERT INTO authors (
                id, surname, first_name, last_name, birth_date, gender,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.id)
        .bind(&author.surname)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_date)
        .bind(author.gender)
        .bind(author.created_at)
        .bind(author.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Author", &[], &[]))?;

        Ok(())
    }

    async fn update(&self, author: &Author) -> Result<()> {
        validated(author)?;

        let result = query(
            r#"
            UPDATE authors
            SET surname = ?, first_name = ?, last_name = ?, birth_date = ?, gender = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&author.surname)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_date)
        .bind(author.gender)
        .bind(author.updated_at)
        .bind(&author.id)
        .execute(&self.pool)
        .await
        .map_err(|e| LibraryError::from_write(e, "Author", &[], &[]))?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Author", author.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Author>> {
        let total = self.count().await?;

        let authors = query_as::<_, Author>(
            "SELECT * FROM authors ORDER BY surname ASC, first_name ASC LIMIT ? OFFSET ?",
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(authors, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM authors")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_name(&self, first_name: &str, surname: &str) -> Result<Option<Author>> {
        let author = query_as::<_, Author>(
            "SELECT * FROM authors WHERE first_name = ? AND surname = ? ORDER BY created_at LIMIT 1",
        )
        .bind(first_name)
        .bind(surname)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::Gender;
    use chrono::NaiveDate;

    async fn setup_test_pool() -> SqlitePool {
        create_test_pool().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_author() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let mut author = Author::new("King".into(), "Stephen".into(), "Edwin".into());
        author.birth_date = NaiveDate::from_ymd_opt(1947, 9, 21);
        author.gender = Gender::Male;
        repo.insert(&author).await.unwrap();

        let found = repo.find_by_id(&author.id).await.unwrap().unwrap();
        assert_eq!(found, author);
        assert_eq!(found.birth_date, NaiveDate::from_ymd_opt(1947, 9, 21));
        assert_eq!(found.gender, Gender::Male);
    }

    #[tokio::test]
    async fn test_update_author() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let mut author = Author::from_full_name("Stephen King");
        repo.insert(&author).await.unwrap();

        author.last_name = "Edwin".to_string();
        author.gender = Gender::Male;
        repo.update(&author).await.unwrap();

        let found = repo.find_by_id(&author.id).await.unwrap().unwrap();
        assert_eq!(found.last_name, "Edwin");
        assert_eq!(found.gender, Gender::Male);
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let author = Author::from_full_name("Nobody Here");
        let result = repo.update(&author).await;
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_author() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let author = Author::from_full_name("Stephen King");
        repo.insert(&author).await.unwrap();

        assert!(repo.delete(&author.id).await.unwrap());
        assert!(!repo.delete(&author.id).await.unwrap());
        assert!(repo.find_by_id(&author.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let author = Author::from_full_name("Stephen King");
        repo.insert(&author).await.unwrap();

        let found = repo.find_by_name("Stephen", "King").await.unwrap();
        assert_eq!(found.map(|a| a.id), Some(author.id));
        assert!(repo.find_by_name("King", "Stephen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_and_count() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        for name in ["Stephen King", "Agatha Christie", "Isaac Asimov"] {
            repo.insert(&Author::from_full_name(name)).await.unwrap();
        }

        assert_eq!(repo.count().await.unwrap(), 3);

        let page = repo.query(PageRequest::new(0, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let surnames: Vec<_> = page.items.iter().map(|a| a.surname.as_str()).collect();
        assert_eq!(surnames, vec!["Asimov", "Christie"]);
    }

    #[tokio::test]
    async fn test_author_validation() {
        let pool = setup_test_pool().await;
        let repo = SqliteAuthorRepository::new(pool);

        let mut author = Author::from_full_name("Stephen King");
        author.first_name = String::new();

        let result = repo.insert(&author).await;
        assert!(matches!(result, Err(LibraryError::InvalidInput { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
