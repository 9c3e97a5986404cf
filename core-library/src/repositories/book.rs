//! Book repository trait and implementation
//!
//! Besides plain CRUD this repository owns the `book_authors` link table.
//! It never writes `available_copies` after insertion: the count belongs to
//! the [`LendingLedger`](crate::ledger::LendingLedger).

use crate::error::{LibraryError, Result};
use crate::models::{Author, Book};
use crate::repositories::{ensure_exists, Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Book repository interface for data access operations
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find a book by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>>;

    /// Insert a new book with its initial number of copies
    ///
    /// # Errors
    /// Returns error if:
    /// - Book validation fails
    /// - The ISBN is already catalogued (`Uniqueness`)
    /// - The referenced genre or publishing does not exist (`NotFound`)
    async fn insert(&self, book: &Book) -> Result<()>;

    /// Update the descriptive fields of a book
    ///
    /// `available_copies` on the passed value is ignored.
    async fn update(&self, book: &Book) -> Result<()>;

    /// Delete a book by ID, cascading to its lendings and author links
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Query books ordered by title
    async fn query(&self, page_request: PageRequest) -> Result<Page<Book>>;

    /// Count total books
    async fn count(&self) -> Result<i64>;

    /// Find a book by ISBN
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>>;

    /// Query books with at least one copy on the shelf
    async fn query_available(&self, page_request: PageRequest) -> Result<Page<Book>>;

    /// Link an author to a book; linking twice is a no-op
    async fn add_author(&self, book_id: &str, author_id: &str) -> Result<()>;

    /// Unlink an author from a book
    ///
    /// # Returns
    /// `Ok(true)` if a link was removed
    async fn remove_author(&self, book_id: &str, author_id: &str) -> Result<bool>;

    /// All authors of a book, ordered by surname
    async fn find_authors(&self, book_id: &str) -> Result<Vec<Author>>;

    /// Books written by an author
    async fn query_by_author(&self, author_id: &str, page_request: PageRequest)
        -> Result<Page<Book>>;

    /// Books filed under a genre
    async fn query_by_genre(&self, genre_id: &str, page_request: PageRequest)
        -> Result<Page<Book>>;
}

/// SQLite implementation of BookRepository
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    /// Create a new SqliteBookRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_references(&self, book: &Book) -> Result<()> {
        if let Some(genre_id) = &book.genre_id {
            ensure_exists(&self.pool, "genres", "Genre", genre_id).await?;
        }
        if let Some(publishing_id) = &book.publishing_id {
            ensure_exists(&self.pool, "publishings", "Publishing", publishing_id).await?;
        }
        Ok(())
    }
}

fn invalid(message: String) -> LibraryError {
    LibraryError::InvalidInput {
        field: "Book".to_string(),
        message,
    }
}

/// Rows a book points at, in the order a foreign key failure reports them
fn references(book: &Book) -> Vec<(&'static str, &str)> {
    let genre = book.genre_id.as_deref().map(|id| ("Genre", id));
    let publishing = book.publishing_id.as_deref().map(|id| ("Publishing", id));
    genre.into_iter().chain(publishing).collect()
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>> {
        let book = query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn insert(&self, book: &Book) -> Result<()> {
        book.validate().map_err(invalid)?;
        self.ensure_references(book).await?;

        query(
            r#"
            INSERT INTO books (
                id, title, isbn, year_published, available_copies, variety,
                genre_id, publishing_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.year_published)
        .bind(book.available_copies)
        .bind(book.variety)
        .bind(&book.genre_id)
        .bind(&book.publishing_id)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            LibraryError::from_write(
                e,
                "Book",
                &[("isbn", book.isbn.as_str())],
                &references(book),
            )
        })?;

        debug!(book_id = %book.id, isbn = %book.isbn, "Book catalogued");
        Ok(())
    }

    async fn update(&self, book: &Book) -> Result<()> {
        // available_copies is not written here, so a stale count is not an error
        book.validate_details().map_err(invalid)?;
        self.ensure_references(book).await?;

        let result = query(
            r#"
            UPDATE books
            SET title = ?, isbn = ?, year_published = ?, variety = ?,
                genre_id = ?, publishing_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(book.year_published)
        .bind(book.variety)
        .bind(&book.genre_id)
        .bind(&book.publishing_id)
        .bind(book.updated_at)
        .bind(&book.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            LibraryError::from_write(
                e,
                "Book",
                &[("isbn", book.isbn.as_str())],
                &references(book),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found("Book", book.id.as_str()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Book>> {
        let total = self.count().await?;

        let books = query_as::<_, Book>("SELECT * FROM books ORDER BY title ASC LIMIT ? OFFSET ?")
            .bind(page_request.limit())
            .bind(page_request.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(books, total as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM books")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let book = query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    async fn query_available(&self, page_request: PageRequest) -> Result<Page<Book>> {
        let total: i64 = query_as("SELECT COUNT(*) FROM books WHERE available_copies > 0")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        let books = query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE available_copies > 0
            ORDER BY title ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, total as u64, page_request))
    }

    async fn add_author(&self, book_id: &str, author_id: &str) -> Result<()> {
        ensure_exists(&self.pool, "books", "Book", book_id).await?;
        ensure_exists(&self.pool, "authors", "Author", author_id).await?;

        query("INSERT OR IGNORE INTO book_authors (book_id, author_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                LibraryError::from_write(
                    e,
                    "BookAuthor",
                    &[],
                    &[("Book", book_id), ("Author", author_id)],
                )
            })?;

        Ok(())
    }

    async fn remove_author(&self, book_id: &str, author_id: &str) -> Result<bool> {
        let result = query("DELETE FROM book_authors WHERE book_id = ? AND author_id = ?")
            .bind(book_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_authors(&self, book_id: &str) -> Result<Vec<Author>> {
        let authors = query_as::<_, Author>(
            r#"
            SELECT a.* FROM authors a
            INNER JOIN book_authors ba ON ba.author_id = a.id
            WHERE ba.book_id = ?
            ORDER BY a.surname ASC, a.first_name ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    async fn query_by_author(
        &self,
        author_id: &str,
        page_request: PageRequest,
    ) -> Result<Page<Book>> {
        let total: i64 = query_as("SELECT COUNT(*) FROM book_authors WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        let books = query_as::<_, Book>(
            r#"
            SELECT b.* FROM books b
            INNER JOIN book_authors ba ON ba.book_id = b.id
            WHERE ba.author_id = ?
            ORDER BY b.year_published ASC, b.title ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(author_id)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, total as u64, page_request))
    }

    async fn query_by_genre(
        &self,
        genre_id: &str,
        page_request: PageRequest,
    ) -> Result<Page<Book>> {
        let total: i64 = query_as("SELECT COUNT(*) FROM books WHERE genre_id = ?")
            .bind(genre_id)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        let books = query_as::<_, Book>(
            "SELECT * FROM books WHERE genre_id = ? ORDER BY title ASC LIMIT ? OFFSET ?",
        )
        .bind(genre_id)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, total as u64, page_request))
    }
}
