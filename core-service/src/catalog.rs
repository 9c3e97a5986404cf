//! Catalog management: authors, genres, publishing houses and books.

use std::sync::Arc;

use bridge_traits::time::Clock;
use core_library::models::{Author, Book, Genre, Publishing, Variety};
use core_library::repositories::{
    AuthorRepository, BookRepository, GenreRepository, Page, PageRequest, PublishingRepository,
    SqliteAuthorRepository, SqliteBookRepository, SqliteGenreRepository,
    SqlitePublishingRepository,
};
use core_library::LibraryError;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// How a book form refers to a genre or publishing house
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Pick an existing record by id
    Existing(String),
    /// Use the record with this name, creating it if needed
    New(String),
}

/// A submitted "add book" form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub isbn: String,
    pub year_published: i32,
    pub available_copies: i64,
    pub variety: Variety,
    pub genre: Option<Selection>,
    pub publishing: Option<Selection>,
    /// Author full name, "First Surname"
    pub author: Option<String>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, isbn: impl Into<String>, year_published: i32) -> Self {
        Self {
            title: title.into(),
            isbn: isbn.into(),
            year_published,
            available_copies: 1,
            variety: Variety::Paperback,
            genre: None,
            publishing: None,
            author: None,
        }
    }

    pub fn copies(mut self, copies: i64) -> Self {
        self.available_copies = copies;
        self
    }

    pub fn variety(mut self, variety: Variety) -> Self {
        self.variety = variety;
        self
    }

    pub fn genre(mut self, genre: Selection) -> Self {
        self.genre = Some(genre);
        self
    }

    pub fn publishing(mut self, publishing: Selection) -> Self {
        self.publishing = Some(publishing);
        self
    }

    pub fn author(mut self, full_name: impl Into<String>) -> Self {
        self.author = Some(full_name.into());
        self
    }
}

/// Book together with its resolved references, as shown in the book list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub book: Book,
    pub authors: Vec<Author>,
    pub genre: Option<Genre>,
    pub publishing: Option<Publishing>,
}

/// Catalog operations over the author, genre, publishing and book repositories
pub struct CatalogService {
    authors: Arc<dyn AuthorRepository>,
    genres: Arc<dyn GenreRepository>,
    publishings: Arc<dyn PublishingRepository>,
    books: Arc<dyn BookRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(
        authors: Arc<dyn AuthorRepository>,
        genres: Arc<dyn GenreRepository>,
        publishings: Arc<dyn PublishingRepository>,
        books: Arc<dyn BookRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authors,
            genres,
            publishings,
            books,
            clock,
        }
    }

    /// Build the service on top of the SQLite repositories
    pub fn from_pool(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(SqliteAuthorRepository::new(pool.clone())),
            Arc::new(SqliteGenreRepository::new(pool.clone())),
            Arc::new(SqlitePublishingRepository::new(pool.clone())),
            Arc::new(SqliteBookRepository::new(pool)),
            clock,
        )
    }

    // ---------------------------------------------------------------------
    // Authors
    // ---------------------------------------------------------------------

    pub async fn create_author(&self, author: Author) -> Result<Author> {
        self.authors.insert(&author).await?;
        info!(author_id = %author.id, name = %author.display_name(), "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, mut author: Author) -> Result<Author> {
        author.updated_at = self.clock.unix_timestamp();
        self.authors.update(&author).await?;
        Ok(author)
    }

    /// Delete an author; their books stay in the catalog
    pub async fn delete_author(&self, id: &str) -> Result<()> {
        if !self.authors.delete(id).await? {
            return Err(LibraryError::not_found("Author", id).into());
        }
        info!(author_id = %id, "Author deleted");
        Ok(())
    }

    pub async fn get_author(&self, id: &str) -> Result<Author> {
        self.authors
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Author", id).into())
    }

    pub async fn list_authors(&self, page: PageRequest) -> Result<Page<Author>> {
        Ok(self.authors.query(page).await?)
    }

    /// Find an author by "First Surname", creating one when absent
    ///
    /// The first word is the first name and the rest is the surname.
    pub async fn get_or_create_author(&self, full_name: &str) -> Result<Author> {
        let (first_name, surname) = Author::split_full_name(full_name);
        if first_name.is_empty() {
            return Err(CoreError::validation("author", "Author name cannot be empty"));
        }

        if let Some(author) = self.authors.find_by_name(&first_name, &surname).await? {
            return Ok(author);
        }

        self.create_author(Author::new(surname, first_name, String::new()))
            .await
    }

    // ---------------------------------------------------------------------
    // Genres
    // ---------------------------------------------------------------------

    pub async fn create_genre(&self, name: &str) -> Result<Genre> {
        let genre = Genre::new(name.trim().to_string());
        self.genres.insert(&genre).await?;
        info!(genre_id = %genre.id, name = %genre.name, "Genre created");
        Ok(genre)
    }

    pub async fn update_genre(&self, mut genre: Genre) -> Result<Genre> {
        genre.name = genre.name.trim().to_string();
        genre.updated_at = self.clock.unix_timestamp();
        self.genres.update(&genre).await?;
        Ok(genre)
    }

    /// Delete a genre; books filed under it become unfiled
    pub async fn delete_genre(&self, id: &str) -> Result<()> {
        if !self.genres.delete(id).await? {
            return Err(LibraryError::not_found("Genre", id).into());
        }
        info!(genre_id = %id, "Genre deleted");
        Ok(())
    }

    pub async fn list_genres(&self, page: PageRequest) -> Result<Page<Genre>> {
        Ok(self.genres.query(page).await?)
    }

    pub async fn get_or_create_genre(&self, name: &str) -> Result<Genre> {
        let name = name.trim();
        if let Some(genre) = self.genres.find_by_name(name).await? {
            return Ok(genre);
        }

        match self.create_genre(name).await {
            // Lost a race with another writer; theirs is as good as ours
            Err(CoreError::Library(LibraryError::Uniqueness { .. })) => self
                .genres
                .find_by_name(name)
                .await?
                .ok_or_else(|| LibraryError::not_found("Genre", name).into()),
            other => other,
        }
    }

    // ---------------------------------------------------------------------
    // Publishing houses
    // ---------------------------------------------------------------------

    pub async fn create_publishing(&self, publishing: Publishing) -> Result<Publishing> {
        self.publishings.insert(&publishing).await?;
        info!(publishing_id = %publishing.id, name = %publishing.name, "Publishing created");
        Ok(publishing)
    }

    pub async fn update_publishing(&self, mut publishing: Publishing) -> Result<Publishing> {
        publishing.updated_at = self.clock.unix_timestamp();
        self.publishings.update(&publishing).await?;
        Ok(publishing)
    }

    pub async fn delete_publishing(&self, id: &str) -> Result<()> {
        if !self.publishings.delete(id).await? {
            return Err(LibraryError::not_found("Publishing", id).into());
        }
        info!(publishing_id = %id, "Publishing deleted");
        Ok(())
    }

    pub async fn list_publishings(&self, page: PageRequest) -> Result<Page<Publishing>> {
        Ok(self.publishings.query(page).await?)
    }

    pub async fn get_or_create_publishing(&self, name: &str) -> Result<Publishing> {
        let name = name.trim();
        if let Some(publishing) = self.publishings.find_by_name(name).await? {
            return Ok(publishing);
        }

        let publishing = Publishing::new(name.to_string(), String::new(), String::new());
        match self.create_publishing(publishing).await {
            Err(CoreError::Library(LibraryError::Uniqueness { .. })) => self
                .publishings
                .find_by_name(name)
                .await?
                .ok_or_else(|| LibraryError::not_found("Publishing", name).into()),
            other => other,
        }
    }

    // ---------------------------------------------------------------------
    // Books
    // ---------------------------------------------------------------------

    /// Catalogue a book from the book form
    ///
    /// Genre and publishing are resolved first (an existing id must exist, a
    /// new name is looked up or created), then the book is stored and the
    /// author, if given, is found or created and linked.
    pub async fn create_book(&self, form: NewBook) -> Result<Book> {
        let genre_id = match form.genre {
            Some(Selection::Existing(id)) => Some(self.require_genre(&id).await?.id),
            Some(Selection::New(name)) if !name.trim().is_empty() => {
                Some(self.get_or_create_genre(&name).await?.id)
            }
            _ => None,
        };

        let publishing_id = match form.publishing {
            Some(Selection::Existing(id)) => Some(self.require_publishing(&id).await?.id),
            Some(Selection::New(name)) if !name.trim().is_empty() => {
                Some(self.get_or_create_publishing(&name).await?.id)
            }
            _ => None,
        };

        let mut book = Book::new(
            form.title.trim().to_string(),
            form.isbn.trim().to_string(),
            form.year_published,
            form.variety,
        )
        .with_copies(form.available_copies);
        book.genre_id = genre_id;
        book.publishing_id = publishing_id;

        self.add_book(&book).await?;

        if let Some(full_name) = form.author.as_deref().filter(|n| !n.trim().is_empty()) {
            let author = self.get_or_create_author(full_name).await?;
            self.books.add_author(&book.id, &author.id).await?;
        }

        Ok(book)
    }

    /// Store a fully built book as-is
    pub async fn add_book(&self, book: &Book) -> Result<()> {
        self.books.insert(book).await?;
        info!(
            book_id = %book.id,
            isbn = %book.isbn,
            copies = book.available_copies,
            "Book catalogued"
        );
        Ok(())
    }

    /// Update descriptive fields; the copy count is left to the lending ledger
    pub async fn update_book(&self, mut book: Book) -> Result<Book> {
        book.updated_at = self.clock.unix_timestamp();
        self.books.update(&book).await?;
        self.get_book(&book.id).await
    }

    /// Delete a book together with its lendings and author links
    pub async fn delete_book(&self, id: &str) -> Result<()> {
        if !self.books.delete(id).await? {
            return Err(LibraryError::not_found("Book", id).into());
        }
        info!(book_id = %id, "Book deleted");
        Ok(())
    }

    pub async fn get_book(&self, id: &str) -> Result<Book> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Book", id).into())
    }

    pub async fn find_book_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        Ok(self.books.find_by_isbn(isbn.trim()).await?)
    }

    /// Book with its authors, genre and publishing house
    pub async fn book_details(&self, id: &str) -> Result<BookDetails> {
        let book = self.get_book(id).await?;
        let authors = self.books.find_authors(id).await?;

        let genre = match &book.genre_id {
            Some(genre_id) => self.genres.find_by_id(genre_id).await?,
            None => None,
        };
        let publishing = match &book.publishing_id {
            Some(publishing_id) => self.publishings.find_by_id(publishing_id).await?,
            None => None,
        };

        Ok(BookDetails {
            book,
            authors,
            genre,
            publishing,
        })
    }

    pub async fn list_books(&self, page: PageRequest) -> Result<Page<Book>> {
        Ok(self.books.query(page).await?)
    }

    /// Books with at least one copy on the shelf
    pub async fn available_books(&self, page: PageRequest) -> Result<Page<Book>> {
        Ok(self.books.query_available(page).await?)
    }

    pub async fn books_by_author(&self, author_id: &str, page: PageRequest) -> Result<Page<Book>> {
        Ok(self.books.query_by_author(author_id, page).await?)
    }

    pub async fn books_by_genre(&self, genre_id: &str, page: PageRequest) -> Result<Page<Book>> {
        Ok(self.books.query_by_genre(genre_id, page).await?)
    }

    pub async fn attach_author(&self, book_id: &str, author_id: &str) -> Result<()> {
        self.books.add_author(book_id, author_id).await?;
        debug!(book_id, author_id, "Author attached");
        Ok(())
    }

    /// Unlink an author from a book
    ///
    /// # Returns
    /// `false` if the author was not linked
    pub async fn detach_author(&self, book_id: &str, author_id: &str) -> Result<bool> {
        Ok(self.books.remove_author(book_id, author_id).await?)
    }

    async fn require_genre(&self, id: &str) -> Result<Genre> {
        self.genres
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Genre", id).into())
    }

    async fn require_publishing(&self, id: &str) -> Result<Publishing> {
        self.publishings
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Publishing", id).into())
    }
}
