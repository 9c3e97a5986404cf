//! The lending desk: lend and return books, and the data behind the lend page.

use std::sync::Arc;

use bridge_traits::time::Clock;
use chrono::NaiveDate;
use core_library::models::{Book, Lending, Reader};
use core_library::repositories::{
    pagination::MAX_PAGE_SIZE, BookRepository, LendingRepository, Page, PageRequest,
    ReaderRepository, SqliteBookRepository, SqliteLendingRepository, SqliteReaderRepository,
};
use core_library::{LendingLedger, LibraryError};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{CoreError, Result};

/// Shown after a successful lend
pub const LENT_MESSAGE: &str = "Book successfully lent.";
/// Shown after a successful return
pub const RETURNED_MESSAGE: &str = "Book returned.";

/// Everything the lend page lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendPage {
    /// Readers to pick from
    pub readers: Vec<Reader>,
    /// Books with at least one copy on the shelf
    pub available_books: Vec<Book>,
    /// Loans not yet returned
    pub active_lendings: Vec<Lending>,
}

fn selected(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

pub struct LendingDesk {
    ledger: LendingLedger,
    lendings: Arc<dyn LendingRepository>,
    readers: Arc<dyn ReaderRepository>,
    books: Arc<dyn BookRepository>,
}

impl LendingDesk {
    pub fn new(
        ledger: LendingLedger,
        lendings: Arc<dyn LendingRepository>,
        readers: Arc<dyn ReaderRepository>,
        books: Arc<dyn BookRepository>,
    ) -> Self {
        Self {
            ledger,
            lendings,
            readers,
            books,
        }
    }

    pub fn from_pool(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            LendingLedger::new(pool.clone(), clock),
            Arc::new(SqliteLendingRepository::new(pool.clone())),
            Arc::new(SqliteReaderRepository::new(pool.clone())),
            Arc::new(SqliteBookRepository::new(pool)),
        )
    }

    /// Lend the selected book to the selected reader
    ///
    /// Both selections are required; a blank one counts as missing. Hosts
    /// confirm success with [`LENT_MESSAGE`].
    pub async fn lend(&self, reader_id: Option<&str>, book_id: Option<&str>) -> Result<Lending> {
        let (Some(reader_id), Some(book_id)) = (selected(reader_id), selected(book_id)) else {
            return Err(CoreError::validation(
                "selection",
                "Please select both reader and book.",
            ));
        };

        Ok(self.ledger.lend(reader_id, book_id).await?)
    }

    /// Mark a lending as returned and put the copy back on the shelf
    ///
    /// Hosts confirm success with [`RETURNED_MESSAGE`].
    pub async fn return_book(&self, lending_id: &str) -> Result<Lending> {
        Ok(self.ledger.return_lending(lending_id.trim()).await?)
    }

    /// Fix a mistyped lending date; availability is not affected
    pub async fn correct_lending_date(&self, lending_id: &str, lending_date: NaiveDate) -> Result<()> {
        Ok(self
            .lendings
            .update_lending_date(lending_id, lending_date)
            .await?)
    }

    pub async fn get_lending(&self, id: &str) -> Result<Lending> {
        self.lendings
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Lending", id).into())
    }

    pub async fn active_lendings(&self, page: PageRequest) -> Result<Page<Lending>> {
        Ok(self.lendings.query_active(page).await?)
    }

    pub async fn reader_history(&self, reader_id: &str) -> Result<Vec<Lending>> {
        Ok(self.lendings.find_by_reader(reader_id).await?)
    }

    pub async fn book_history(&self, book_id: &str) -> Result<Vec<Lending>> {
        Ok(self.lendings.find_by_book(book_id).await?)
    }

    /// Copies of a book currently out on loan
    pub async fn copies_out(&self, book_id: &str) -> Result<i64> {
        Ok(self.lendings.count_active_for_book(book_id).await?)
    }

    /// Readers, lendable books and open loans for the lend page
    ///
    /// Each list holds at most [`MAX_PAGE_SIZE`] entries.
    pub async fn overview(&self) -> Result<LendPage> {
        let page = PageRequest::first(MAX_PAGE_SIZE);

        let readers = self.readers.query(page).await?.items;
        let available_books = self.books.query_available(page).await?.items;
        let active_lendings = self.lendings.query_active(page).await?.items;

        Ok(LendPage {
            readers,
            available_books,
            active_lendings,
        })
    }
}
