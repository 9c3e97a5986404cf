//! # Lending Ledger
//!
//! The only writer of `books.available_copies` after a book is catalogued,
//! and the only place a lending changes state.
//!
//! ```text
//! lend:    Active  (copies - 1)
//! return:  Active ──▶ Returned  (copies + 1)
//! ```
//!
//! Each operation is one transaction whose first statement is a conditional
//! update, so SQLite's write lock is held before anything is read and two
//! callers can never both take the last copy or both return the same loan.

use crate::error::{LibraryError, Result};
use crate::models::Lending;
use bridge_traits::time::Clock;
use sqlx::{query, query_as, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates and closes lending records while keeping book availability in step
#[derive(Clone)]
pub struct LendingLedger {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl LendingLedger {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Lend one copy of `book_id` to `reader_id`, dated today
    ///
    /// # Errors
    ///
    /// - `NotFound` if the book or the reader does not exist
    /// - `NoAvailableCopies` if every copy is out
    ///
    /// A failed lend leaves no record and the copy count untouched.
    pub async fn lend(&self, reader_id: &str, book_id: &str) -> Result<Lending> {
        let mut tx = self.pool.begin().await?;

        let taken = query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = ? AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            let err = if row_exists(&mut tx, "books", book_id).await? {
                LibraryError::NoAvailableCopies {
                    book_id: book_id.to_string(),
                }
            } else {
                LibraryError::not_found("Book", book_id)
            };
            warn!(book_id, reader_id, error = %err, "Lend rejected");
            return Err(err);
        }

        if !row_exists(&mut tx, "readers", reader_id).await? {
            warn!(book_id, reader_id, "Lend rejected: unknown reader");
            return Err(LibraryError::not_found("Reader", reader_id));
        }

        let lending = Lending::open(reader_id.to_string(), book_id.to_string(), self.clock.today());

        query(
            r#"
            INSERT INTO lendings (id, reader_id, book_id, lending_date, return_date, returned)
            VALUES (?, ?, ?, ?, NULL, 0)
            "#,
        )
        .bind(&lending.id)
        .bind(&lending.reader_id)
        .bind(&lending.book_id)
        .bind(lending.lending_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            lending_id = %lending.id,
            book_id,
            reader_id,
            lending_date = %lending.lending_date,
            "Book lent"
        );
        Ok(lending)
    }

    /// Close an active lending, dated today, and put the copy back
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown lending
    /// - `AlreadyReturned` if the lending is closed; nothing changes
    pub async fn return_lending(&self, lending_id: &str) -> Result<Lending> {
        let return_date = self.clock.today();
        let mut tx = self.pool.begin().await?;

        let closed = query(
            r#"
            UPDATE lendings
            SET returned = 1, return_date = ?
            WHERE id = ? AND returned = 0
            "#,
        )
        .bind(return_date)
        .bind(lending_id)
        .execute(&mut *tx)
        .await?;

        if closed.rows_affected() == 0 {
            let err = if row_exists(&mut tx, "lendings", lending_id).await? {
                LibraryError::AlreadyReturned {
                    lending_id: lending_id.to_string(),
                }
            } else {
                LibraryError::not_found("Lending", lending_id)
            };
            warn!(lending_id, error = %err, "Return rejected");
            return Err(err);
        }

        let lending = query_as::<_, Lending>("SELECT * FROM lendings WHERE id = ?")
            .bind(lending_id)
            .fetch_one(&mut *tx)
            .await?;

        query("UPDATE books SET available_copies = available_copies + 1 WHERE id = ?")
            .bind(&lending.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            lending_id,
            book_id = %lending.book_id,
            %return_date,
            "Book returned"
        );
        Ok(lending)
    }
}

async fn row_exists(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    id: &str,
) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    let (exists,): (bool,) = query_as::<_, (bool,)>(&sql).bind(id).fetch_one(&mut **tx).await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::{Book, Genre, Reader, Variety};
    use crate::repositories::{
        BookRepository, GenreRepository, LendingRepository, ReaderRepository,
        SqliteBookRepository, SqliteGenreRepository, SqliteLendingRepository,
        SqliteReaderRepository,
    };
    use bridge_traits::time::FixedClock;
    use chrono::{DateTime, NaiveDate, Utc};
    use mockall::mock;

    mock! {
        pub LedgerClock {}

        impl Clock for LedgerClock {
            fn now(&self) -> DateTime<Utc>;
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    struct Fixture {
        pool: SqlitePool,
        ledger: LendingLedger,
        books: SqliteBookRepository,
        lendings: SqliteLendingRepository,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await.unwrap();
        Fixture {
            ledger: LendingLedger::new(pool.clone(), Arc::new(FixedClock::on(day(10)))),
            books: SqliteBookRepository::new(pool.clone()),
            lendings: SqliteLendingRepository::new(pool.clone()),
            pool,
        }
    }

    async fn add_book(f: &Fixture, title: &str, isbn: &str, copies: i64) -> Book {
        let book = Book::new(title.into(), isbn.into(), 1986, Variety::Paperback).with_copies(copies);
        f.books.insert(&book).await.unwrap();
        book
    }

    async fn add_reader(f: &Fixture, first_name: &str) -> Reader {
        let reader = Reader::new(
            "Reader".into(),
            first_name.into(),
            String::new(),
            format!("{}@email.com", first_name.to_lowercase()),
        );
        SqliteReaderRepository::new(f.pool.clone())
            .insert(&reader)
            .await
            .unwrap();
        reader
    }

    async fn copies(f: &Fixture, book_id: &str) -> i64 {
        f.books
            .find_by_id(book_id)
            .await
            .unwrap()
            .unwrap()
            .available_copies
    }

    #[tokio::test]
    async fn test_it_scenario() {
        let f = fixture().await;
        let it = add_book(&f, "It", "06-708-13-028", 2).await;
        let a = add_reader(&f, "Alice").await;
        let b = add_reader(&f, "Bob").await;
        let c = add_reader(&f, "Carol").await;

        let first = f.ledger.lend(&a.id, &it.id).await.unwrap();
        assert_eq!(copies(&f, &it.id).await, 1);
        assert!(first.is_active());
        assert_eq!(first.lending_date, day(10));

        let second = f.ledger.lend(&b.id, &it.id).await.unwrap();
        assert_eq!(copies(&f, &it.id).await, 0);

        let rejected = f.ledger.lend(&c.id, &it.id).await;
        assert!(matches!(rejected, Err(LibraryError::NoAvailableCopies { .. })));
        assert_eq!(copies(&f, &it.id).await, 0);
        assert_eq!(f.lendings.count().await.unwrap(), 2);

        let returned = f.ledger.return_lending(&first.id).await.unwrap();
        assert!(returned.returned);
        assert_eq!(returned.return_date, Some(day(10)));
        assert_eq!(copies(&f, &it.id).await, 1);

        let third = f.ledger.lend(&c.id, &it.id).await.unwrap();
        assert_eq!(copies(&f, &it.id).await, 0);
        assert_eq!(f.lendings.count_active_for_book(&it.id).await.unwrap(), 2);

        assert_ne!(second.id, third.id);
    }

    #[tokio::test]
    async fn test_double_return_is_rejected() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 1).await;
        let reader = add_reader(&f, "Alice").await;

        let lending = f.ledger.lend(&reader.id, &book.id).await.unwrap();
        f.ledger.return_lending(&lending.id).await.unwrap();
        assert_eq!(copies(&f, &book.id).await, 1);

        let again = f.ledger.return_lending(&lending.id).await;
        assert!(matches!(again, Err(LibraryError::AlreadyReturned { .. })));
        assert_eq!(copies(&f, &book.id).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 1).await;
        let reader = add_reader(&f, "Alice").await;

        assert!(matches!(
            f.ledger.lend(&reader.id, "no-book").await,
            Err(LibraryError::NotFound { ref entity_type, .. }) if entity_type == "Book"
        ));

        assert!(matches!(
            f.ledger.lend("no-reader", &book.id).await,
            Err(LibraryError::NotFound { ref entity_type, .. }) if entity_type == "Reader"
        ));
        // The decrement was rolled back with the transaction
        assert_eq!(copies(&f, &book.id).await, 1);
        assert_eq!(f.lendings.count().await.unwrap(), 0);

        assert!(matches!(
            f.ledger.return_lending("no-lending").await,
            Err(LibraryError::NotFound { ref entity_type, .. }) if entity_type == "Lending"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_lends_of_last_copy() {
        let f = fixture().await;
        let book = add_book(&f, "Misery", "0670813664", 1).await;
        let a = add_reader(&f, "Alice").await;
        let b = add_reader(&f, "Bob").await;

        let (left, right) = futures::join!(
            f.ledger.lend(&a.id, &book.id),
            f.ledger.lend(&b.id, &book.id)
        );

        let successes = [left.is_ok(), right.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        let failure = if left.is_err() { left } else { right };
        assert!(matches!(
            failure,
            Err(LibraryError::NoAvailableCopies { .. })
        ));

        assert_eq!(copies(&f, &book.id).await, 0);
        assert_eq!(f.lendings.count_active_for_book(&book.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_return_date_comes_from_clock() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 1).await;
        let reader = add_reader(&f, "Alice").await;

        let mut clock = MockLedgerClock::new();
        clock
            .expect_now()
            .returning(|| day(20).and_hms_opt(9, 30, 0).unwrap().and_utc());
        let ledger = LendingLedger::new(f.pool.clone(), Arc::new(clock));

        let lending = f.ledger.lend(&reader.id, &book.id).await.unwrap();
        let returned = ledger.return_lending(&lending.id).await.unwrap();

        assert_eq!(returned.lending_date, day(10));
        assert_eq!(returned.return_date, Some(day(20)));
    }

    #[tokio::test]
    async fn test_correcting_date_keeps_availability() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 3).await;
        let reader = add_reader(&f, "Alice").await;

        let lending = f.ledger.lend(&reader.id, &book.id).await.unwrap();
        f.lendings
            .update_lending_date(&lending.id, day(2))
            .await
            .unwrap();

        assert_eq!(copies(&f, &book.id).await, 2);
        let stored = f.lendings.find_by_id(&lending.id).await.unwrap().unwrap();
        assert_eq!(stored.lending_date, day(2));
        assert!(stored.is_active());
    }

    #[tokio::test]
    async fn test_book_delete_cascades_to_lendings() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 1).await;
        let reader = add_reader(&f, "Alice").await;

        let lending = f.ledger.lend(&reader.id, &book.id).await.unwrap();
        assert!(f.books.delete(&book.id).await.unwrap());

        assert!(f.lendings.find_by_id(&lending.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reader_delete_cascades_to_lendings() {
        let f = fixture().await;
        let book = add_book(&f, "It", "06-708-13-028", 1).await;
        let reader = add_reader(&f, "Alice").await;

        f.ledger.lend(&reader.id, &book.id).await.unwrap();
        SqliteReaderRepository::new(f.pool.clone())
            .delete(&reader.id)
            .await
            .unwrap();

        assert!(f.lendings.find_by_reader(&reader.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_genre_delete_keeps_lent_book() {
        let f = fixture().await;
        let genres = SqliteGenreRepository::new(f.pool.clone());
        let horror = Genre::new("Horror".into());
        genres.insert(&horror).await.unwrap();

        let mut book = Book::new("It".into(), "06-708-13-028".into(), 1986, Variety::Paperback);
        book.genre_id = Some(horror.id.clone());
        f.books.insert(&book).await.unwrap();
        let reader = add_reader(&f, "Alice").await;
        f.ledger.lend(&reader.id, &book.id).await.unwrap();

        genres.delete(&horror.id).await.unwrap();

        let stored = f.books.find_by_id(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.genre_id, None);
        assert_eq!(stored.available_copies, 0);
        assert_eq!(f.lendings.count_active_for_book(&book.id).await.unwrap(), 1);
    }
}
