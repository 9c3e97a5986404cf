use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate value for {entity_type}.{field}: {value}")]
    Uniqueness {
        entity_type: String,
        field: String,
        value: String,
    },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("No available copies of book {book_id}")]
    NoAvailableCopies { book_id: String },

    #[error("Lending {lending_id} is already returned")]
    AlreadyReturned { lending_id: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub fn not_found(entity_type: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.into(),
        }
    }

    pub fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Translate a failed INSERT/UPDATE into a domain error
    ///
    /// `unique_fields` pairs each unique column of the entity with the value
    /// that was being written, so a constraint failure can name the duplicate.
    /// `references` lists the `(entity, id)` rows the write points at. SQLite
    /// does not say which foreign key failed, so the first one is reported.
    pub(crate) fn from_write(
        err: sqlx::Error,
        entity_type: &str,
        unique_fields: &[(&str, &str)],
        references: &[(&str, &str)],
    ) -> Self {
        let db_err = match &err {
            sqlx::Error::Database(db_err) => db_err,
            _ => return Self::Database(err),
        };

        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                let field = violated_column(db_err.message())
                    .unwrap_or("unknown")
                    .to_string();
                let value = unique_fields
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default();

                Self::Uniqueness {
                    entity_type: entity_type.to_string(),
                    field,
                    value,
                }
            }
            ErrorKind::ForeignKeyViolation => match references.first() {
                Some((entity, id)) => Self::not_found(entity, *id),
                None => Self::Database(err),
            },
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation => Self::InvalidInput {
                field: entity_type.to_string(),
                message: db_err.message().to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

/// Extract the column from `UNIQUE constraint failed: table.column[, ...]`
fn violated_column(message: &str) -> Option<&str> {
    let (_, columns) = message.split_once("failed: ")?;
    let first = columns.split(',').next()?.trim();
    first.rsplit('.').next()
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violated_column() {
        assert_eq!(
            violated_column("UNIQUE constraint failed: books.isbn"),
            Some("isbn")
        );
        assert_eq!(
            violated_column("UNIQUE constraint failed: addresses.reader_id"),
            Some("reader_id")
        );
        assert_eq!(
            violated_column("UNIQUE constraint failed: book_authors.book_id, book_authors.author_id"),
            Some("book_id")
        );
        assert_eq!(violated_column("disk I/O error"), None);
    }

    #[test]
    fn test_non_database_error_passes_through() {
        let err = LibraryError::from_write(sqlx::Error::RowNotFound, "Book", &[], &[]);
        assert!(matches!(err, LibraryError::Database(sqlx::Error::RowNotFound)));
    }

    #[tokio::test]
    async fn test_missing_parent_maps_to_not_found() {
        let pool = crate::db::create_test_pool().await.unwrap();

        let err = sqlx::query("INSERT INTO phones (id, reader_id, phone) VALUES (?, ?, ?)")
            .bind("p-1")
            .bind("missing-reader")
            .bind("+380000000")
            .execute(&pool)
            .await
            .unwrap_err();

        let err = LibraryError::from_write(
            err,
            "Phone",
            &[("phone", "+380000000")],
            &[("Reader", "missing-reader")],
        );
        match err {
            LibraryError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Reader");
                assert_eq!(id, "missing-reader");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_foreign_key_without_references_stays_database() {
        let pool = crate::db::create_test_pool().await.unwrap();

        let err = sqlx::query("INSERT INTO book_authors (book_id, author_id) VALUES (?, ?)")
            .bind("no-book")
            .bind("no-author")
            .execute(&pool)
            .await
            .unwrap_err();

        let err = LibraryError::from_write(err, "BookAuthor", &[], &[]);
        assert!(matches!(err, LibraryError::Database(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = LibraryError::NoAvailableCopies {
            book_id: "b-1".to_string(),
        };
        assert_eq!(err.to_string(), "No available copies of book b-1");

        let err = LibraryError::not_found("Reader", "r-9");
        assert_eq!(err.to_string(), "Entity not found: Reader with id r-9");
    }
}
