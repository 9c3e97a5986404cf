use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

impl CoreError {
    /// Form-level validation failure, e.g. a missing selection
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Library(LibraryError::invalid_input(field, message))
    }

    /// Text suitable for showing to the librarian at the desk
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Library(err) => library_message(err),
            CoreError::Runtime(_) | CoreError::InitializationFailed(_) => {
                "The library service is not available.".to_string()
            }
        }
    }

    /// Whether the caller can fix the request and try again
    ///
    /// Domain rejections are recoverable; storage and startup failures are not,
    /// except for a pool timeout under load.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CoreError::Library(err) => match err {
                LibraryError::NotFound { .. }
                | LibraryError::Uniqueness { .. }
                | LibraryError::InvalidInput { .. }
                | LibraryError::NoAvailableCopies { .. }
                | LibraryError::AlreadyReturned { .. } => true,
                LibraryError::Database(sqlx::Error::PoolTimedOut) => true,
                LibraryError::Database(_) | LibraryError::Migration(_) => false,
            },
            CoreError::Runtime(_) | CoreError::InitializationFailed(_) => false,
        }
    }

    /// The underlying library error, if this is one
    pub fn as_library(&self) -> Option<&LibraryError> {
        match self {
            CoreError::Library(err) => Some(err),
            _ => None,
        }
    }
}

fn library_message(err: &LibraryError) -> String {
    match err {
        LibraryError::NoAvailableCopies { .. } => "No available copies.".to_string(),
        LibraryError::AlreadyReturned { .. } => "This book is already returned.".to_string(),
        LibraryError::NotFound { entity_type, .. } => match entity_type.as_str() {
            "Lending" => "Lending not found.".to_string(),
            "Reader" => "Selected reader not found.".to_string(),
            "Book" => "Selected book not found.".to_string(),
            other => format!("{} not found.", other),
        },
        LibraryError::Uniqueness {
            entity_type, field, ..
        } => format!(
            "{} with this {} already exists.",
            entity_type,
            field.replace('_', " ")
        ),
        LibraryError::InvalidInput { message, .. } => message.clone(),
        LibraryError::Database(_) | LibraryError::Migration(_) => {
            "Something went wrong while saving. Please try again.".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
