//! Core service façade and bootstrap helpers.
//!
//! Hosts build a [`LibraryService`] either from a [`CoreConfig`] (opens the
//! database, runs migrations, installs logging) or from an existing pool, then
//! work through its three desks:
//!
//! - [`catalog()`](LibraryService::catalog) for authors, genres, publishing
//!   houses and books
//! - [`readers()`](LibraryService::readers) for readers and their contacts
//! - [`lending()`](LibraryService::lending) for lending and returning books
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::config::CoreConfig;
//! use core_service::LibraryService;
//!
//! let config = CoreConfig::builder()
//!     .database_path("library.db")
//!     .build()?;
//! let library = LibraryService::bootstrap(config).await?;
//!
//! let page = library.lending().overview().await?;
//! println!("{} books on the shelf", page.available_books.len());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod lending;
pub mod readers;

pub use catalog::{BookDetails, CatalogService, NewBook, Selection};
pub use error::{CoreError, Result};
pub use lending::{LendPage, LendingDesk};
pub use readers::{ReaderDirectory, ReaderProfile};

use std::sync::Arc;

use bridge_traits::time::Clock;
use core_library::db::{create_pool, DatabaseConfig};
use core_runtime::config::{CoreConfig, DatabaseLocation};
use core_runtime::logging::init_logging;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct LibraryService {
    pool: SqlitePool,
    catalog: Arc<CatalogService>,
    readers: Arc<ReaderDirectory>,
    lending: Arc<LendingDesk>,
}

impl LibraryService {
    /// Open the configured database and assemble the service
    ///
    /// Installs the global tracing subscriber unless the host already has one.
    ///
    /// # Errors
    ///
    /// - `Runtime` if the configuration is invalid
    /// - `InitializationFailed` if the database cannot be opened, migrated or
    ///   health-checked
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        if let Err(err) = init_logging(config.logging.clone()) {
            debug!(error = %err, "Keeping the host's tracing subscriber");
        }

        let pool = create_pool(database_config(&config))
            .await
            .map_err(|err| {
                tracing::error!(
                    database = ?config.database,
                    error = %err,
                    "Library database unavailable"
                );
                CoreError::InitializationFailed(format!(
                    "cannot open library database {:?}: {}",
                    config.database, err
                ))
            })?;

        info!(database = ?config.database, "Library service started");

        Ok(Self::from_pool(pool, Arc::clone(&config.clock)))
    }

    /// Assemble the service over an already migrated pool
    pub fn from_pool(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::from_pool(pool.clone(), Arc::clone(&clock))),
            readers: Arc::new(ReaderDirectory::from_pool(pool.clone(), Arc::clone(&clock))),
            lending: Arc::new(LendingDesk::from_pool(pool.clone(), clock)),
            pool,
        }
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn readers(&self) -> &ReaderDirectory {
        &self.readers
    }

    pub fn lending(&self) -> &LendingDesk {
        &self.lending
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all pooled connections; in-memory data is discarded
    pub async fn shutdown(&self) {
        self.pool.close().await;
        info!("Library service stopped");
    }
}

/// Pool settings for the configured database location
fn database_config(config: &CoreConfig) -> DatabaseConfig {
    let base = match &config.database {
        DatabaseLocation::File(path) => DatabaseConfig::new(path.clone()),
        // The in-memory database lives only as long as one connection does
        DatabaseLocation::InMemory => DatabaseConfig::in_memory(),
    };

    let min_connections = match config.database {
        DatabaseLocation::InMemory => config.min_connections.max(1),
        DatabaseLocation::File(_) => config.min_connections,
    };

    base.min_connections(min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
}
