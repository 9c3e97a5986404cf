//! Reader directory: readers and their contact details.

use std::sync::Arc;

use bridge_traits::time::Clock;
use core_library::models::{Address, Phone, Reader};
use core_library::repositories::{
    AddressRepository, Page, PageRequest, PhoneRepository, ReaderRepository,
    SqliteAddressRepository, SqlitePhoneRepository, SqliteReaderRepository,
};
use core_library::LibraryError;
use core_runtime::logging::{redact_email, redact_phone};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;

/// A reader with all contact details on file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderProfile {
    pub reader: Reader,
    pub phones: Vec<Phone>,
    pub address: Option<Address>,
}

pub struct ReaderDirectory {
    readers: Arc<dyn ReaderRepository>,
    phones: Arc<dyn PhoneRepository>,
    addresses: Arc<dyn AddressRepository>,
    clock: Arc<dyn Clock>,
}

impl ReaderDirectory {
    pub fn new(
        readers: Arc<dyn ReaderRepository>,
        phones: Arc<dyn PhoneRepository>,
        addresses: Arc<dyn AddressRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            readers,
            phones,
            addresses,
            clock,
        }
    }

    pub fn from_pool(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(SqliteReaderRepository::new(pool.clone())),
            Arc::new(SqlitePhoneRepository::new(pool.clone())),
            Arc::new(SqliteAddressRepository::new(pool)),
            clock,
        )
    }

    pub async fn register_reader(&self, reader: Reader) -> Result<Reader> {
        self.readers.insert(&reader).await?;
        info!(
            reader_id = %reader.id,
            email = %redact_email(&reader.email),
            "Reader registered"
        );
        Ok(reader)
    }

    pub async fn update_reader(&self, mut reader: Reader) -> Result<Reader> {
        reader.email = reader.email.trim().to_string();
        reader.updated_at = self.clock.unix_timestamp();
        self.readers.update(&reader).await?;
        Ok(reader)
    }

    /// Remove a reader with their phones, address and lending history
    pub async fn delete_reader(&self, id: &str) -> Result<()> {
        if !self.readers.delete(id).await? {
            return Err(LibraryError::not_found("Reader", id).into());
        }
        info!(reader_id = %id, "Reader deleted");
        Ok(())
    }

    pub async fn get_reader(&self, id: &str) -> Result<Reader> {
        self.readers
            .find_by_id(id)
            .await?
            .ok_or_else(|| LibraryError::not_found("Reader", id).into())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Reader>> {
        Ok(self.readers.find_by_email(email).await?)
    }

    pub async fn list_readers(&self, page: PageRequest) -> Result<Page<Reader>> {
        Ok(self.readers.query(page).await?)
    }

    pub async fn reader_profile(&self, id: &str) -> Result<ReaderProfile> {
        let reader = self.get_reader(id).await?;
        let phones = self.phones.find_by_reader(id).await?;
        let address = self.addresses.find_by_reader(id).await?;

        Ok(ReaderProfile {
            reader,
            phones,
            address,
        })
    }

    // Phones

    pub async fn add_phone(&self, reader_id: &str, number: &str) -> Result<Phone> {
        let phone = Phone::new(reader_id.to_string(), number.to_string());
        self.phones.insert(&phone).await?;
        info!(reader_id, phone = %redact_phone(&phone.phone), "Phone added");
        Ok(phone)
    }

    pub async fn update_phone(&self, mut phone: Phone) -> Result<Phone> {
        phone.phone = phone.phone.trim().to_string();
        self.phones.update(&phone).await?;
        Ok(phone)
    }

    pub async fn remove_phone(&self, id: &str) -> Result<()> {
        if !self.phones.delete(id).await? {
            return Err(LibraryError::not_found("Phone", id).into());
        }
        Ok(())
    }

    // Address

    /// Record the reader's address; a reader has at most one
    pub async fn add_address(&self, address: Address) -> Result<Address> {
        self.addresses.insert(&address).await?;
        info!(reader_id = %address.reader_id, "Address recorded");
        Ok(address)
    }

    pub async fn update_address(&self, address: Address) -> Result<Address> {
        self.addresses.update(&address).await?;
        Ok(address)
    }

    pub async fn remove_address(&self, id: &str) -> Result<()> {
        if !self.addresses.delete(id).await? {
            return Err(LibraryError::not_found("Address", id).into());
        }
        Ok(())
    }
}
