//! Domain models for the library record store
//!
//! This module contains rich domain models with validation and database mapping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// Choice Enums
// =============================================================================

/// Gender of an author or reader (stored as INTEGER)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[repr(i32)]
pub enum Gender {
    #[default]
    NotSpecified = 0,
    Male = 1,
    Female = 2,
    Other = 3,
}

impl Gender {
    /// All choices with their display labels, in form order
    pub const CHOICES: [(Gender, &'static str); 4] = [
        (Gender::NotSpecified, "Not specified"),
        (Gender::Male, "Male"),
        (Gender::Female, "Female"),
        (Gender::Other, "Other"),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::NotSpecified => "Not specified",
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl TryFrom<i32> for Gender {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::NotSpecified),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Female),
            3 => Ok(Gender::Other),
            other => Err(format!("Unknown gender code: {}", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Physical or digital form of a book (stored as TEXT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Variety {
    #[sqlx(rename = "PAPERBACK")]
    #[serde(rename = "PAPERBACK")]
    Paperback,
    #[sqlx(rename = "E_BOOK")]
    #[serde(rename = "E_BOOK")]
    EBook,
    #[sqlx(rename = "AUDIO_BOOK")]
    #[serde(rename = "AUDIO_BOOK")]
    AudioBook,
}

impl Variety {
    pub const CHOICES: [(Variety, &'static str); 3] = [
        (Variety::Paperback, "Paperback"),
        (Variety::EBook, "E-Book"),
        (Variety::AudioBook, "Audiobook"),
    ];

    /// Stored code, e.g. `E_BOOK`
    pub fn code(&self) -> &'static str {
        match self {
            Variety::Paperback => "PAPERBACK",
            Variety::EBook => "E_BOOK",
            Variety::AudioBook => "AUDIO_BOOK",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variety::Paperback => "Paperback",
            Variety::EBook => "E-Book",
            Variety::AudioBook => "Audiobook",
        }
    }
}

impl FromStr for Variety {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PAPERBACK" => Ok(Variety::Paperback),
            "E_BOOK" => Ok(Variety::EBook),
            "AUDIO_BOOK" => Ok(Variety::AudioBook),
            other => Err(format!("Unknown variety: {}", other)),
        }
    }
}

impl fmt::Display for Variety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a lending record
///
/// ```text
/// Active ──return──▶ Returned (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LendingState {
    Active,
    Returned,
}

impl fmt::Display for LendingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LendingState::Active => f.write_str("ACTIVE"),
            LendingState::Returned => f.write_str("RETURNED"),
        }
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    limit_text(field, value, max_len)
}

fn limit_text(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.chars().count() > max_len {
        return Err(format!("{} exceeds {} characters", field, max_len));
    }
    Ok(())
}

fn limit_optional(field: &str, value: Option<&str>, max_len: usize) -> Result<(), String> {
    match value {
        Some(value) => limit_text(field, value, max_len),
        None => Ok(()),
    }
}

/// Loose `local@domain.tld` shape check; deliverability is not our concern.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Catalog Models
// =============================================================================

/// Book author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Author {
    /// Unique identifier
    pub id: String,
    pub surname: String,
    pub first_name: String,
    /// Patronymic / middle name, may be empty
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    /// Timestamps
    pub created_at: i64,
    pub updated_at: i64,
}

impl Author {
    pub fn new(surname: String, first_name: String, last_name: String) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            surname,
            first_name,
            last_name,
            birth_date: None,
            gender: Gender::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an author from a single "First Surname" string
    ///
    /// The first whitespace-separated token becomes the first name and the
    /// remainder the surname, which may be empty for single-word names.
    pub fn from_full_name(full_name: &str) -> Self {
        let (first_name, surname) = Self::split_full_name(full_name);
        Self::new(surname, first_name, String::new())
    }

    /// Split "Stephen Edwin King" into ("Stephen", "Edwin King")
    pub fn split_full_name(full_name: &str) -> (String, String) {
        let mut parts = full_name.split_whitespace();
        let first_name = parts.next().unwrap_or_default().to_string();
        let surname = parts.collect::<Vec<_>>().join(" ");
        (first_name, surname)
    }

    /// "Surname First" as shown in listings
    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.first_name)
            .trim()
            .to_string()
    }

    /// Validate author data
    pub fn validate(&self) -> Result<(), String> {
        require_text("First name", &self.first_name, 100)?;
        limit_text("Surname", &self.surname, 100)?;
        limit_text("Last name", &self.last_name, 100)?;
        Ok(())
    }
}

/// Book genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub id: String,
    /// Unique genre name
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Genre {
    pub fn new(name: String) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("Genre name", &self.name, 100)
    }
}

/// Publishing house
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Publishing {
    pub id: String,
    /// Unique publisher name
    pub name: String,
    pub country: String,
    pub city: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Publishing {
    pub fn new(name: String, country: String, city: String) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            country,
            city,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("Publishing name", &self.name, 150)?;
        limit_text("Country", &self.country, 100)?;
        limit_text("City", &self.city, 100)?;
        Ok(())
    }
}

/// Catalogued book
///
/// `available_copies` is owned by the lending ledger once the book is stored;
/// catalog updates never write it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: String,
    pub title: String,
    /// Unique ISBN (up to 13 characters, dashes allowed)
    pub isbn: String,
    pub year_published: i32,
    /// Copies currently on the shelf
    pub available_copies: i64,
    pub variety: Variety,
    pub genre_id: Option<String>,
    pub publishing_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    /// Create a new book with one available copy
    pub fn new(title: String, isbn: String, year_published: i32, variety: Variety) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            isbn,
            year_published,
            available_copies: 1,
            variety,
            genre_id: None,
            publishing_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the initial number of copies
    pub fn with_copies(mut self, copies: i64) -> Self {
        self.available_copies = copies;
        self
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Validate book data
    pub fn validate(&self) -> Result<(), String> {
        self.validate_details()?;

        if self.available_copies < 0 {
            return Err("Available copies cannot be negative".to_string());
        }

        Ok(())
    }

    /// Validate the catalog fields only, leaving out `available_copies`
    pub fn validate_details(&self) -> Result<(), String> {
        require_text("Title", &self.title, 200)?;
        require_text("ISBN", &self.isbn, 13)?;

        if self.year_published < 0 {
            return Err(format!(
                "Year published {} cannot be negative",
                self.year_published
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Reader Directory Models
// =============================================================================

/// Library reader (patron)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reader {
    pub id: String,
    pub surname: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    /// Unique contact email
    pub email: String,
    pub gender: Gender,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reader {
    pub fn new(surname: String, first_name: String, last_name: String, email: String) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4().to_string(),
            surname,
            first_name,
            last_name,
            birth_date: None,
            email: email.trim().to_string(),
            gender: Gender::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.first_name)
    }

    /// Validate reader data
    pub fn validate(&self) -> Result<(), String> {
        require_text("Surname", &self.surname, 100)?;
        require_text("First name", &self.first_name, 100)?;
        limit_text("Last name", &self.last_name, 100)?;
        limit_text("Email", &self.email, 254)?;

        if !is_valid_email(&self.email) {
            return Err(format!("Invalid email address: {}", self.email));
        }

        Ok(())
    }
}

/// Reader phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Phone {
    pub id: String,
    pub reader_id: String,
    /// Unique phone number
    pub phone: String,
}

impl Phone {
    pub fn new(reader_id: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reader_id,
            phone: phone.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("Phone", &self.phone, 20)
    }
}

/// Reader postal address (at most one per reader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: String,
    pub reader_id: String,
    pub country: String,
    pub region: String,
    pub area: String,
    pub city: String,
    pub street: String,
    pub building: String,
    pub apartment: Option<String>,
    pub entrance: Option<String>,
    pub room: Option<String>,
}

impl Address {
    pub fn new(
        reader_id: String,
        country: String,
        region: String,
        area: String,
        city: String,
        street: String,
        building: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reader_id,
            country,
            region,
            area,
            city,
            street,
            building,
            apartment: None,
            entrance: None,
            room: None,
        }
    }

    /// "City, Street Building"
    pub fn summary(&self) -> String {
        format!("{}, {} {}", self.city, self.street, self.building)
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("Country", &self.country, 100)?;
        require_text("Region", &self.region, 100)?;
        require_text("Area", &self.area, 100)?;
        require_text("City", &self.city, 100)?;
        require_text("Street", &self.street, 100)?;
        require_text("Building", &self.building, 20)?;
        limit_optional("Apartment", self.apartment.as_deref(), 20)?;
        limit_optional("Entrance", self.entrance.as_deref(), 20)?;
        limit_optional("Room", self.room.as_deref(), 20)?;
        Ok(())
    }
}

// =============================================================================
// Lending Model
// =============================================================================

/// Loan of one copy of a book to a reader
///
/// Records are created and returned only through
/// [`LendingLedger`](crate::ledger::LendingLedger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Lending {
    pub id: String,
    pub reader_id: String,
    pub book_id: String,
    pub lending_date: NaiveDate,
    /// Set exactly when `returned` is true
    pub return_date: Option<NaiveDate>,
    pub returned: bool,
}

impl Lending {
    /// Open (active) lending starting on `lending_date`
    pub(crate) fn open(reader_id: String, book_id: String, lending_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reader_id,
            book_id,
            lending_date,
            return_date: None,
            returned: false,
        }
    }

    pub fn state(&self) -> LendingState {
        if self.returned {
            LendingState::Returned
        } else {
            LendingState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LendingState::Active
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::default(), Gender::NotSpecified);
        assert_eq!(Gender::try_from(1), Ok(Gender::Male));
        assert_eq!(Gender::try_from(3), Ok(Gender::Other));
        assert!(Gender::try_from(7).is_err());
        assert_eq!(Gender::Female.to_string(), "Female");
        assert_eq!(Gender::CHOICES.len(), 4);
    }

    #[test]
    fn test_variety_parse() {
        assert_eq!("PAPERBACK".parse::<Variety>(), Ok(Variety::Paperback));
        assert_eq!("e_book".parse::<Variety>(), Ok(Variety::EBook));
        assert_eq!("AUDIO_BOOK".parse::<Variety>(), Ok(Variety::AudioBook));
        assert!("HARDCOVER".parse::<Variety>().is_err());
        assert_eq!(Variety::EBook.code(), "E_BOOK");
        assert_eq!(Variety::AudioBook.label(), "Audiobook");
    }

    #[test]
    fn test_author_split_full_name() {
        assert_eq!(
            Author::split_full_name("Stephen Edwin King"),
            ("Stephen".to_string(), "Edwin King".to_string())
        );
        assert_eq!(
            Author::split_full_name("  Homer "),
            ("Homer".to_string(), String::new())
        );

        let author = Author::from_full_name("Stephen King");
        assert_eq!(author.first_name, "Stephen");
        assert_eq!(author.surname, "King");
        assert_eq!(author.display_name(), "King Stephen");
    }

    #[test]
    fn test_author_validation() {
        let mut author = Author::new("King".into(), "Stephen".into(), "Edwin".into());
        assert!(author.validate().is_ok());

        author.first_name = "  ".to_string();
        assert!(author.validate().is_err());

        author.first_name = "S".repeat(101);
        assert!(author.validate().is_err());
    }

    #[test]
    fn test_book_new() {
        let book = Book::new("It".into(), "06-708-13-028".into(), 1986, Variety::Paperback);
        assert_eq!(book.available_copies, 1);
        assert!(book.is_available());
        assert!(book.genre_id.is_none());
        assert!(book.created_at > 0);
    }

    #[test]
    fn test_book_validation() {
        let mut book = Book::new("It".into(), "06-708-13-028".into(), 1986, Variety::Paperback);
        assert!(book.validate().is_ok());

        book.isbn = "12345678901234".to_string();
        assert!(book.validate().is_err());

        book.isbn = "0670813028".to_string();
        book.available_copies = -1;
        assert!(book.validate().is_err());
        assert!(book.validate_details().is_ok());

        book.available_copies = 0;
        book.year_published = -5;
        assert!(book.validate().is_err());

        book.year_published = 1986;
        book.title = String::new();
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("john@email.com"));
        assert!(!is_valid_email("john.email.com"));
        assert!(!is_valid_email("john@localhost"));
        assert!(!is_valid_email("@email.com"));
        assert!(!is_valid_email("jo hn@email.com"));
        assert!(!is_valid_email("john@@email.com"));
    }

    #[test]
    fn test_reader_validation() {
        let mut reader = Reader::new(
            "Johnson".into(),
            "John".into(),
            "Michael".into(),
            " john@email.com ".into(),
        );
        assert_eq!(reader.email, "john@email.com");
        assert!(reader.validate().is_ok());

        reader.email = "not-an-email".to_string();
        assert!(reader.validate().is_err());
    }

    #[test]
    fn test_phone_validation() {
        let phone = Phone::new("r".into(), "+380000000".into());
        assert!(phone.validate().is_ok());

        let phone = Phone::new("r".into(), "555-0100 ext. 12".into());
        assert!(phone.validate().is_ok());

        let phone = Phone::new("r".into(), "   ".into());
        assert!(phone.validate().is_err());

        let phone = Phone::new("r".into(), "1".repeat(21));
        assert!(phone.validate().is_err());
    }

    #[test]
    fn test_address_validation() {
        let mut address = Address::new(
            "r".into(),
            "USA".into(),
            "NY".into(),
            "Manhattan".into(),
            "New York".into(),
            "Main Avenue".into(),
            "10".into(),
        );
        address.apartment = Some("1A".into());
        assert!(address.validate().is_ok());
        assert_eq!(address.summary(), "New York, Main Avenue 10");

        address.room = Some("R".repeat(21));
        assert!(address.validate().is_err());
    }

    #[test]
    fn test_lending_state() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut lending = Lending::open("r".into(), "b".into(), date);
        assert_eq!(lending.state(), LendingState::Active);
        assert!(lending.return_date.is_none());

        lending.returned = true;
        lending.return_date = Some(date);
        assert_eq!(lending.state(), LendingState::Returned);
        assert_eq!(lending.state().to_string(), "RETURNED");
    }
}
