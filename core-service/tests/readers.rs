use std::sync::Arc;

use bridge_traits::time::SystemClock;
use core_library::db::create_test_pool;
use core_library::models::{Address, Reader};
use core_library::repositories::PageRequest;
use core_library::LibraryError;
use core_service::{CoreError, LibraryService, NewBook};

async fn library() -> LibraryService {
    let pool = create_test_pool().await.unwrap();
    LibraryService::from_pool(pool, Arc::new(SystemClock))
}

fn john() -> Reader {
    Reader::new(
        "Johnson".into(),
        "John".into(),
        "Michael".into(),
        "john@email.com".into(),
    )
}

fn address_for(reader_id: &str) -> Address {
    Address::new(
        reader_id.to_string(),
        "USA".into(),
        "NY".into(),
        "Manhattan".into(),
        "New York".into(),
        "Main Avenue".into(),
        "10".into(),
    )
}

#[tokio::test]
async fn reader_profile_collects_contacts() {
    let library = library().await;
    let directory = library.readers();

    let reader = directory.register_reader(john()).await.unwrap();
    directory.add_phone(&reader.id, "+380000000").await.unwrap();
    directory.add_phone(&reader.id, " +380000001 ").await.unwrap();
    directory.add_address(address_for(&reader.id)).await.unwrap();

    let profile = directory.reader_profile(&reader.id).await.unwrap();
    assert_eq!(profile.reader.email, "john@email.com");
    assert_eq!(profile.phones.len(), 2);
    assert_eq!(profile.phones[1].phone, "+380000001");
    assert_eq!(
        profile.address.map(|a| a.summary()).as_deref(),
        Some("New York, Main Avenue 10")
    );
}

#[tokio::test]
async fn contact_uniqueness() {
    let library = library().await;
    let directory = library.readers();

    let reader = directory.register_reader(john()).await.unwrap();

    let err = directory.register_reader(john()).await.unwrap_err();
    assert_eq!(err.user_message(), "Reader with this email already exists.");

    directory.add_phone(&reader.id, "+380000000").await.unwrap();
    let err = directory.add_phone(&reader.id, "+380000000").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::Uniqueness { ref field, .. }) if field == "phone"
    ));

    directory.add_address(address_for(&reader.id)).await.unwrap();
    let err = directory
        .add_address(address_for(&reader.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::Uniqueness { ref field, .. }) if field == "reader_id"
    ));
}

#[tokio::test]
async fn contacts_need_a_known_reader() {
    let library = library().await;
    let directory = library.readers();

    let err = directory.add_phone("ghost", "+380000000").await.unwrap_err();
    assert_eq!(err.user_message(), "Selected reader not found.");

    let err = directory.add_address(address_for("ghost")).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Library(LibraryError::NotFound { .. })
    ));

    let err = directory.reader_profile("ghost").await.unwrap_err();
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn deleting_a_reader_cascades() {
    let library = library().await;
    let directory = library.readers();

    let reader = directory.register_reader(john()).await.unwrap();
    let phone = directory.add_phone(&reader.id, "+380000000").await.unwrap();
    directory.add_address(address_for(&reader.id)).await.unwrap();

    let book = library
        .catalog()
        .create_book(NewBook::new("It", "0670813028", 1986))
        .await
        .unwrap();
    library
        .lending()
        .lend(Some(reader.id.as_str()), Some(book.id.as_str()))
        .await
        .unwrap();

    directory.delete_reader(&reader.id).await.unwrap();

    assert!(directory.find_by_email("john@email.com").await.unwrap().is_none());
    assert!(directory.remove_phone(&phone.id).await.is_err());
    assert!(library
        .lending()
        .reader_history(&reader.id)
        .await
        .unwrap()
        .is_empty());
    assert!(directory.delete_reader(&reader.id).await.is_err());
}

#[tokio::test]
async fn updating_contacts() {
    let library = library().await;
    let directory = library.readers();

    let mut reader = directory.register_reader(john()).await.unwrap();
    reader.email = " john.johnson@email.com ".into();
    let reader = directory.update_reader(reader).await.unwrap();
    assert_eq!(reader.email, "john.johnson@email.com");

    let mut phone = directory.add_phone(&reader.id, "+380000000").await.unwrap();
    phone.phone = "+380111111".into();
    directory.update_phone(phone.clone()).await.unwrap();

    let mut address = directory.add_address(address_for(&reader.id)).await.unwrap();
    address.room = Some("12".into());
    directory.update_address(address.clone()).await.unwrap();

    let profile = directory.reader_profile(&reader.id).await.unwrap();
    assert_eq!(profile.phones[0].phone, "+380111111");
    assert_eq!(profile.address.and_then(|a| a.room).as_deref(), Some("12"));

    directory.remove_address(&address.id).await.unwrap();
    assert!(directory
        .reader_profile(&reader.id)
        .await
        .unwrap()
        .address
        .is_none());
    assert_eq!(
        directory.list_readers(PageRequest::default()).await.unwrap().total,
        1
    );
    assert_eq!(directory.get_reader(&reader.id).await.unwrap().id, reader.id);
}
