use book_lending::adapters::postgres::{PostgresCatalogRepository, PostgresRentalLedger};
use book_lending::application::library::{LibraryError, ServiceDependencies, borrow_book};
use book_lending::domain::book::new_book;
use book_lending::domain::commands::BorrowBook;
use book_lending::domain::{Book, BookPatch, Isbn, Rental, UserId};
use book_lending::ports::{CatalogRepository, RentalLedger, RepositoryError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;
use serial_test::serial;
use std::sync::Arc;

mod common;

// PostgreSQLが必要なテストは`cargo test -- --ignored`で実行する

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, day, 10, 0, 0).unwrap()
}

fn isbn(raw: &str) -> Isbn {
    Isbn::parse(raw).unwrap()
}

fn user(raw: &str) -> UserId {
    UserId::parse(raw).unwrap()
}

fn book(raw: &str, title: &str) -> Book {
    new_book(isbn(raw), title, "Author", at(1)).unwrap()
}

// ============================================================================
// CatalogRepository
// ============================================================================

#[tokio::test]
#[ignore]
#[serial]
async fn test_catalog_insert_if_absent_rejects_duplicate() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let catalog = PostgresCatalogRepository::new(pool.clone());

    catalog
        .insert_if_absent(book("9783161484100", "Title A"))
        .await
        .unwrap();
    let result = catalog
        .insert_if_absent(book("9783161484100", "Title B"))
        .await;

    assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
    let stored = catalog.find_by_isbn(&isbn("9783161484100")).await.unwrap();
    assert_eq!(stored.title, "Title A");
    assert_eq!(stored.published_at, at(1));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_catalog_save_find_all_and_delete() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let catalog = PostgresCatalogRepository::new(pool.clone());

    catalog.save(book("9783161484100", "Title A")).await.unwrap();
    catalog.save(book("0306406152", "Title B")).await.unwrap();
    catalog.save(book("0306406152", "Title C")).await.unwrap();

    let all = catalog.find_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].isbn.as_str(), "0306406152");
    assert_eq!(all[0].title, "Title C");

    assert!(catalog.exists(&isbn("0306406152")).await.unwrap());
    catalog.delete(&isbn("0306406152")).await.unwrap();
    assert!(!catalog.exists(&isbn("0306406152")).await.unwrap());

    let result = catalog.delete(&isbn("0306406152")).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
    let result = catalog.find_by_isbn(&isbn("0306406152")).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_catalog_update_if_present_applies_patch_in_place() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let catalog = PostgresCatalogRepository::new(pool.clone());
    catalog.save(book("9783161484100", "Title A")).await.unwrap();

    let patch = BookPatch::new(None, Some("Author B")).unwrap();
    let updated = catalog
        .update_if_present(&isbn("9783161484100"), &patch)
        .await
        .unwrap();
    assert_eq!(updated.title, "Title A");
    assert_eq!(updated.author, "Author B");
    assert_eq!(updated.published_at, at(1));

    // 存在しない書籍は作成されない
    let result = catalog
        .update_if_present(&isbn("0306406152"), &patch)
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
    assert!(!catalog.exists(&isbn("0306406152")).await.unwrap());
}

// ============================================================================
// RentalLedger
// ============================================================================

#[tokio::test]
#[ignore]
#[serial]
async fn test_ledger_rejects_second_active_rental() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let ledger = PostgresRentalLedger::new(pool.clone());

    let first = Rental::open(isbn("9783161484100"), user("u1"), at(1));
    ledger.save_rental(first.clone()).await.unwrap();

    let second = Rental::open(isbn("9783161484100"), user("u2"), at(2));
    match ledger.save_rental(second).await {
        Err(RepositoryError::ActiveRentalExists(active)) => {
            assert_eq!(active.rental_id, first.rental_id);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let active = ledger
        .find_active_rental_by_book_id(&isbn("9783161484100"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active, first);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_ledger_mark_returned_and_history() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let ledger = PostgresRentalLedger::new(pool.clone());

    let rental = Rental::open(isbn("9783161484100"), user("u1"), at(1));
    ledger.save_rental(rental.clone()).await.unwrap();

    let result = ledger
        .mark_returned(&isbn("9783161484100"), &user("u2"), at(3))
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    let returned = ledger
        .mark_returned(&isbn("9783161484100"), &user("u1"), at(3))
        .await
        .unwrap();
    assert_eq!(returned.rental_id, rental.rental_id);
    assert_eq!(returned.returned_at, Some(at(3)));

    let result = ledger
        .mark_returned(&isbn("9783161484100"), &user("u1"), at(4))
        .await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));

    // 返却後は再び貸出できる
    ledger
        .save_rental(Rental::open(isbn("9783161484100"), user("u2"), at(5)))
        .await
        .unwrap();

    let history = ledger
        .find_rentals_by_book_id(&isbn("9783161484100"))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].user_id.as_str(), "u1");
    assert_eq!(history[1].user_id.as_str(), "u2");

    let by_user = ledger.find_rentals_by_user(&user("u1")).await.unwrap();
    assert_eq!(by_user.len(), 1);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_ledger_find_overdue_rentals() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let ledger = PostgresRentalLedger::new(pool.clone());

    let late = Rental::open(isbn("9783161484100"), user("u1"), at(1));
    let fresh = Rental::open(isbn("0306406152"), user("u2"), at(10));
    ledger.save_rental(late.clone()).await.unwrap();
    ledger.save_rental(fresh).await.unwrap();

    let now = at(1) + Duration::days(15);
    let overdue = ledger.find_overdue_rentals(now).await.unwrap();

    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].rental_id, late.rental_id);
}

// ============================================================================
// 同時実行
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn test_concurrent_borrows_against_postgres_have_one_winner() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;
    let deps = ServiceDependencies {
        catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
        ledger: Arc::new(PostgresRentalLedger::new(pool.clone())),
    };
    deps.catalog
        .insert_if_absent(book("9783161484100", "Title A"))
        .await
        .unwrap();

    let tasks = (0..16).map(|i| {
        let deps = deps.clone();
        tokio::spawn(async move {
            borrow_book(
                &deps,
                BorrowBook {
                    book_id: "9783161484100".to_string(),
                    user_id: format!("user-{}", i),
                    borrowed_at: Utc::now(),
                },
            )
            .await
        })
    });

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(LibraryError::Conflict(_))))
            .count(),
        15
    );

    let history = deps
        .ledger
        .find_rentals_by_book_id(&isbn("9783161484100"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
