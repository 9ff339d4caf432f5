use chrono::{DateTime, Utc};

use crate::domain::{Book, LibraryBook, Rental};
use crate::ports::RepositoryError;

use super::errors::{LibraryError, Result};
use super::service::{ServiceDependencies, require_isbn, require_user_id};

/// ISBNで書籍を取得する
pub async fn get_book(deps: &ServiceDependencies, isbn: &str) -> Result<Book> {
    let isbn = require_isbn(isbn, "ISBN")?;

    match deps.catalog.find_by_isbn(&isbn).await {
        Ok(book) => Ok(book),
        Err(RepositoryError::NotFound) => Err(LibraryError::NotFound(format!(
            "book with ISBN {} not found",
            isbn
        ))),
        Err(e) => Err(e.into()),
    }
}

/// 全書籍をISBN順に取得する
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    Ok(deps.catalog.find_all().await?)
}

/// 書籍を貸出状況付きで取得する
pub async fn get_library_book(
    deps: &ServiceDependencies,
    isbn: &str,
    now: DateTime<Utc>,
) -> Result<LibraryBook> {
    let book = get_book(deps, isbn).await?;
    let active = deps
        .ledger
        .find_active_rental_by_book_id(&book.isbn)
        .await?;

    Ok(LibraryBook::new(book, active.as_ref(), now))
}

/// 利用者の貸出履歴
pub async fn list_user_rentals(deps: &ServiceDependencies, user_id: &str) -> Result<Vec<Rental>> {
    let user_id = require_user_id(user_id)?;
    Ok(deps.ledger.find_rentals_by_user(&user_id).await?)
}

/// 書籍の貸出履歴（カタログから削除済みの書籍も対象）
pub async fn list_book_rentals(deps: &ServiceDependencies, book_id: &str) -> Result<Vec<Rental>> {
    let book_id = require_isbn(book_id, "book ID")?;
    Ok(deps.ledger.find_rentals_by_book_id(&book_id).await?)
}

/// `now`時点で延滞している貸出
pub async fn find_overdue_rentals(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<Vec<Rental>> {
    Ok(deps.ledger.find_overdue_rentals(now).await?)
}
