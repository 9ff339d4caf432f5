use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::library::CommandOutcome;
use crate::domain::{
    Book, LibraryBook, Rental,
    commands::{AddBook, UpdateBook},
};

/// 書籍登録リクエスト（POST /books）
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl AddBookRequest {
    pub fn to_command(&self, now: DateTime<Utc>) -> AddBook {
        AddBook {
            isbn: self.isbn.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            published_at: self.published_at.unwrap_or(now),
        }
    }
}

/// 書籍更新リクエスト（PUT /books/:isbn）
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl UpdateBookRequest {
    pub fn to_command(&self, isbn: String) -> UpdateBook {
        UpdateBook {
            isbn,
            title: self.title.clone(),
            author: self.author.clone(),
        }
    }
}

/// 貸出・返却リクエスト（POST /books/:isbn/borrow, /books/:isbn/return）
#[derive(Debug, Deserialize)]
pub struct RentalRequest {
    pub user_id: String,
}

/// 汎用コマンドリクエスト（POST /commands）
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    /// 種別名。未知の値はハンドラーでINVALID_COMMANDとして返す
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            isbn: book.isbn.to_string(),
            title: book.title,
            author: book.author,
            published_at: book.published_at,
        }
    }
}

/// 貸出状況付き書籍レスポンス（GET /books/:isbn）
#[derive(Debug, Serialize, Deserialize)]
pub struct LibraryBookResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub is_available: bool,
    pub current_borrower: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub days_until_due: i64,
}

impl LibraryBookResponse {
    pub fn new(view: LibraryBook, now: DateTime<Utc>) -> Self {
        let days_until_due = view.days_until_due(now);
        Self {
            book: BookResponse::from(view.book),
            is_available: view.is_available,
            current_borrower: view.current_borrower.map(|u| u.to_string()),
            due_date: view.due_date,
            is_overdue: view.is_overdue,
            days_until_due,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RentalResponse {
    pub rental_id: Uuid,
    pub book_id: String,
    pub user_id: String,
    pub borrowed_at: DateTime<Utc>,
    pub return_deadline: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_overdue: bool,
    pub days_until_due: i64,
}

impl RentalResponse {
    pub fn new(rental: Rental, now: DateTime<Utc>) -> Self {
        Self {
            is_overdue: rental.is_overdue(now),
            days_until_due: rental.days_until_due(now),
            rental_id: rental.rental_id.value(),
            book_id: rental.book_id.to_string(),
            user_id: rental.user_id.to_string(),
            borrowed_at: rental.borrowed_at,
            return_deadline: rental.return_deadline,
            returned_at: rental.returned_at,
        }
    }
}

/// 汎用コマンドのレスポンス
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResponse {
    Book(BookResponse),
    Deleted { isbn: String },
    Rental(RentalResponse),
}

impl CommandResponse {
    pub fn new(outcome: CommandOutcome, now: DateTime<Utc>) -> Self {
        match outcome {
            CommandOutcome::Book(book) => CommandResponse::Book(book.into()),
            CommandOutcome::Deleted(isbn) => CommandResponse::Deleted {
                isbn: isbn.to_string(),
            },
            CommandOutcome::Rental(rental) => CommandResponse::Rental(RentalResponse::new(rental, now)),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
