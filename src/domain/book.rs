use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookError, Isbn, Rental, UserId};

/// 書籍 - カタログの1レコード
///
/// 同一性はISBNのみ。ISBNは作成後に変更できない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
}

/// タイトル・著者の最大文字数（文字単位で数える）
pub const MAX_FIELD_LENGTH: usize = 255;

fn check_title(title: &str) -> Result<(), BookError> {
    if title.chars().count() > MAX_FIELD_LENGTH {
        return Err(BookError::TitleTooLong {
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

fn check_author(author: &str) -> Result<(), BookError> {
    if author.chars().count() > MAX_FIELD_LENGTH {
        return Err(BookError::AuthorTooLong {
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}

/// 純粋関数：書籍を作成する
///
/// ビジネスルール：
/// - タイトル・著者は空白のみ不可
/// - タイトル・著者は255文字以内
/// - 前後の空白は除去して保存する
pub fn new_book(
    isbn: Isbn,
    title: &str,
    author: &str,
    published_at: DateTime<Utc>,
) -> Result<Book, BookError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BookError::EmptyTitle);
    }
    check_title(title)?;

    let author = author.trim();
    if author.is_empty() {
        return Err(BookError::EmptyAuthor);
    }
    check_author(author)?;

    Ok(Book {
        isbn,
        title: title.to_string(),
        author: author.to_string(),
        published_at,
    })
}

/// 検証済みの部分更新
///
/// 不変条件：
/// - `title`・`author`の少なくとも一方が`Some`
/// - 値は前後の空白を除去済みで、空ではなく、255文字以内
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookPatch {
    title: Option<String>,
    author: Option<String>,
}

impl BookPatch {
    /// 空文字列（空白のみ含む）は「指定なし」として扱う
    pub fn new(title: Option<&str>, author: Option<&str>) -> Result<Self, BookError> {
        let title = title.map(str::trim).filter(|t| !t.is_empty());
        let author = author.map(str::trim).filter(|a| !a.is_empty());

        if title.is_none() && author.is_none() {
            return Err(BookError::NothingToUpdate);
        }
        if let Some(title) = title {
            check_title(title)?;
        }
        if let Some(author) = author {
            check_author(author)?;
        }

        Ok(Self {
            title: title.map(str::to_string),
            author: author.map(str::to_string),
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

/// 純粋関数：書籍を部分更新する
///
/// 指定されたフィールドのみ上書きし、それ以外は保持する。ISBNは変更しない。
pub fn update_book(book: &Book, patch: &BookPatch) -> Book {
    Book {
        title: patch.title.clone().unwrap_or_else(|| book.title.clone()),
        author: patch.author.clone().unwrap_or_else(|| book.author.clone()),
        ..book.clone()
    }
}

/// 貸出状況付きの書籍ビュー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryBook {
    #[serde(flatten)]
    pub book: Book,
    pub is_available: bool,
    pub current_borrower: Option<UserId>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

impl LibraryBook {
    /// 書籍と現在の貸出（あれば）からビューを組み立てる
    pub fn new(book: Book, active_rental: Option<&Rental>, now: DateTime<Utc>) -> Self {
        match active_rental.filter(|r| r.is_active()) {
            Some(rental) => Self {
                book,
                is_available: false,
                current_borrower: Some(rental.user_id.clone()),
                due_date: Some(rental.return_deadline),
                is_overdue: rental.is_overdue(now),
            },
            None => Self {
                book,
                is_available: true,
                current_borrower: None,
                due_date: None,
                is_overdue: false,
            },
        }
    }

    /// 返却期限までの日数（貸出可能な場合は0）
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        match self.due_date {
            Some(due_date) if !self.is_available => super::rental::whole_days_until(due_date, now),
            _ => 0,
        }
    }
}
