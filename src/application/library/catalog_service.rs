use crate::domain::{self, Book, BookPatch, Isbn, commands::*};
use crate::ports::RepositoryError;

use super::errors::{LibraryError, Result};
use super::service::{ServiceDependencies, require_isbn};

fn book_not_found(isbn: &Isbn) -> LibraryError {
    LibraryError::NotFound(format!("book with ISBN {} not found", isbn))
}

/// 書籍を登録する
///
/// ビジネスルール：
/// - タイトル・著者・ISBNは必須（タイトル・著者は255文字以内）
/// - ISBNはチェックディジットまで検証し、正規化した値を同一性に使う
/// - 同じISBNの書籍は登録できない
///
/// 存在確認と追加はリポジトリの`insert_if_absent`で不可分に行う。
/// 競合に負けた場合も再試行はせず、Conflictを返す。
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    // 1. 構造バリデーション（リポジトリに触れる前）
    if cmd.title.trim().is_empty() {
        return Err(domain::BookError::EmptyTitle.into());
    }
    if cmd.author.trim().is_empty() {
        return Err(domain::BookError::EmptyAuthor.into());
    }
    let isbn = require_isbn(&cmd.isbn, "ISBN")?;

    // 2. ドメイン層の純粋関数で書籍を生成
    let book = domain::book::new_book(isbn, &cmd.title, &cmd.author, cmd.published_at)?;

    // 3. 存在しなければ追加
    match deps.catalog.insert_if_absent(book.clone()).await {
        Ok(()) => Ok(book),
        Err(RepositoryError::AlreadyExists) => Err(LibraryError::Conflict(format!(
            "book with ISBN {} already exists",
            book.isbn
        ))),
        Err(e) => Err(e.into()),
    }
}

/// 書籍のタイトル・著者を更新する
///
/// ビジネスルール：
/// - ISBNは必須（同一性のため変更不可）
/// - タイトル・著者の少なくとも一方が必要（255文字以内）
/// - 指定されたフィールドのみ上書きする
///
/// 検索と書き込みはリポジトリの`update_if_present`で不可分に行う。
/// 同時に削除された書籍は復活せず、NotFoundになる。
pub async fn update_book(deps: &ServiceDependencies, cmd: UpdateBook) -> Result<Book> {
    // 1. 構造バリデーション
    let isbn = require_isbn(&cmd.isbn, "book ISBN")?;
    let patch = BookPatch::new(cmd.title.as_deref(), cmd.author.as_deref())?;

    // 2. 存在すれば更新
    match deps.catalog.update_if_present(&isbn, &patch).await {
        Ok(book) => Ok(book),
        Err(RepositoryError::NotFound) => Err(book_not_found(&isbn)),
        Err(e) => Err(e.into()),
    }
}

/// 書籍を削除する
///
/// 貸出履歴は削除しない（台帳は追記のみで、カタログより長く残る）。
pub async fn delete_book(deps: &ServiceDependencies, cmd: DeleteBook) -> Result<Isbn> {
    let isbn = require_isbn(&cmd.isbn, "book ISBN")?;

    match deps.catalog.delete(&isbn).await {
        Ok(()) => Ok(isbn),
        Err(RepositoryError::NotFound) => Err(book_not_found(&isbn)),
        Err(e) => Err(e.into()),
    }
}
