use crate::domain::{self, Rental, RentalError, commands::*};
use crate::ports::RepositoryError;

use super::errors::{LibraryError, Result};
use super::service::{ServiceDependencies, require_isbn, require_user_id};

/// 書籍を借りる
///
/// ビジネスルール：
/// - 書籍がカタログに存在すること
/// - 他の利用者が借りていないこと
/// - 本人が既に借りていないこと
/// - 返却期限は貸出から14日後
///
/// 貸出中の記録の確認と追加は台帳の`save_rental`で不可分に行う。
/// 同時に借りようとした場合は1件だけ成功し、残りはConflictになる。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<Rental> {
    let book_id = require_isbn(&cmd.book_id, "book ID")?;
    let user_id = require_user_id(&cmd.user_id)?;

    // 1. カタログに書籍が存在するか
    if !deps.catalog.exists(&book_id).await? {
        return Err(LibraryError::NotFound(format!(
            "book with ISBN {} not found",
            book_id
        )));
    }

    // 2. 貸出を生成（返却期限は14日後）
    let rental = Rental::open(book_id, user_id, cmd.borrowed_at);

    // 3. 貸出中の記録がなければ追加（不可分）
    //    既存の貸出があれば、誰が借りているかで拒否理由を決める
    match deps.ledger.save_rental(rental.clone()).await {
        Ok(()) => Ok(rental),
        Err(RepositoryError::ActiveRentalExists(active)) => {
            Err(domain::rental::borrow_conflict(&active, &rental.user_id).into())
        }
        Err(RepositoryError::AlreadyExists) => Err(RentalError::AlreadyBorrowed.into()),
        Err(e) => Err(e.into()),
    }
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 呼び出した利用者の貸出中の記録が存在すること
/// - 延滞していても返却は受け付ける
///
/// 返却後、書籍は再び貸出可能になる。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Rental> {
    let book_id = require_isbn(&cmd.book_id, "book ID")?;
    let user_id = require_user_id(&cmd.user_id)?;

    match deps
        .ledger
        .mark_returned(&book_id, &user_id, cmd.returned_at)
        .await
    {
        Ok(rental) => Ok(rental),
        Err(RepositoryError::NotFound) => Err(LibraryError::NotFound(format!(
            "no active rental of book {} for user {}",
            book_id, user_id
        ))),
        Err(e) => Err(e.into()),
    }
}
