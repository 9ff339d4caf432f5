use crate::domain::{Isbn, Rental, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use super::error::Result;

/// 貸出台帳ポート
///
/// 貸出記録は追記のみ。返却時の`returned_at`設定以外の変更・削除はない。
///
/// 不変条件：
/// - 1冊の書籍につき貸出中の記録は高々1件
#[async_trait]
pub trait RentalLedger: Send + Sync {
    /// 新しい貸出を保存する
    ///
    /// 同じ書籍の貸出中の記録の確認と追加を不可分に行う。
    /// 既に貸出中の記録がある場合は`RepositoryError::ActiveRentalExists`を返し、
    /// 何も追加しない。競合相手を特定できない場合は`RepositoryError::AlreadyExists`。
    async fn save_rental(&self, rental: Rental) -> Result<()>;

    /// 書籍の貸出中の記録を取得する
    async fn find_active_rental_by_book_id(&self, book_id: &Isbn) -> Result<Option<Rental>>;

    /// 利用者の全貸出（返却済みを含む）を貸出日時順に取得する
    async fn find_rentals_by_user(&self, user_id: &UserId) -> Result<Vec<Rental>>;

    /// 書籍の全貸出履歴を貸出日時順に取得する
    ///
    /// 書籍がカタログから削除されていても履歴は残る。
    async fn find_rentals_by_book_id(&self, book_id: &Isbn) -> Result<Vec<Rental>>;

    /// `now`時点で延滞している貸出を返却期限順に取得する
    async fn find_overdue_rentals(&self, now: DateTime<Utc>) -> Result<Vec<Rental>>;

    /// 利用者の貸出中の記録を返却済みにする
    ///
    /// 該当記録の検索と更新を不可分に行う。
    /// 該当する貸出中の記録がなければ`RepositoryError::NotFound`。
    async fn mark_returned(
        &self,
        book_id: &Isbn,
        user_id: &UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Rental>;
}
