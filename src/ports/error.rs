use crate::domain::Rental;
use thiserror::Error;

/// リポジトリ・台帳アダプターのエラー
///
/// `NotFound`・`AlreadyExists`・`ActiveRentalExists`は契約上の結果で、
/// アプリケーション層が自身のエラー種別に変換する。`Storage`は不透明なまま渡す。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 対象のレコードが存在しない
    #[error("record not found")]
    NotFound,

    /// 同じキーのレコードが既に存在する
    #[error("record already exists")]
    AlreadyExists,

    /// 書籍に貸出中の記録がある（誰が借りているか判別できるよう記録を持つ）
    #[error("book {} already has an active rental", .0.book_id)]
    ActiveRentalExists(Box<Rental>),

    /// ストレージの障害（I/O・接続・デコード）
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RepositoryError::Storage(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
