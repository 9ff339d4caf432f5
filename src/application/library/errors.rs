use thiserror::Error;

use crate::domain::{
    BookError, IsbnError, RentalError,
    commands::{CommandKind, UnknownCommandKind},
};
use crate::ports::RepositoryError;

/// 蔵書・貸出アプリケーション層のエラー
///
/// 呼び出し側（HTTPアダプター等）がメッセージ文字列を解析せずに
/// 応答を選べるよう、失敗の種類ごとに区別する。
#[derive(Debug, Error)]
pub enum LibraryError {
    /// 入力の不足・形式不正
    #[error("{0}")]
    Validation(String),

    /// 書籍または貸出中の記録が存在しない
    #[error("{0}")]
    NotFound(String),

    /// 一意性・排他性の違反
    #[error("{0}")]
    Conflict(String),

    /// 宣言された種別とペイロードが一致しない
    #[error("invalid {kind} command: {reason}")]
    InvalidCommand { kind: CommandKind, reason: String },

    /// 種別名がどのコマンドにも一致しない
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommandKind),

    /// ディスパッチャーにハンドラーが登録されていない
    #[error("no handler registered for {0} command")]
    HandlerNotFound(CommandKind),

    /// リポジトリのエラー（変換せずにそのまま渡す）
    #[error("repository error")]
    Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<IsbnError> for LibraryError {
    fn from(err: IsbnError) -> Self {
        LibraryError::Validation(err.to_string())
    }
}

impl From<BookError> for LibraryError {
    fn from(err: BookError) -> Self {
        LibraryError::Validation(err.to_string())
    }
}

impl From<RentalError> for LibraryError {
    fn from(err: RentalError) -> Self {
        match err {
            RentalError::AlreadyBorrowed | RentalError::AlreadyHeldByUser => {
                LibraryError::Conflict(err.to_string())
            }
            RentalError::AlreadyReturned => LibraryError::NotFound(err.to_string()),
        }
    }
}

/// 文脈に依存しない変換
///
/// `NotFound`など意味が文脈で変わるものは、各サービスで個別にメッセージを付けて変換する。
impl From<RepositoryError> for LibraryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => LibraryError::NotFound("record not found".to_string()),
            RepositoryError::AlreadyExists => {
                LibraryError::Conflict("record already exists".to_string())
            }
            RepositoryError::ActiveRentalExists(_) => {
                LibraryError::Conflict(RentalError::AlreadyBorrowed.to_string())
            }
            RepositoryError::Storage(e) => LibraryError::Repository(e),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryError>;
