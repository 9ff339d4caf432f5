use crate::domain::{Isbn, UserId};
use crate::ports::{CatalogRepository, RentalLedger};
use std::sync::Arc;

use super::errors::{LibraryError, Result};

/// サービスの依存関係
///
/// リポジトリは起動時に一度だけ生成し、すべてのハンドラーへ注入する。
/// プロセス全体のグローバル状態は持たない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog: Arc<dyn CatalogRepository>,
    pub ledger: Arc<dyn RentalLedger>,
}

/// 必須のISBN入力を検証・正規化する
///
/// 空（空白のみ含む）の場合は`field`名付きのValidationエラー。
pub(super) fn require_isbn(raw: &str, field: &str) -> Result<Isbn> {
    if raw.trim().is_empty() {
        return Err(LibraryError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(Isbn::parse(raw)?)
}

/// 必須の利用者IDを検証する
pub(super) fn require_user_id(raw: &str) -> Result<UserId> {
    UserId::parse(raw).ok_or_else(|| LibraryError::Validation("user ID cannot be empty".to_string()))
}
