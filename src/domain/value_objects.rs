use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 貸出ID - 貸出履歴の1行を識別する
///
/// 書籍の同一性はISBNのみで表し、この値は貸出記録の監査用にのみ使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RentalId(Uuid);

impl RentalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for RentalId {
    fn default() -> Self {
        Self::new()
    }
}

/// 利用者ID - 利用者管理は外部にあり、ここでは不透明な文字列として扱う
///
/// 不変条件：空文字列ではない（前後の空白は除去済み）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// 空白のみの場合は`None`
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
