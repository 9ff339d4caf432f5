use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Isbn, RentalError, RentalId, UserId};

/// 貸出期間（日数）
pub const RENTAL_PERIOD_DAYS: i64 = 14;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// 貸出 - 1冊の書籍の1回の貸出
///
/// 台帳は追記のみ。`returned_at`の設定が唯一の変更で、削除はしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rental {
    pub rental_id: RentalId,

    // 書籍への参照（ISBN）。外部キー制約はない
    pub book_id: Isbn,
    pub user_id: UserId,

    pub borrowed_at: DateTime<Utc>,
    pub return_deadline: DateTime<Utc>,
    /// `None`なら貸出中
    pub returned_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// 新しい貸出を開始する（返却期限は14日後）
    pub fn open(book_id: Isbn, user_id: UserId, borrowed_at: DateTime<Utc>) -> Self {
        Self {
            rental_id: RentalId::new(),
            book_id,
            user_id,
            borrowed_at,
            return_deadline: borrowed_at + Duration::days(RENTAL_PERIOD_DAYS),
            returned_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    /// 延滞判定：貸出中かつ返却期限を過ぎている
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.return_deadline
    }

    /// 返却期限までの日数（切り捨て）。延滞中は負、返却済みは0
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        if self.is_returned() {
            return 0;
        }
        whole_days_until(self.return_deadline, now)
    }
}

/// `deadline - now`を日単位で床関数丸めする
pub(crate) fn whole_days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// 純粋関数：貸出中の記録に対して、新しい貸出が拒否される理由を決める
///
/// ビジネスルール：
/// - 本人が借りている場合は「既に借りている」
/// - 他人が借りている場合は「他の人が借りている」
pub fn borrow_conflict(active: &Rental, user_id: &UserId) -> RentalError {
    if &active.user_id == user_id {
        RentalError::AlreadyHeldByUser
    } else {
        RentalError::AlreadyBorrowed
    }
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 延滞していても返却は受け付ける
/// - 返却済みの貸出は再度返却できない
pub fn return_book(rental: &Rental, returned_at: DateTime<Utc>) -> Result<Rental, RentalError> {
    if rental.is_returned() {
        return Err(RentalError::AlreadyReturned);
    }

    Ok(Rental {
        returned_at: Some(returned_at),
        ..rental.clone()
    })
}
