use crate::domain::{self, Isbn, Rental, UserId};
use crate::ports::RepositoryError;
use crate::ports::rental_ledger::{RentalLedger as RentalLedgerTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::poisoned;

#[derive(Default)]
struct Ledger {
    /// 追記のみの履歴（追加順）
    rentals: Vec<Rental>,
    /// 書籍ごとの貸出中の記録の`rentals`内の位置
    active_by_book: HashMap<Isbn, usize>,
}

/// RentalLedgerのインメモリ実装
///
/// 1つのMutexで履歴と貸出中の索引の両方を守る。
/// `save_rental`の確認と追加、`mark_returned`の検索と更新はそれぞれ1つのクリティカルセクションで行う。
pub struct RentalLedger {
    ledger: Mutex<Ledger>,
}

impl RentalLedger {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// `filter`を満たす貸出を貸出日時順に返す
    fn collect_sorted<F>(&self, filter: F) -> Result<Vec<Rental>>
    where
        F: Fn(&Rental) -> bool,
    {
        let ledger = self.ledger.lock().map_err(poisoned)?;
        let mut rentals: Vec<Rental> = ledger
            .rentals
            .iter()
            .filter(|&r| filter(r))
            .cloned()
            .collect();
        rentals.sort_by_key(|r| r.borrowed_at);
        Ok(rentals)
    }
}

impl Default for RentalLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RentalLedgerTrait for RentalLedger {
    async fn save_rental(&self, rental: Rental) -> Result<()> {
        let mut ledger = self.ledger.lock().map_err(poisoned)?;

        if let Some(&index) = ledger.active_by_book.get(&rental.book_id) {
            let active = ledger.rentals[index].clone();
            return Err(RepositoryError::ActiveRentalExists(Box::new(active)));
        }

        let index = ledger.rentals.len();
        if rental.is_active() {
            ledger.active_by_book.insert(rental.book_id.clone(), index);
        }
        ledger.rentals.push(rental);
        Ok(())
    }

    async fn find_active_rental_by_book_id(&self, book_id: &Isbn) -> Result<Option<Rental>> {
        let ledger = self.ledger.lock().map_err(poisoned)?;
        Ok(ledger
            .active_by_book
            .get(book_id)
            .map(|&index| ledger.rentals[index].clone()))
    }

    async fn find_rentals_by_user(&self, user_id: &UserId) -> Result<Vec<Rental>> {
        self.collect_sorted(|r| &r.user_id == user_id)
    }

    async fn find_rentals_by_book_id(&self, book_id: &Isbn) -> Result<Vec<Rental>> {
        self.collect_sorted(|r| &r.book_id == book_id)
    }

    async fn find_overdue_rentals(&self, now: DateTime<Utc>) -> Result<Vec<Rental>> {
        let mut overdue = self.collect_sorted(|r| r.is_overdue(now))?;
        overdue.sort_by_key(|r| r.return_deadline);
        Ok(overdue)
    }

    async fn mark_returned(
        &self,
        book_id: &Isbn,
        user_id: &UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Rental> {
        let mut ledger = self.ledger.lock().map_err(poisoned)?;

        let index = match ledger.active_by_book.get(book_id) {
            Some(&index) if &ledger.rentals[index].user_id == user_id => index,
            _ => return Err(RepositoryError::NotFound),
        };

        let returned = domain::rental::return_book(&ledger.rentals[index], returned_at)
            .map_err(|_| RepositoryError::NotFound)?;

        ledger.rentals[index] = returned.clone();
        ledger.active_by_book.remove(book_id);
        Ok(returned)
    }
}
