use crate::domain::{Isbn, Rental, RentalId, UserId};
use crate::ports::RepositoryError;
use crate::ports::rental_ledger::{RentalLedger as RentalLedgerTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

const RENTAL_COLUMNS: &str =
    "rental_id, book_id, user_id, borrowed_at, return_deadline, returned_at";

/// PostgreSQLの行データをRentalに変換する
fn map_row_to_rental(row: &PgRow) -> Result<Rental> {
    let book_id: String = row.try_get("book_id").map_err(RepositoryError::storage)?;
    let book_id = Isbn::parse(&book_id).map_err(RepositoryError::storage)?;

    let user_id: String = row.try_get("user_id").map_err(RepositoryError::storage)?;
    let user_id = UserId::parse(&user_id).ok_or_else(|| {
        RepositoryError::storage(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "empty user_id in rentals row",
        ))
    })?;

    Ok(Rental {
        rental_id: RentalId::from_uuid(row.try_get("rental_id").map_err(RepositoryError::storage)?),
        book_id,
        user_id,
        borrowed_at: row.try_get("borrowed_at").map_err(RepositoryError::storage)?,
        return_deadline: row
            .try_get("return_deadline")
            .map_err(RepositoryError::storage)?,
        returned_at: row.try_get("returned_at").map_err(RepositoryError::storage)?,
    })
}

fn map_rows(rows: Vec<PgRow>) -> Result<Vec<Rental>> {
    rows.iter().map(map_row_to_rental).collect()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// RentalLedgerのPostgreSQL実装
///
/// 部分ユニークインデックス`rentals_one_active_per_book`
/// （`returned_at IS NULL`の行のみ対象）で「1冊につき貸出中は1件まで」を保証する。
pub struct RentalLedger {
    pool: PgPool,
}

impl RentalLedger {
    /// PostgreSQLコネクションプールから新しいRentalLedgerを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_active(&self, book_id: &Isbn) -> Result<Option<Rental>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM rentals WHERE book_id = $1 AND returned_at IS NULL",
            RENTAL_COLUMNS
        ))
        .bind(book_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        row.as_ref().map(map_row_to_rental).transpose()
    }
}

#[async_trait]
impl RentalLedgerTrait for RentalLedger {
    /// 貸出を追加する
    ///
    /// トランザクション内で貸出中の行を`FOR UPDATE`で確認してから追加する。
    /// 同時実行で確認をすり抜けた場合も部分ユニークインデックスで追加が失敗し、
    /// 勝った側の貸出を返す。
    async fn save_rental(&self, rental: Rental) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::storage)?;

        let active = sqlx::query(&format!(
            "SELECT {} FROM rentals WHERE book_id = $1 AND returned_at IS NULL FOR UPDATE",
            RENTAL_COLUMNS
        ))
        .bind(rental.book_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::storage)?;

        if let Some(row) = active {
            let active = map_row_to_rental(&row)?;
            return Err(RepositoryError::ActiveRentalExists(Box::new(active)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO rentals (
                rental_id,
                book_id,
                user_id,
                borrowed_at,
                return_deadline,
                returned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rental.rental_id.value())
        .bind(rental.book_id.as_str())
        .bind(rental.user_id.as_str())
        .bind(rental.borrowed_at)
        .bind(rental.return_deadline)
        .bind(rental.returned_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await.map_err(RepositoryError::storage)?;
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await.map_err(RepositoryError::storage)?;
                tracing::debug!(book_id = %rental.book_id, "lost race for active rental");
                match self.fetch_active(&rental.book_id).await? {
                    Some(active) => Err(RepositoryError::ActiveRentalExists(Box::new(active))),
                    // 勝った側が既に返却済み。再試行はせず競合として報告する
                    None => Err(RepositoryError::AlreadyExists),
                }
            }
            Err(e) => Err(RepositoryError::storage(e)),
        }
    }

    async fn find_active_rental_by_book_id(&self, book_id: &Isbn) -> Result<Option<Rental>> {
        self.fetch_active(book_id).await
    }

    async fn find_rentals_by_user(&self, user_id: &UserId) -> Result<Vec<Rental>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rentals WHERE user_id = $1 ORDER BY borrowed_at ASC",
            RENTAL_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        map_rows(rows)
    }

    async fn find_rentals_by_book_id(&self, book_id: &Isbn) -> Result<Vec<Rental>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rentals WHERE book_id = $1 ORDER BY borrowed_at ASC",
            RENTAL_COLUMNS
        ))
        .bind(book_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        map_rows(rows)
    }

    /// 部分インデックス`rentals_overdue`を使用する
    async fn find_overdue_rentals(&self, now: DateTime<Utc>) -> Result<Vec<Rental>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM rentals WHERE returned_at IS NULL AND return_deadline < $1 \
             ORDER BY return_deadline ASC",
            RENTAL_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        map_rows(rows)
    }

    /// 条件付きUPDATE 1文で検索と返却を不可分に行う
    async fn mark_returned(
        &self,
        book_id: &Isbn,
        user_id: &UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Rental> {
        let row = sqlx::query(&format!(
            "UPDATE rentals SET returned_at = $3 \
             WHERE book_id = $1 AND user_id = $2 AND returned_at IS NULL \
             RETURNING {}",
            RENTAL_COLUMNS
        ))
        .bind(book_id.as_str())
        .bind(user_id.as_str())
        .bind(returned_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        match row {
            Some(row) => map_row_to_rental(&row),
            None => Err(RepositoryError::NotFound),
        }
    }
}
