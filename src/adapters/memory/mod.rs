pub mod catalog_repository;
pub mod rental_ledger;

use crate::ports::RepositoryError;

pub use catalog_repository::CatalogRepository as InMemoryCatalogRepository;
pub use rental_ledger::RentalLedger as InMemoryRentalLedger;

/// ロックのポイズン（書き込み中に他スレッドがpanicした）をStorageエラーにする
fn poisoned<T>(err: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Storage(err.to_string().into())
}
