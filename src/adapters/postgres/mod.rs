pub mod catalog_repository;
pub mod rental_ledger;

// パブリックに型を再エクスポート
pub use catalog_repository::CatalogRepository as PostgresCatalogRepository;
pub use rental_ledger::RentalLedger as PostgresRentalLedger;
