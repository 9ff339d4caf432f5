pub mod catalog_repository;
pub mod error;
pub mod rental_ledger;

pub use catalog_repository::CatalogRepository;
pub use error::RepositoryError;
pub use rental_ledger::RentalLedger;
