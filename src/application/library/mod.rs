mod catalog_service;
mod dispatcher;
mod errors;
mod queries;
mod rental_service;
mod service;

pub use catalog_service::{add_book, delete_book, update_book};
pub use dispatcher::{
    AddBookHandler, BorrowBookHandler, CommandBus, CommandHandler, CommandOutcome,
    DeleteBookHandler, ReturnBookHandler, UpdateBookHandler,
};
pub use errors::{LibraryError, Result};
pub use queries::{
    find_overdue_rentals, get_book, get_library_book, list_book_rentals, list_books,
    list_user_rentals,
};
pub use rental_service::{borrow_book, return_book};
pub use service::ServiceDependencies;
