pub mod book;
pub mod commands;
pub mod errors;
pub mod isbn;
pub mod rental;
pub mod value_objects;

pub use book::{Book, BookPatch, LibraryBook};
pub use errors::*;
pub use isbn::Isbn;
pub use rental::Rental;
pub use value_objects::*;
