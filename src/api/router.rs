use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, add_book, borrow_book, delete_book, dispatch_command, get_book,
    list_book_rentals, list_books, list_overdue_rentals, list_user_rentals, return_book,
    update_book,
};

/// Creates the API router with all catalog and rental endpoints
///
/// Command endpoints (Write operations):
/// - POST /books - Add a book
/// - PUT /books/:isbn - Update title/author
/// - DELETE /books/:isbn - Delete a book
/// - POST /books/:isbn/borrow - Borrow a book
/// - POST /books/:isbn/return - Return a book
/// - POST /commands - Dispatch a command by kind
///
/// Query endpoints (Read operations):
/// - GET /books - List books
/// - GET /books/:isbn - Book with availability
/// - GET /books/:isbn/rentals - Rental history of a book
/// - GET /users/:user_id/rentals - Rental history of a user
/// - GET /rentals/overdue - Overdue rentals
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/books", post(add_book).get(list_books))
        .route(
            "/books/:isbn",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:isbn/borrow", post(borrow_book))
        .route("/books/:isbn/return", post(return_book))
        .route("/books/:isbn/rentals", get(list_book_rentals))
        .route("/users/:user_id/rentals", get(list_user_rentals))
        .route("/rentals/overdue", get(list_overdue_rentals))
        .route("/commands", post(dispatch_command))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
