use crate::application::library::{
    self, CommandBus, ServiceDependencies, add_book as execute_add_book,
    borrow_book as execute_borrow_book, delete_book as execute_delete_book,
    return_book as execute_return_book, update_book as execute_update_book,
};
use crate::domain::commands::{BorrowBook, DeleteBook, ReturnBook};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        AddBookRequest, BookResponse, CommandResponse, DispatchRequest, LibraryBookResponse,
        RentalRequest, RentalResponse, UpdateBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub command_bus: CommandBus,
}

impl AppState {
    /// 5種類のハンドラーを登録したディスパッチャー付きで作成
    pub fn new(service_deps: ServiceDependencies) -> Self {
        let command_bus = CommandBus::with_default_handlers(service_deps.clone());
        Self {
            service_deps,
            command_bus,
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /books - 書籍を登録
///
/// 強制されるビジネスルール:
/// - タイトル・著者・ISBNが空でないこと
/// - ISBNのチェックディジットが正しいこと
/// - 同じISBNの書籍が存在しないこと
pub async fn add_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = execute_add_book(&state.service_deps, req.to_command(Utc::now())).await?;

    tracing::info!(isbn = %book.isbn, "book added");
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// PUT /books/:isbn - タイトル・著者を更新
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_update_book(&state.service_deps, req.to_command(isbn)).await?;

    Ok(Json(book.into()))
}

/// DELETE /books/:isbn - 書籍を削除
///
/// 貸出履歴は残る。
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<StatusCode, ApiError> {
    let isbn = execute_delete_book(&state.service_deps, DeleteBook { isbn }).await?;

    tracing::info!(%isbn, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /books/:isbn/borrow - 書籍を借りる
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 他の利用者が借りていないこと
/// - 本人が既に借りていないこと
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
    Json(req): Json<RentalRequest>,
) -> Result<(StatusCode, Json<RentalResponse>), ApiError> {
    let now = Utc::now();
    let cmd = BorrowBook {
        book_id: isbn,
        user_id: req.user_id,
        borrowed_at: now,
    };

    let rental = execute_borrow_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(RentalResponse::new(rental, now))))
}

/// POST /books/:isbn/return - 書籍を返却
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
    Json(req): Json<RentalRequest>,
) -> Result<Json<RentalResponse>, ApiError> {
    let now = Utc::now();
    let cmd = ReturnBook {
        book_id: isbn,
        user_id: req.user_id,
        returned_at: now,
    };

    let rental = execute_return_book(&state.service_deps, cmd).await?;

    Ok(Json(RentalResponse::new(rental, now)))
}

/// POST /commands - 種別とペイロードを受け取り、ディスパッチャーに渡す
pub async fn dispatch_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let outcome = state
        .command_bus
        .dispatch_named(&req.kind, req.payload)
        .await?;

    Ok(Json(CommandResponse::new(outcome, Utc::now())))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books - 全書籍をISBN順に取得
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = library::list_books(&state.service_deps).await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/:isbn - 書籍を貸出状況付きで取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<LibraryBookResponse>, ApiError> {
    let now = Utc::now();
    let view = library::get_library_book(&state.service_deps, &isbn, now).await?;

    Ok(Json(LibraryBookResponse::new(view, now)))
}

/// GET /books/:isbn/rentals - 書籍の貸出履歴
pub async fn list_book_rentals(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<Vec<RentalResponse>>, ApiError> {
    let now = Utc::now();
    let rentals = library::list_book_rentals(&state.service_deps, &isbn).await?;

    Ok(Json(
        rentals
            .into_iter()
            .map(|r| RentalResponse::new(r, now))
            .collect(),
    ))
}

/// GET /users/:user_id/rentals - 利用者の貸出履歴
pub async fn list_user_rentals(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<RentalResponse>>, ApiError> {
    let now = Utc::now();
    let rentals = library::list_user_rentals(&state.service_deps, &user_id).await?;

    Ok(Json(
        rentals
            .into_iter()
            .map(|r| RentalResponse::new(r, now))
            .collect(),
    ))
}

/// GET /rentals/overdue - 延滞中の貸出
pub async fn list_overdue_rentals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RentalResponse>>, ApiError> {
    let now = Utc::now();
    let rentals = library::find_overdue_rentals(&state.service_deps, now).await?;

    Ok(Json(
        rentals
            .into_iter()
            .map(|r| RentalResponse::new(r, now))
            .collect(),
    ))
}
