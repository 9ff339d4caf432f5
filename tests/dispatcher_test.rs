use async_trait::async_trait;
use book_lending::application::library::{
    AddBookHandler, CommandBus, CommandHandler, CommandOutcome, LibraryError, get_book,
    list_book_rentals,
};
use book_lending::domain::commands::*;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

mod common;

const ISBN: &str = "9783161484100";

fn add_command() -> Command {
    AddBook {
        isbn: ISBN.to_string(),
        title: "Title A".to_string(),
        author: "Author A".to_string(),
        published_at: Utc::now(),
    }
    .into()
}

#[tokio::test]
async fn test_dispatch_all_command_kinds() {
    let deps = common::in_memory_deps();
    let bus = CommandBus::with_default_handlers(deps.clone());

    for kind in CommandKind::ALL {
        assert!(bus.has_handler(kind), "{} should be registered", kind);
    }

    let outcome = bus.dispatch(add_command()).await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Book(ref book) if book.title == "Title A"));

    let outcome = bus
        .dispatch(
            UpdateBook {
                isbn: ISBN.to_string(),
                title: None,
                author: Some("Author B".to_string()),
            }
            .into(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Book(ref book) if book.author == "Author B"));

    let outcome = bus
        .dispatch(
            BorrowBook {
                book_id: ISBN.to_string(),
                user_id: "u1".to_string(),
                borrowed_at: Utc::now(),
            }
            .into(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Rental(ref r) if r.is_active()));

    let outcome = bus
        .dispatch(
            ReturnBook {
                book_id: ISBN.to_string(),
                user_id: "u1".to_string(),
                returned_at: Utc::now(),
            }
            .into(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Rental(ref r) if r.is_returned()));

    let outcome = bus
        .dispatch(
            DeleteBook {
                isbn: ISBN.to_string(),
            }
            .into(),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Deleted(ref isbn) if isbn.as_str() == ISBN));

    assert!(matches!(
        get_book(&deps, ISBN).await,
        Err(LibraryError::NotFound(_))
    ));
    assert_eq!(list_book_rentals(&deps, ISBN).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dispatch_without_handler_fails() {
    let bus = CommandBus::new();

    let result = bus.dispatch(add_command()).await;

    assert!(matches!(
        result,
        Err(LibraryError::HandlerNotFound(CommandKind::AddBook))
    ));
}

#[tokio::test]
async fn test_dispatch_payload_decodes_by_kind() {
    let deps = common::in_memory_deps();
    let bus = CommandBus::with_default_handlers(deps.clone());

    let outcome = bus
        .dispatch_payload(
            CommandKind::AddBook,
            json!({ "isbn": "978-3-16-148410-0", "title": "Title A", "author": "Author A" }),
        )
        .await
        .unwrap();

    match outcome {
        CommandOutcome::Book(book) => assert_eq!(book.isbn.as_str(), ISBN),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(get_book(&deps, ISBN).await.is_ok());
}

#[tokio::test]
async fn test_dispatch_payload_with_mismatched_shape_is_invalid_command() {
    let deps = common::in_memory_deps();
    let bus = CommandBus::with_default_handlers(deps.clone());

    // BorrowBookのペイロードをAddBookとして送る
    let result = bus
        .dispatch_payload(
            CommandKind::AddBook,
            json!({ "book_id": ISBN, "user_id": "u1" }),
        )
        .await;

    assert!(matches!(
        result,
        Err(LibraryError::InvalidCommand {
            kind: CommandKind::AddBook,
            ..
        })
    ));
    assert!(get_book(&deps, ISBN).await.is_err());
}

#[tokio::test]
async fn test_dispatch_payload_without_handler_fails_before_decoding() {
    let bus = CommandBus::new();

    let result = bus
        .dispatch_payload(CommandKind::DeleteBook, json!("not an object"))
        .await;

    assert!(matches!(
        result,
        Err(LibraryError::HandlerNotFound(CommandKind::DeleteBook))
    ));
}

#[tokio::test]
async fn test_handler_registered_under_wrong_kind_is_invalid_command() {
    let deps = common::in_memory_deps();
    let mut bus = CommandBus::new();
    bus.register_handler(
        CommandKind::DeleteBook,
        Arc::new(AddBookHandler::new(deps.clone())),
    );

    let result = bus
        .dispatch(
            DeleteBook {
                isbn: ISBN.to_string(),
            }
            .into(),
        )
        .await;

    assert!(matches!(
        result,
        Err(LibraryError::InvalidCommand {
            kind: CommandKind::AddBook,
            ..
        })
    ));
}

#[tokio::test]
async fn test_dispatch_named_resolves_kind_from_string() {
    let deps = common::in_memory_deps();
    let bus = CommandBus::with_default_handlers(deps.clone());

    let outcome = bus
        .dispatch_named(
            "AddBook",
            json!({ "isbn": ISBN, "title": "Title A", "author": "Author A" }),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::Book(_)));

    let result = bus.dispatch_named("LendBook", json!({ "isbn": ISBN })).await;
    match result {
        Err(LibraryError::UnknownCommand(err)) => assert_eq!(err.0, "LendBook"),
        other => panic!("unexpected result: {:?}", other),
    }
}

struct CountingHandler {
    calls: std::sync::atomic::AtomicUsize,
}

#[async_trait]
impl CommandHandler for CountingHandler {
    async fn handle(&self, command: Command) -> book_lending::application::library::Result<CommandOutcome> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match command {
            Command::DeleteBook(cmd) => Ok(CommandOutcome::Deleted(
                book_lending::domain::Isbn::parse(&cmd.isbn).unwrap(),
            )),
            _ => unreachable!(),
        }
    }
}

#[tokio::test]
async fn test_register_handler_replaces_existing() {
    let deps = common::in_memory_deps();
    let mut bus = CommandBus::with_default_handlers(deps);
    let counting = Arc::new(CountingHandler {
        calls: std::sync::atomic::AtomicUsize::new(0),
    });
    bus.register_handler(CommandKind::DeleteBook, counting.clone());

    // 既定のハンドラーなら書籍が存在しないためNotFoundになる
    let outcome = bus
        .dispatch(
            DeleteBook {
                isbn: ISBN.to_string(),
            }
            .into(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, CommandOutcome::Deleted(_)));
    assert_eq!(
        counting.calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}
