use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{
    Book, Isbn, Rental,
    commands::{Command, CommandKind},
};

use super::errors::{LibraryError, Result};
use super::service::ServiceDependencies;
use super::{catalog_service, rental_service};

/// コマンド実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// AddBook / UpdateBook
    Book(Book),
    /// DeleteBook
    Deleted(Isbn),
    /// BorrowBook / ReturnBook
    Rental(Rental),
}

/// コマンドハンドラー
///
/// 1つのコマンド種別を担当する。担当外の種別が渡された場合は
/// `LibraryError::InvalidCommand`を返す。
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: Command) -> Result<CommandOutcome>;
}

fn mismatch(expected: CommandKind, command: &Command) -> LibraryError {
    LibraryError::InvalidCommand {
        kind: expected,
        reason: format!("handler received a {} payload", command.kind()),
    }
}

/// AddBookハンドラー
pub struct AddBookHandler {
    deps: ServiceDependencies,
}

impl AddBookHandler {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl CommandHandler for AddBookHandler {
    async fn handle(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::AddBook(cmd) => catalog_service::add_book(&self.deps, cmd)
                .await
                .map(CommandOutcome::Book),
            other => Err(mismatch(CommandKind::AddBook, &other)),
        }
    }
}

/// UpdateBookハンドラー
pub struct UpdateBookHandler {
    deps: ServiceDependencies,
}

impl UpdateBookHandler {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl CommandHandler for UpdateBookHandler {
    async fn handle(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::UpdateBook(cmd) => catalog_service::update_book(&self.deps, cmd)
                .await
                .map(CommandOutcome::Book),
            other => Err(mismatch(CommandKind::UpdateBook, &other)),
        }
    }
}

/// DeleteBookハンドラー
pub struct DeleteBookHandler {
    deps: ServiceDependencies,
}

impl DeleteBookHandler {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl CommandHandler for DeleteBookHandler {
    async fn handle(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::DeleteBook(cmd) => catalog_service::delete_book(&self.deps, cmd)
                .await
                .map(CommandOutcome::Deleted),
            other => Err(mismatch(CommandKind::DeleteBook, &other)),
        }
    }
}

/// BorrowBookハンドラー
pub struct BorrowBookHandler {
    deps: ServiceDependencies,
}

impl BorrowBookHandler {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl CommandHandler for BorrowBookHandler {
    async fn handle(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::BorrowBook(cmd) => rental_service::borrow_book(&self.deps, cmd)
                .await
                .map(CommandOutcome::Rental),
            other => Err(mismatch(CommandKind::BorrowBook, &other)),
        }
    }
}

/// ReturnBookハンドラー
pub struct ReturnBookHandler {
    deps: ServiceDependencies,
}

impl ReturnBookHandler {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl CommandHandler for ReturnBookHandler {
    async fn handle(&self, command: Command) -> Result<CommandOutcome> {
        match command {
            Command::ReturnBook(cmd) => rental_service::return_book(&self.deps, cmd)
                .await
                .map(CommandOutcome::Rental),
            other => Err(mismatch(CommandKind::ReturnBook, &other)),
        }
    }
}

/// コマンドディスパッチャー
///
/// コマンド種別（閉じた列挙）でハンドラーを解決し、コマンドをそのまま渡す。
#[derive(Default, Clone)]
pub struct CommandBus {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 5種類すべてのハンドラーを登録済みのディスパッチャー
    pub fn with_default_handlers(deps: ServiceDependencies) -> Self {
        let mut bus = Self::new();
        bus.register_handler(
            CommandKind::AddBook,
            Arc::new(AddBookHandler::new(deps.clone())),
        );
        bus.register_handler(
            CommandKind::UpdateBook,
            Arc::new(UpdateBookHandler::new(deps.clone())),
        );
        bus.register_handler(
            CommandKind::DeleteBook,
            Arc::new(DeleteBookHandler::new(deps.clone())),
        );
        bus.register_handler(
            CommandKind::BorrowBook,
            Arc::new(BorrowBookHandler::new(deps.clone())),
        );
        bus.register_handler(CommandKind::ReturnBook, Arc::new(ReturnBookHandler::new(deps)));
        bus
    }

    /// ハンドラーを登録する（同じ種別は上書き）
    pub fn register_handler(&mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn has_handler(&self, kind: CommandKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// コマンドを担当ハンドラーへ渡す
    pub async fn dispatch(&self, command: Command) -> Result<CommandOutcome> {
        let kind = command.kind();
        let handler = self
            .handlers
            .get(&kind)
            .ok_or(LibraryError::HandlerNotFound(kind))?;

        tracing::debug!(command = %kind, "dispatching command");
        handler.handle(command).await
    }

    /// 型のないペイロードを宣言された種別で解釈してから渡す
    ///
    /// ペイロードの形が種別に合わない場合は`LibraryError::InvalidCommand`。
    pub async fn dispatch_payload(
        &self,
        kind: CommandKind,
        payload: serde_json::Value,
    ) -> Result<CommandOutcome> {
        if !self.has_handler(kind) {
            return Err(LibraryError::HandlerNotFound(kind));
        }

        let command =
            Command::from_payload(kind, payload).map_err(|e| LibraryError::InvalidCommand {
                kind,
                reason: e.to_string(),
            })?;

        self.dispatch(command).await
    }

    /// 種別名（`"AddBook"`など）とペイロードからディスパッチする
    ///
    /// 未知の種別名は`LibraryError::UnknownCommand`。
    pub async fn dispatch_named(
        &self,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<CommandOutcome> {
        let kind: CommandKind = kind.parse()?;
        self.dispatch_payload(kind, payload).await
    }
}
