use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(default = "Utc::now")]
    pub published_at: DateTime<Utc>,
}

/// コマンド：書籍のタイトル・著者を更新する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBook {
    pub isbn: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// コマンド：書籍を削除する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteBook {
    pub isbn: String,
}

/// コマンド：書籍を借りる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BorrowBook {
    pub book_id: String,
    pub user_id: String,
    #[serde(default = "Utc::now")]
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReturnBook {
    pub book_id: String,
    pub user_id: String,
    #[serde(default = "Utc::now")]
    pub returned_at: DateTime<Utc>,
}

/// コマンド種別（閉じた列挙）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    AddBook,
    UpdateBook,
    DeleteBook,
    BorrowBook,
    ReturnBook,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::AddBook,
        CommandKind::UpdateBook,
        CommandKind::DeleteBook,
        CommandKind::BorrowBook,
        CommandKind::ReturnBook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::AddBook => "AddBook",
            CommandKind::UpdateBook => "UpdateBook",
            CommandKind::DeleteBook => "DeleteBook",
            CommandKind::BorrowBook => "BorrowBook",
            CommandKind::ReturnBook => "ReturnBook",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知のコマンド種別
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command kind {0:?}")]
pub struct UnknownCommandKind(pub String);

impl std::str::FromStr for CommandKind {
    type Err = UnknownCommandKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCommandKind(s.to_string()))
    }
}

/// コマンド統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Command {
    AddBook(AddBook),
    UpdateBook(UpdateBook),
    DeleteBook(DeleteBook),
    BorrowBook(BorrowBook),
    ReturnBook(ReturnBook),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::AddBook(_) => CommandKind::AddBook,
            Command::UpdateBook(_) => CommandKind::UpdateBook,
            Command::DeleteBook(_) => CommandKind::DeleteBook,
            Command::BorrowBook(_) => CommandKind::BorrowBook,
            Command::ReturnBook(_) => CommandKind::ReturnBook,
        }
    }

    /// 宣言された種別でペイロードを解釈する
    ///
    /// ペイロードの形が種別に合わない場合はデコードエラーを返す。
    pub fn from_payload(
        kind: CommandKind,
        payload: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            CommandKind::AddBook => Command::AddBook(serde_json::from_value(payload)?),
            CommandKind::UpdateBook => Command::UpdateBook(serde_json::from_value(payload)?),
            CommandKind::DeleteBook => Command::DeleteBook(serde_json::from_value(payload)?),
            CommandKind::BorrowBook => Command::BorrowBook(serde_json::from_value(payload)?),
            CommandKind::ReturnBook => Command::ReturnBook(serde_json::from_value(payload)?),
        })
    }
}

impl From<AddBook> for Command {
    fn from(cmd: AddBook) -> Self {
        Command::AddBook(cmd)
    }
}

impl From<UpdateBook> for Command {
    fn from(cmd: UpdateBook) -> Self {
        Command::UpdateBook(cmd)
    }
}

impl From<DeleteBook> for Command {
    fn from(cmd: DeleteBook) -> Self {
        Command::DeleteBook(cmd)
    }
}

impl From<BorrowBook> for Command {
    fn from(cmd: BorrowBook) -> Self {
        Command::BorrowBook(cmd)
    }
}

impl From<ReturnBook> for Command {
    fn from(cmd: ReturnBook) -> Self {
        Command::ReturnBook(cmd)
    }
}
