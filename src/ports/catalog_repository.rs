use crate::domain::{Book, BookPatch, Isbn};
use async_trait::async_trait;

pub use super::error::Result;

/// 蔵書カタログポート
///
/// 正規化済みISBNをキーに書籍レコードを保持する。
/// 書き込みは不可分に反映し、読み取り側が書きかけのレコードを見ることはない。
/// 読み取りは常に所有権のあるコピーを返す。
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// ISBNをキーに完全なレコードをupsertする
    ///
    /// フィールド単位のマージはしない。追加か更新かは呼び出し側が決める。
    async fn save(&self, book: Book) -> Result<()>;

    /// 同じISBNのレコードがなければ追加する
    ///
    /// 存在確認と追加を不可分に行う。既に存在する場合は`RepositoryError::AlreadyExists`。
    async fn insert_if_absent(&self, book: Book) -> Result<()>;

    /// 既存のレコードに部分更新を適用し、更新後のレコードを返す
    ///
    /// 検索と書き込みを不可分に行うため、同時に削除されたレコードを復活させることはない。
    /// 存在しない場合は`RepositoryError::NotFound`。
    async fn update_if_present(&self, isbn: &Isbn, patch: &BookPatch) -> Result<Book>;

    /// 存在しない場合は`RepositoryError::NotFound`
    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Book>;

    /// 全書籍をISBN順に返す
    async fn find_all(&self) -> Result<Vec<Book>>;

    /// 存在しない場合は`RepositoryError::NotFound`
    async fn delete(&self, isbn: &Isbn) -> Result<()>;

    async fn exists(&self, isbn: &Isbn) -> Result<bool>;
}
