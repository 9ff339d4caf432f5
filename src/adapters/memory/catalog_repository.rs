use crate::domain::{self, Book, BookPatch, Isbn};
use crate::ports::catalog_repository::{CatalogRepository as CatalogRepositoryTrait, Result};
use crate::ports::RepositoryError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::poisoned;

/// CatalogRepositoryのインメモリ実装
///
/// 正規化済みISBNで索引する。書き込みはロックを排他的に取るため、
/// 読み取り側は更新前か更新後のどちらかのレコードだけを見る。読み取りは常にクローンを返す。
pub struct CatalogRepository {
    books: RwLock<BTreeMap<Isbn, Book>>,
}

impl CatalogRepository {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.books.read().unwrap().len()
    }
}

impl Default for CatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepositoryTrait for CatalogRepository {
    async fn save(&self, book: Book) -> Result<()> {
        let mut books = self.books.write().map_err(poisoned)?;
        books.insert(book.isbn.clone(), book);
        Ok(())
    }

    /// 1回の書き込みロック内で確認と追加を行う
    async fn insert_if_absent(&self, book: Book) -> Result<()> {
        let mut books = self.books.write().map_err(poisoned)?;
        if books.contains_key(&book.isbn) {
            return Err(RepositoryError::AlreadyExists);
        }
        books.insert(book.isbn.clone(), book);
        Ok(())
    }

    /// 1回の書き込みロック内で検索・更新・書き戻しを行う
    async fn update_if_present(&self, isbn: &Isbn, patch: &BookPatch) -> Result<Book> {
        let mut books = self.books.write().map_err(poisoned)?;
        let book = books.get_mut(isbn).ok_or(RepositoryError::NotFound)?;
        *book = domain::book::update_book(book, patch);
        Ok(book.clone())
    }

    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Book> {
        let books = self.books.read().map_err(poisoned)?;
        books.get(isbn).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        let books = self.books.read().map_err(poisoned)?;
        Ok(books.values().cloned().collect())
    }

    async fn delete(&self, isbn: &Isbn) -> Result<()> {
        let mut books = self.books.write().map_err(poisoned)?;
        books
            .remove(isbn)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn exists(&self, isbn: &Isbn) -> Result<bool> {
        let books = self.books.read().map_err(poisoned)?;
        Ok(books.contains_key(isbn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::new_book;
    use chrono::Utc;

    fn book(isbn: &str, title: &str) -> Book {
        new_book(Isbn::parse(isbn).unwrap(), title, "Author", Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_insert_if_absent_rejects_duplicate() {
        let repo = CatalogRepository::new();
        repo.insert_if_absent(book("9783161484100", "First")).await.unwrap();

        let result = repo.insert_if_absent(book("9783161484100", "Second")).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
        assert_eq!(repo.len(), 1);
        let stored = repo.find_by_isbn(&Isbn::parse("9783161484100").unwrap()).await.unwrap();
        assert_eq!(stored.title, "First");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_record() {
        let repo = CatalogRepository::new();
        repo.save(book("0306406152", "Old")).await.unwrap();
        repo.save(book("0306406152", "New")).await.unwrap();

        let stored = repo.find_by_isbn(&Isbn::parse("0306406152").unwrap()).await.unwrap();
        assert_eq!(stored.title, "New");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_isbn_returns_copy() {
        let repo = CatalogRepository::new();
        repo.save(book("0306406152", "Original")).await.unwrap();
        let isbn = Isbn::parse("0306406152").unwrap();

        let mut copy = repo.find_by_isbn(&isbn).await.unwrap();
        copy.title = "Mutated".to_string();

        assert_eq!(repo.find_by_isbn(&isbn).await.unwrap().title, "Original");
    }

    #[tokio::test]
    async fn test_find_all_is_ordered_by_isbn() {
        let repo = CatalogRepository::new();
        repo.save(book("9783161484100", "B")).await.unwrap();
        repo.save(book("0306406152", "A")).await.unwrap();

        let all = repo.find_all().await.unwrap();
        let isbns: Vec<&str> = all.iter().map(|b| b.isbn.as_str()).collect();
        assert_eq!(isbns, vec!["0306406152", "9783161484100"]);
    }

    #[tokio::test]
    async fn test_update_if_present_applies_patch() {
        let repo = CatalogRepository::new();
        repo.save(book("0306406152", "Old")).await.unwrap();
        let isbn = Isbn::parse("0306406152").unwrap();

        let patch = BookPatch::new(None, Some("New Author")).unwrap();
        let updated = repo.update_if_present(&isbn, &patch).await.unwrap();

        assert_eq!(updated.title, "Old");
        assert_eq!(updated.author, "New Author");
        assert_eq!(repo.find_by_isbn(&isbn).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_if_present_does_not_insert_missing_book() {
        let repo = CatalogRepository::new();
        let isbn = Isbn::parse("0306406152").unwrap();

        let patch = BookPatch::new(Some("Title"), None).unwrap();
        let result = repo.update_if_present(&isbn, &patch).await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_not_found() {
        let repo = CatalogRepository::new();
        repo.save(book("0306406152", "A")).await.unwrap();

        let result = repo.delete(&Isbn::parse("9783161484100").unwrap()).await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_exists() {
        let repo = CatalogRepository::new();
        let isbn = Isbn::parse("0306406152").unwrap();
        assert!(!repo.exists(&isbn).await.unwrap());

        repo.save(book("0306406152", "A")).await.unwrap();
        assert!(repo.exists(&isbn).await.unwrap());
    }
}
