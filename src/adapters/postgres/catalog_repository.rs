use crate::domain::{Book, BookPatch, Isbn};
use crate::ports::RepositoryError;
use crate::ports::catalog_repository::{CatalogRepository as CatalogRepositoryTrait, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
///
/// 保存済みのISBNも再検証し、不正な値はStorageエラーとして扱う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn: String = row.try_get("isbn").map_err(RepositoryError::storage)?;
    let isbn = Isbn::parse(&isbn).map_err(RepositoryError::storage)?;

    Ok(Book {
        isbn,
        title: row.try_get("title").map_err(RepositoryError::storage)?,
        author: row.try_get("author").map_err(RepositoryError::storage)?,
        published_at: row.try_get("published_at").map_err(RepositoryError::storage)?,
    })
}

/// CatalogRepositoryのPostgreSQL実装
///
/// `books.isbn`の主キー制約で一意性を保証する。
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// PostgreSQLコネクションプールから新しいCatalogRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepositoryTrait for CatalogRepository {
    /// INSERT ... ON CONFLICT UPDATEによるupsert
    async fn save(&self, book: Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (isbn, title, author, published_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (isbn)
            DO UPDATE SET
                title = EXCLUDED.title,
                author = EXCLUDED.author,
                published_at = EXCLUDED.published_at
            "#,
        )
        .bind(book.isbn.as_str())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.published_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        Ok(())
    }

    /// ON CONFLICT DO NOTHINGで存在確認と追加を1文で行う
    ///
    /// 影響行数0なら同じISBNが既に存在する。
    async fn insert_if_absent(&self, book: Book) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (isbn, title, author, published_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (isbn) DO NOTHING
            "#,
        )
        .bind(book.isbn.as_str())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.published_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists);
        }
        Ok(())
    }

    /// 条件付きUPDATE 1文で検索と更新を不可分に行う
    ///
    /// 指定のないフィールドは`COALESCE`で既存の値を保つ。該当行がなければNotFound。
    async fn update_if_present(&self, isbn: &Isbn, patch: &BookPatch) -> Result<Book> {
        let row = sqlx::query(
            r#"
            UPDATE books
            SET
                title = COALESCE($2, title),
                author = COALESCE($3, author)
            WHERE isbn = $1
            RETURNING isbn, title, author, published_at
            "#,
        )
        .bind(isbn.as_str())
        .bind(patch.title())
        .bind(patch.author())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        match row {
            Some(row) => map_row_to_book(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_isbn(&self, isbn: &Isbn) -> Result<Book> {
        let row = sqlx::query(
            r#"
            SELECT isbn, title, author, published_at
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::storage)?;

        match row {
            Some(row) => map_row_to_book(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_all(&self) -> Result<Vec<Book>> {
        sqlx::query(
            r#"
            SELECT isbn, title, author, published_at
            FROM books
            ORDER BY isbn ASC
            "#,
        )
        .fetch(&self.pool)
        .map_err(RepositoryError::storage)
        .and_then(|row| async move { map_row_to_book(&row) })
        .try_collect()
        .await
    }

    async fn delete(&self, isbn: &Isbn) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn.as_str())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn exists(&self, isbn: &Isbn) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(RepositoryError::storage)
    }
}
