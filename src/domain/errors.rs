use thiserror::Error;

/// ISBNバリデーションのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsbnError {
    /// ハイフン・空白を除いた文字数が10でも13でもない
    #[error("ISBN must be 10 or 13 characters")]
    InvalidLength,
    /// 数字が必要な位置に数字以外の文字がある
    #[error("invalid ISBN format: unexpected character '{character}' at position {position}")]
    InvalidCharacter { position: usize, character: char },
    /// ISBN-10のチェックディジット不一致
    #[error("invalid ISBN-10 checksum")]
    InvalidIsbn10Checksum,
    /// ISBN-13のチェックディジット不一致
    #[error("invalid ISBN-13 checksum")]
    InvalidIsbn13Checksum,
}

/// 貸出・返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RentalError {
    /// 他の利用者が貸出中
    #[error("book is already borrowed by someone else")]
    AlreadyBorrowed,
    /// 本人が既に貸出中
    #[error("you already have this book, please return it before renting again")]
    AlreadyHeldByUser,
    /// 既に返却済み
    #[error("rental has already been returned")]
    AlreadyReturned,
}

/// 書籍レコードのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// タイトルが空
    #[error("title cannot be empty")]
    EmptyTitle,
    /// 著者が空
    #[error("author cannot be empty")]
    EmptyAuthor,
    /// タイトルが長すぎる
    #[error("title must be at most {max} characters")]
    TitleTooLong { max: usize },
    /// 著者が長すぎる
    #[error("author must be at most {max} characters")]
    AuthorTooLong { max: usize },
    /// 更新するフィールドが指定されていない
    #[error("at least one field must be provided for update")]
    NothingToUpdate,
}
