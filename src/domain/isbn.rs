use serde::{Deserialize, Serialize};

use super::IsbnError;

/// 正規化済みISBN - 書籍の同一性を表す値オブジェクト
///
/// 不変条件：
/// - ハイフン・空白を含まない
/// - 10桁または13桁
/// - チェックディジットが正しい
///
/// `Isbn::parse`を経由しないと作成できないため、
/// 検証されていないISBNがリポジトリのキーになることはない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    /// 生の文字列を検証し、正規化したISBNを返す
    pub fn parse(raw: &str) -> Result<Self, IsbnError> {
        validate(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ISBN-13形式か
    pub fn is_isbn13(&self) -> bool {
        self.0.len() == 13
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Isbn {
    type Error = IsbnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

/// 純粋関数：ISBNを検証して正規化する
///
/// 1. `-`と空白を除去
/// 2. 10文字ならISBN-10（重み 10..1、mod 11、末尾は`X`可）
/// 3. 13文字ならISBN-13（重み 1,3,1,3...、mod 10）
///
/// 副作用なし。正規化済みの文字列を返す。
pub fn validate(raw: &str) -> Result<String, IsbnError> {
    let chars: Vec<char> = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();

    match chars.len() {
        10 => validate_isbn10(&chars),
        13 => validate_isbn13(&chars),
        _ => Err(IsbnError::InvalidLength),
    }
}

fn digit_at(chars: &[char], position: usize) -> Result<u32, IsbnError> {
    let character = chars[position];
    character
        .to_digit(10)
        .ok_or(IsbnError::InvalidCharacter {
            position,
            character,
        })
}

fn validate_isbn10(chars: &[char]) -> Result<String, IsbnError> {
    let mut sum = 0;
    for (i, weight) in (2..=10).rev().enumerate() {
        sum += digit_at(chars, i)? * weight;
    }

    // 10桁目のみ X（=10）を許容する
    let check = match chars[9] {
        'X' | 'x' => 10,
        _ => digit_at(chars, 9)?,
    };
    sum += check;

    if sum % 11 != 0 {
        return Err(IsbnError::InvalidIsbn10Checksum);
    }

    Ok(chars.iter().map(|c| c.to_ascii_uppercase()).collect())
}

fn validate_isbn13(chars: &[char]) -> Result<String, IsbnError> {
    let mut sum = 0;
    for i in 0..13 {
        let weight = if i % 2 == 0 { 1 } else { 3 };
        sum += digit_at(chars, i)? * weight;
    }

    if sum % 10 != 0 {
        return Err(IsbnError::InvalidIsbn13Checksum);
    }

    Ok(chars.iter().collect())
}
