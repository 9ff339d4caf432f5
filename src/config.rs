use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 設定読み込みのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// アプリケーション設定
///
/// 環境変数から読み込む：
/// - `DATABASE_URL`: 未設定ならインメモリのリポジトリを使う
/// - `DATABASE_MAX_CONNECTIONS`: コネクションプールの上限（既定 5）
/// - `HOST` / `PORT`: 待ち受けアドレス（既定 0.0.0.0:3000）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の取得関数から読み込む（テスト用に環境変数から切り離す）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_max_connections = match non_empty("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "DATABASE_MAX_CONNECTIONS",
                    value,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let port = match non_empty("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "PORT",
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            database_max_connections,
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/books"),
            ("DATABASE_MAX_CONNECTIONS", "10"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/books"));
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber { name: "PORT", .. })
        ));
    }
}
