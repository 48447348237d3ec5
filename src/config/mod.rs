use std::env;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 50 * 1024 * 1024; // 50 MB
pub const DEFAULT_LINE_API_BASE: &str = "https://api.line.me";
pub const DEFAULT_LINE_DATA_API_BASE: &str = "https://api-data.line.me";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime configuration for the bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// LINE channel secret, used to verify webhook signatures
    pub channel_secret: String,

    /// LINE channel access token, used for replies and content downloads
    pub channel_token: String,

    /// Database connection string (Postgres in production)
    pub database_url: String,

    /// R2 access key id
    pub r2_access_key_id: String,

    /// R2 secret access key
    pub r2_secret_access_key: String,

    /// R2 S3 API endpoint
    pub r2_endpoint: String,

    /// R2 bucket name
    pub r2_bucket: String,

    /// Public access host for the bucket, e.g. https://pub-xxxx.r2.dev
    pub public_base_url: String,

    /// Listen port (default: 8080)
    pub port: u16,

    /// Largest payload accepted from the chat (default: 50 MB)
    pub max_content_size: usize,

    pub line_api_base: String,
    pub line_data_api_base: String,
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut missing = Vec::new();
        let mut require = |name: &'static str| match get(name) {
            Some(v) => v,
            None => {
                missing.push(name);
                String::new()
            }
        };

        let channel_secret = require("LINE_CHANNEL_SECRET");
        let channel_token = require("LINE_CHANNEL_TOKEN");
        let database_url = match get("DB_CONN_STR").or_else(|| get("DATABASE_URL")) {
            Some(v) => v,
            None => require("DB_CONN_STR"),
        };
        let r2_access_key_id = require("R2_ACCESS_KEY_ID");
        let r2_secret_access_key = require("R2_SECRET_ACCESS_KEY");
        let r2_endpoint = require("R2_BASE_ENDPOINT");
        let r2_bucket = require("R2_BUCKET_NAME");
        let public_base_url = require("R2_PUBLIC_BASE_URL");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let max_content_size = match get("MAX_CONTENT_SIZE") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "MAX_CONTENT_SIZE",
                value: v,
            })?,
            None => DEFAULT_MAX_CONTENT_SIZE,
        };

        Ok(Self {
            channel_secret,
            channel_token,
            database_url,
            r2_access_key_id,
            r2_secret_access_key,
            r2_endpoint,
            r2_bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            port,
            max_content_size,
            line_api_base: get("LINE_API_BASE")
                .unwrap_or_else(|| DEFAULT_LINE_API_BASE.to_string()),
            line_data_api_base: get("LINE_DATA_API_BASE")
                .unwrap_or_else(|| DEFAULT_LINE_DATA_API_BASE.to_string()),
        })
    }

    /// Config for tests and local runs against fakes
    pub fn development() -> Self {
        Self {
            channel_secret: "dev-channel-secret".to_string(),
            channel_token: "dev-channel-token".to_string(),
            database_url: "sqlite::memory:".to_string(),
            r2_access_key_id: "minioadmin".to_string(),
            r2_secret_access_key: "minioadmin".to_string(),
            r2_endpoint: "http://127.0.0.1:9000".to_string(),
            r2_bucket: "uploads".to_string(),
            public_base_url: "https://pub-dev.r2.dev".to_string(),
            port: DEFAULT_PORT,
            max_content_size: DEFAULT_MAX_CONTENT_SIZE,
            line_api_base: DEFAULT_LINE_API_BASE.to_string(),
            line_data_api_base: DEFAULT_LINE_DATA_API_BASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LINE_CHANNEL_SECRET", "secret"),
            ("LINE_CHANNEL_TOKEN", "token"),
            ("DB_CONN_STR", "postgres://localhost/files"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "skey"),
            ("R2_BASE_ENDPOINT", "https://acct.r2.cloudflarestorage.com"),
            ("R2_BUCKET_NAME", "files"),
            ("R2_PUBLIC_BASE_URL", "https://pub-abc.r2.dev/"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<BotConfig, ConfigError> {
        BotConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_content_size, DEFAULT_MAX_CONTENT_SIZE);
        assert_eq!(config.public_base_url, "https://pub-abc.r2.dev");
        assert_eq!(config.line_api_base, DEFAULT_LINE_API_BASE);
    }

    #[test]
    fn test_port_override() {
        let mut vars = full_env();
        vars.insert("PORT", "9090");
        assert_eq!(load(&vars).unwrap().port, 9090);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut vars = full_env();
        vars.insert("PORT", "eighty");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_database_url_fallback() {
        let mut vars = full_env();
        vars.remove("DB_CONN_STR");
        vars.insert("DATABASE_URL", "sqlite::memory:");
        assert_eq!(load(&vars).unwrap().database_url, "sqlite::memory:");
    }

    #[test]
    fn test_all_missing_reported() {
        let err = load(&HashMap::new()).unwrap_err();
        match err {
            ConfigError::Missing(names) => {
                assert_eq!(names.len(), 8);
                assert!(names.contains(&"LINE_CHANNEL_SECRET"));
                assert!(names.contains(&"DB_CONN_STR"));
                assert!(names.contains(&"R2_PUBLIC_BASE_URL"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("R2_BUCKET_NAME", "  ");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing(vec!["R2_BUCKET_NAME"])
        );
    }
}
