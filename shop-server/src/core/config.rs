//! Server configuration

use std::path::PathBuf;

use super::BoxError;

pub const DEFAULT_HTTP_PORT: u16 = 5000;
pub const DEFAULT_JWT_EXPIRATION_DAYS: i64 = 30;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    /// Local directory for uploaded images, served at `/uploads`
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub db_max_connections: u32,
    /// Allowed CORS origin; `None` means permissive
    pub cors_origin: Option<String>,
    /// Optional log directory for daily rolling files
    pub log_dir: Option<String>,
    /// Emit JSON log lines (`LOG_FORMAT=json`)
    pub log_json: bool,
}

/// Resolve a secret: must be set and non-empty outside development.
/// Development falls back to a fixed placeholder.
pub fn resolve_secret(
    name: &str,
    value: Option<String>,
    environment: &str,
) -> Result<String, BoxError> {
    let is_dev = environment == "development";
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) if !is_dev => {
            Err(format!("{name} must not be empty in {environment} environment").into())
        }
        None if !is_dev => Err(format!("{name} must be set in {environment} environment").into()),
        _ => Ok(format!("dev-{name}-not-for-production")),
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = env("ENVIRONMENT").unwrap_or_else(|| "development".into());

        Ok(Self {
            database_url: env("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            http_port: parse_or(env("HTTP_PORT"), DEFAULT_HTTP_PORT),
            jwt_secret: resolve_secret("JWT_SECRET", env("JWT_SECRET"), &environment)?,
            jwt_expiration_days: parse_or(
                env("JWT_EXPIRATION_DAYS"),
                DEFAULT_JWT_EXPIRATION_DAYS,
            ),
            upload_dir: env("UPLOAD_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(env("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES),
            db_max_connections: parse_or(env("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS),
            cors_origin: env("CORS_ORIGIN").filter(|s| !s.is_empty()),
            log_dir: env("LOG_DIR").filter(|s| !s.is_empty()),
            log_json: env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
            environment,
        })
    }

    /// Development defaults pointing at a local database
    pub fn for_development(database_url: impl Into<String>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: database_url.into(),
            http_port: DEFAULT_HTTP_PORT,
            environment: "development".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            jwt_expiration_days: DEFAULT_JWT_EXPIRATION_DAYS,
            upload_dir: upload_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            cors_origin: None,
            log_dir: None,
            log_json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_required_outside_development() {
        assert!(resolve_secret("JWT_SECRET", None, "production").is_err());
        assert!(resolve_secret("JWT_SECRET", Some(String::new()), "staging").is_err());
        assert_eq!(
            resolve_secret("JWT_SECRET", Some("s3cret".into()), "production").unwrap(),
            "s3cret"
        );
    }

    #[test]
    fn test_secret_falls_back_in_development() {
        assert_eq!(
            resolve_secret("JWT_SECRET", None, "development").unwrap(),
            "dev-JWT_SECRET-not-for-production"
        );
        assert_eq!(
            resolve_secret("JWT_SECRET", Some(String::new()), "development").unwrap(),
            "dev-JWT_SECRET-not-for-production"
        );
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or(Some("8080".into()), DEFAULT_HTTP_PORT), 8080);
        assert_eq!(parse_or(Some("nope".into()), DEFAULT_HTTP_PORT), 5000);
        assert_eq!(parse_or::<u16>(None, 5000), 5000);
    }
}
