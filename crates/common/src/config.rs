//! Application configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity provider configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub storage: MediaStorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// How request credentials are turned into a user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Verify HS256 bearer tokens issued by the identity provider.
    #[default]
    Jwt,
    /// Trust a user id header injected by an authenticating gateway.
    TrustedHeader,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Credential verification mode.
    #[serde(default)]
    pub mode: AuthMode,
    /// Shared secret for JWT verification.
    #[serde(default)]
    pub jwt_secret: String,
    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub jwt_issuer: Option<String>,
    /// Header carrying the user id in `trusted_header` mode.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            jwt_secret: String::new(),
            jwt_issuer: None,
            user_header: default_user_header(),
        }
    }
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaStorageConfig {
    /// Directory uploaded images are written to.
    #[serde(default = "default_media_path")]
    pub base_path: PathBuf,
    /// URL prefix the directory is served under.
    #[serde(default = "default_media_url")]
    pub base_url: String,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for MediaStorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_media_path(),
            base_url: default_media_url(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

fn default_media_path() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `PITCHBOARD_ENV`)
    /// 4. Environment variables with `PITCHBOARD__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("PITCHBOARD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PITCHBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Check settings that cannot be expressed through serde defaults.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.auth.mode == AuthMode::Jwt && self.auth.jwt_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "auth.jwt_secret is required when auth.mode = \"jwt\"".to_string(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(config::ConfigError::Message(
                "database.min_connections exceeds database.max_connections".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_applied() {
        let config = parse(
            r#"
            [server]
            url = "https://pitchboard.example"

            [database]
            url = "postgres://localhost/pitchboard"

            [auth]
            jwt_secret = "s3cret"
            "#,
        );

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.auth.mode, AuthMode::Jwt);
        assert_eq!(config.auth.user_header, "x-user-id");
        assert_eq!(config.storage.base_url, "/media");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jwt_mode_requires_secret() {
        let config = parse(
            r#"
            [server]
            url = "https://pitchboard.example"

            [database]
            url = "postgres://localhost/pitchboard"
            "#,
        );

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trusted_header_mode() {
        let config = parse(
            r#"
            [server]
            url = "https://pitchboard.example"

            [database]
            url = "postgres://localhost/pitchboard"

            [auth]
            mode = "trusted_header"
            user_header = "x-forwarded-user"
            "#,
        );

        assert_eq!(config.auth.mode, AuthMode::TrustedHeader);
        assert_eq!(config.auth.user_header, "x-forwarded-user");
        assert!(config.validate().is_ok());
    }
}
