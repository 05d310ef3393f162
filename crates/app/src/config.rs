//! App configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_APP_API_KEY` - Shopify app API key (OAuth client ID)
//! - `SHOPIFY_APP_API_SECRET` - Shopify app shared secret (OAuth client secret)
//! - `SESSION_SECRET` - Session cookie signing secret (min 32 chars, high entropy).
//!   Optional when `ENV=development`; a random per-process secret is used then.
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `ENV` - `development` or `production` (default: production)
//! - `ESDK` - `true` to render pages for the Shopify embedded app SDK
//! - `SHOPIFY_REDIRECT_URI` - Public base URL; `/auth_token` is appended
//!   (default: `http://localhost:3000`)
//! - `SHOPIFY_SCOPES` - Comma-separated OAuth scopes (default: `read_products,write_products`)
//! - `SHOPIFY_API_VERSION` - Admin REST API version (default: 2025-01)
//! - `SHOPIFY_REQUEST_TIMEOUT_SECS` - Upstream request timeout (default: 30)
//! - `SHOPIFY_API_ORIGIN` - Send all upstream calls to this origin instead of `https://<shop>`
//! - `SHOPIFY_NAMESPACE_WATCH` / `SHOPIFY_NAMESPACE_SYNC` - Metafield namespaces
//! - `SHOP` - Default shop (used when `/auth` has no `shop` parameter)
//! - `TOKEN` - Default access token (seeded into sessions in development)
//! - `DATABASE_URL` - `PostgreSQL` URL; sessions are kept in memory when unset
//! - `STATIC_DIR` - Static asset directory (default: crates/app/public)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use playmakers_core::{AccessToken, Namespace, ShopDomain};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Path of the OAuth callback, appended to `SHOPIFY_REDIRECT_URI`.
pub const CALLBACK_PATH: &str = "/auth_token";

const DEFAULT_REDIRECT_BASE: &str = "http://localhost:3000";
const DEFAULT_SCOPES: &str = "read_products,write_products";
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_WATCH_NAMESPACE: &str = "playmakers-watch";
const DEFAULT_SYNC_NAMESPACE: &str = "playmakers-sync";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment mode, from `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: sessions are seeded with `SHOP`/`TOKEN`.
    Development,
    /// Everything else.
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("development") {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment mode
    pub environment: Environment,
    /// Render pages for the Shopify embedded app SDK
    pub embedded_sdk: bool,
    /// Session cookie signing secret
    pub session_secret: SecretString,
    /// `PostgreSQL` URL for the session store (in-memory store when `None`)
    pub database_url: Option<SecretString>,
    /// Directory served for unmatched paths
    pub static_dir: PathBuf,
    /// Shopify app configuration
    pub shopify: ShopifyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app configuration.
///
/// Implements `Debug` manually to redact the shared secret and default token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// App API key (OAuth client ID)
    pub api_key: String,
    /// App shared secret (OAuth client secret, HMAC key)
    pub api_secret: SecretString,
    /// Requested OAuth scopes
    pub scopes: Vec<String>,
    /// Full OAuth redirect URI (ends with `/auth_token`)
    pub redirect_uri: String,
    /// Shop used when `/auth` is called without `shop`
    pub default_shop: Option<ShopDomain>,
    /// Token seeded into development sessions
    pub default_access_token: Option<AccessToken>,
    /// Admin REST API version (e.g., 2025-01)
    pub api_version: String,
    /// Origin override for all upstream calls
    pub api_origin: Option<Url>,
    /// Upstream request timeout
    pub request_timeout: Duration,
    /// Metafield namespaces of the two feature areas
    pub namespaces: Namespaces,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("redirect_uri", &self.redirect_uri)
            .field("default_shop", &self.default_shop)
            .field(
                "default_access_token",
                &self.default_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_version", &self.api_version)
            .field("api_origin", &self.api_origin)
            .field("request_timeout", &self.request_timeout)
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

/// Metafield namespaces, one per feature area.
#[derive(Debug, Clone)]
pub struct Namespaces {
    /// Market analysis ("watch") pages
    pub watch: Namespace,
    /// Stock sync ("sync") pages
    pub sync: Namespace,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            watch: Namespace::new(DEFAULT_WATCH_NAMESPACE),
            sync: Namespace::new(DEFAULT_SYNC_NAMESPACE),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let environment = Environment::parse(&get_env_or_default("ENV", "production"));
        let embedded_sdk = get_env_or_default("ESDK", "false").eq_ignore_ascii_case("true");

        let session_secret = match get_optional_env("SESSION_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "SESSION_SECRET")?;
                let secret = SecretString::from(value);
                validate_session_secret(&secret, "SESSION_SECRET")?;
                secret
            }
            None if environment == Environment::Development => {
                tracing::warn!("SESSION_SECRET not set, using a random per-process secret");
                SecretString::from(crate::services::auth::generate_random_string(64))
            }
            None => return Err(ConfigError::MissingEnvVar("SESSION_SECRET".to_string())),
        };

        let database_url = get_optional_env("DATABASE_URL").map(SecretString::from);
        let static_dir = PathBuf::from(get_env_or_default("STATIC_DIR", "crates/app/public"));
        let shopify = ShopifyConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            environment,
            embedded_sdk,
            session_secret,
            database_url,
            static_dir,
            shopify,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the app runs in development mode.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.shopify.redirect_uri.starts_with("https://")
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let redirect_base = get_env_or_default("SHOPIFY_REDIRECT_URI", DEFAULT_REDIRECT_BASE);
        let scopes = parse_scopes(&get_env_or_default("SHOPIFY_SCOPES", DEFAULT_SCOPES));

        let default_shop = get_optional_env("SHOP")
            .map(|shop| {
                ShopDomain::parse(&shop)
                    .map_err(|e| ConfigError::InvalidEnvVar("SHOP".to_string(), e.to_string()))
            })
            .transpose()?;
        let default_access_token = get_optional_env("TOKEN")
            .map(AccessToken::from)
            .filter(|token| !token.is_empty());

        let api_origin = get_optional_env("SHOPIFY_API_ORIGIN")
            .map(|origin| {
                Url::parse(&origin).map_err(|e| {
                    ConfigError::InvalidEnvVar("SHOPIFY_API_ORIGIN".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let request_timeout = get_env_or_default("SHOPIFY_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPIFY_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_key: get_required_env("SHOPIFY_APP_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_APP_API_SECRET")?,
            scopes,
            redirect_uri: redirect_uri(&redirect_base),
            default_shop,
            default_access_token,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            api_origin,
            request_timeout,
            namespaces: Namespaces {
                watch: Namespace::new(get_env_or_default(
                    "SHOPIFY_NAMESPACE_WATCH",
                    DEFAULT_WATCH_NAMESPACE,
                )),
                sync: Namespace::new(get_env_or_default(
                    "SHOPIFY_NAMESPACE_SYNC",
                    DEFAULT_SYNC_NAMESPACE,
                )),
            },
        })
    }

    /// Returns the shared secret (for HMAC verification and code exchange).
    #[must_use]
    pub fn api_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Build the OAuth redirect URI from the public base URL.
fn redirect_uri(base: &str) -> String {
    format!("{}{CALLBACK_PATH}", base.trim_end_matches('/'))
}

/// Split a comma-separated scope list, dropping blanks and duplicates.
fn parse_scopes(value: &str) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for scope in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !scopes.iter().any(|s| s == scope) {
            scopes.push(scope.to_string());
        }
    }
    scopes
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
