use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests to drain after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// Accept an unsigned `X-User-Id` header when no bearer token is sent.
    pub allow_header_identity: bool,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Admission lifecycle policy switches.
    pub admission: AdmissionPolicy,
}

/// Switches for the admission lifecycle.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    /// When no active admission period covers today, reuse or synthesise
    /// one at submission time instead of refusing the application.
    pub auto_open_periods: bool,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            auto_open_periods: true,
        }
    }
}

impl AdmissionPolicy {
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `ADMISSION_AUTO_OPEN_PERIODS` | `true`  |
    pub fn from_env() -> Self {
        let auto_open_periods = env_flag("ADMISSION_AUTO_OPEN_PERIODS", true);
        Self { auto_open_periods }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `ALLOW_HEADER_IDENTITY` | `false`                    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let allow_header_identity = env_flag("ALLOW_HEADER_IDENTITY", false);
        if allow_header_identity {
            tracing::warn!("ALLOW_HEADER_IDENTITY is enabled; X-User-Id headers are trusted");
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            allow_header_identity,
            jwt: JwtConfig::from_env(),
            admission: AdmissionPolicy::from_env(),
        }
    }
}

/// Parse a boolean env var (`true/false/1/0/yes/no`), panicking on garbage.
fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Err(_) => default,
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => panic!("{name} must be a boolean, got '{other}'"),
        },
    }
}
