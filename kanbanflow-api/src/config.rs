/// Configuration management for the API server
///
/// All settings come from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing key, at least 32 bytes (required)
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`, then `PORT`: port to bind to (default: 8000)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: any)
/// - `PLACEHOLDER_IDENTITY`: attribute anonymous writes to a placeholder
///   user (default: true)
/// - `PROJECT_LIST_CACHE_TTL_SECS` (default: 60)
/// - `TASK_LIST_CACHE_TTL_SECS` (default: 30)
/// - `RUN_MIGRATIONS`: apply migrations at startup (default: true)
/// - `RUST_LOG`: log filter (default: kanbanflow_api=debug,tower_http=debug)
/// - `LOG_FORMAT`: `json` for JSON log lines (read by the binary)
///
/// # Example
///
/// ```no_run
/// use kanbanflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub identity: IdentityConfig,

    pub cache: CacheConfig,

    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Attribute unauthenticated writes to a placeholder user instead of
    /// rejecting them with 401
    pub placeholder_fallback: bool,
}

/// List response cache lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub project_list_ttl_secs: u64,

    pub task_list_ttl_secs: u64,
}

impl CacheConfig {
    pub fn project_list_ttl(&self) -> Duration {
        Duration::from_secs(self.project_list_ttl_secs)
    }

    pub fn task_list_ttl(&self) -> Duration {
        Duration::from_secs(self.task_list_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            project_list_ttl_secs: 60,
            task_list_ttl_secs: 30,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> anyhow::Result<bool> {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{} must be a boolean, got {:?}", key, v),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("API_PORT") {
            Some(_) => parse_or(&lookup, "API_PORT", 8000u16)?,
            None => parse_or(&lookup, "PORT", 8000u16)?,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let defaults = CacheConfig::default();

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            identity: IdentityConfig {
                placeholder_fallback: parse_flag(&lookup, "PLACEHOLDER_IDENTITY", true)?,
            },
            cache: CacheConfig {
                project_list_ttl_secs: parse_or(
                    &lookup,
                    "PROJECT_LIST_CACHE_TTL_SECS",
                    defaults.project_list_ttl_secs,
                )?,
                task_list_ttl_secs: parse_or(
                    &lookup,
                    "TASK_LIST_CACHE_TTL_SECS",
                    defaults.task_list_ttl_secs,
                )?,
            },
            run_migrations: parse_flag(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = load(&required()).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.api.cors_origins.is_empty());
        assert!(config.identity.placeholder_fallback);
        assert_eq!(config.cache.project_list_ttl(), Duration::from_secs(60));
        assert_eq!(config.cache.task_list_ttl(), Duration::from_secs(30));
        assert!(config.run_migrations);
    }

    #[test]
    fn test_port_precedence() {
        let mut vars = required();
        vars.push(("PORT", "9000"));
        assert_eq!(load(&vars).unwrap().api.port, 9000);

        vars.push(("API_PORT", "9100"));
        assert_eq!(load(&vars).unwrap().api.port, 9100);
    }

    #[test]
    fn test_overrides() {
        let mut vars = required();
        vars.extend([
            ("API_HOST", "127.0.0.1"),
            ("CORS_ORIGINS", "http://localhost:3000, https://app.example.com,"),
            ("PLACEHOLDER_IDENTITY", "false"),
            ("TASK_LIST_CACHE_TTL_SECS", "5"),
            ("RUN_MIGRATIONS", "0"),
        ]);

        let config = load(&vars).unwrap();
        assert_eq!(config.api.host, "127.0.0.1");
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );
        assert!(!config.identity.placeholder_fallback);
        assert_eq!(config.cache.task_list_ttl_secs, 5);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_missing_required() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/test")]).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", "short"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut vars = required();
        vars.push(("API_PORT", "eighty"));
        assert!(load(&vars).is_err());

        let mut vars = required();
        vars.push(("PLACEHOLDER_IDENTITY", "maybe"));
        assert!(load(&vars).is_err());
    }
}
