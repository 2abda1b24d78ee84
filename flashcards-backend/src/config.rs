use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Directory served as static files at `/`.
    pub const PUBLIC_DIR: &str = "PUBLIC_DIR";
    /// Set to "false" or "0" to skip inserting the sample tag and cards on boot.
    pub const SEED_DATABASE: &str = "SEED_DATABASE";
    pub const SESSION_COOKIE_NAME: &str = "SESSION_COOKIE_NAME";
    pub const SESSION_TTL_MINUTES: &str = "SESSION_TTL_MINUTES";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/flashcards.db";
    pub const PUBLIC_DIR: &str = "public";
    pub const SESSION_COOKIE_NAME: &str = "flashcards.sid";
    pub const SESSION_TTL_MINUTES: u64 = 24 * 60;
    pub const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;
    pub const MAX_SESSIONS: usize = 10_000;
}

/// Returns the absolute path to the flashcards-backend directory.
/// Uses CARGO_MANIFEST_DIR at compile time, so it always resolves
/// to flashcards-backend/ regardless of the working directory at runtime.
pub fn backend_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Get the bundled public files directory
pub fn default_public_dir() -> String {
    backend_dir().join(defaults::PUBLIC_DIR).to_string_lossy().to_string()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub public_dir: String,
    pub seed_database: bool,
    pub session: SessionConfig,
}

/// Cookie and lifetime settings for the flash-message session store
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_minutes: u64,
    pub sweep_interval_secs: u64,
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: defaults::SESSION_COOKIE_NAME.to_string(),
            ttl_minutes: defaults::SESSION_TTL_MINUTES,
            sweep_interval_secs: defaults::SESSION_SWEEP_INTERVAL_SECS,
            max_sessions: defaults::MAX_SESSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = match env::var(env_vars::PORT) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("PORT '{}' is not a valid port, using {}", raw, defaults::PORT);
                defaults::PORT
            }),
            Err(_) => defaults::PORT,
        };

        let seed_database = env::var(env_vars::SEED_DATABASE)
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(true);

        let ttl_minutes = env::var(env_vars::SESSION_TTL_MINUTES)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::SESSION_TTL_MINUTES);

        Self {
            port,
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            public_dir: env::var(env_vars::PUBLIC_DIR).unwrap_or_else(|_| default_public_dir()),
            seed_database,
            session: SessionConfig {
                cookie_name: env::var(env_vars::SESSION_COOKIE_NAME)
                    .unwrap_or_else(|_| defaults::SESSION_COOKIE_NAME.to_string()),
                ttl_minutes,
                ..SessionConfig::default()
            },
        }
    }

    /// Configuration used by tests: in-memory database, no seed data.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: crate::db::IN_MEMORY_URL.to_string(),
            public_dir: default_public_dir(),
            seed_database: false,
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_public_dir_is_inside_backend() {
        assert!(default_public_dir().ends_with("public"));
        assert!(PathBuf::from(default_public_dir()).starts_with(backend_dir()));
    }
}
