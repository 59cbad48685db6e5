use anyhow::Context;
use std::{env, fmt::Display, str::FromStr};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Absent means the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Absent disables the admin console.
    pub admin: Option<AdminCredentials>,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up `.env`.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            host: try_load("HOST", "0.0.0.0")?,
            port: try_load("PORT", "3000")?,
            database_url: var("DATABASE_URL"),
            max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            admin: match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
                (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
                _ => None,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_falls_back_to_default() {
        let port: u16 = try_load("POLLS_TEST_SURELY_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn unparsable_default_is_an_error() {
        let err = try_load::<u16>("POLLS_TEST_SURELY_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("POLLS_TEST_SURELY_UNSET_PORT"));
    }
}
