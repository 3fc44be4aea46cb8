use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
    pub cors_origin: String,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let Some(jwt_secret) = get("JWT_SECRET") else {
            bail!("JWT_SECRET must be set");
        };

        Ok(Self {
            host: get("HOST").unwrap_or("127.0.0.1").to_string(),
            port: parse_or(get("PORT"), "PORT", 5001)?,
            database_url: get("DATABASE_URL")
                .unwrap_or("sqlite://bookmarks.db")
                .to_string(),
            database_max_connections: parse_or(
                get("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                5,
            )?,
            jwt_secret: jwt_secret.to_string(),
            jwt_ttl_secs: parse_or(get("JWT_TTL_SECS"), "JWT_TTL_SECS", 86_400)?,
            cors_origin: get("CORS_ORIGIN")
                .unwrap_or("http://localhost:3000")
                .to_string(),
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_or<T>(value: Option<&str>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
