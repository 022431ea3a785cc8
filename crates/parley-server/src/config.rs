use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("PARLEY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PARLEY_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let db_path: PathBuf = get("PARLEY_DB_PATH").unwrap_or_else(|| "parley.db".into()).into();
        let host = get("PARLEY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("PARLEY_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("PARLEY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;
        let ttl_days: i64 = get("PARLEY_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("PARLEY_TOKEN_TTL_DAYS must be a whole number of days")?;
        if ttl_days <= 0 {
            bail!("PARLEY_TOKEN_TTL_DAYS must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            addr,
            token_ttl: chrono::Duration::days(ttl_days),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("PARLEY_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("parley.db"));
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.token_ttl, chrono::Duration::days(30));
    }

    #[test]
    fn placeholder_secret_is_refused() {
        assert!(load(&[]).is_err());
        assert!(load(&[("PARLEY_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("PARLEY_JWT_SECRET", "s3cret"),
            ("PARLEY_HOST", "127.0.0.1"),
            ("PARLEY_PORT", "8080"),
            ("PARLEY_TOKEN_TTL_DAYS", "7"),
        ])
        .unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_ttl, chrono::Duration::days(7));

        assert!(load(&[("PARLEY_JWT_SECRET", "s3cret"), ("PARLEY_PORT", "http")]).is_err());
    }
}
