use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the JSON database file, e.g. "./shortlink.db"
    pub database_file: PathBuf,

    /// Write an empty database when `database_file` does not exist yet.
    /// Defaults to `true`; set DATABASE_CREATE_IF_MISSING=false to require
    /// an existing file.
    pub create_if_missing: bool,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_file = var("DATABASE_FILE").unwrap_or_else(|| "./shortlink.db".into());
        if database_file.trim().is_empty() {
            anyhow::bail!("DATABASE_FILE must not be empty");
        }

        let port = var("PORT")
            .unwrap_or_else(|| "4242".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let create_if_missing = var("DATABASE_CREATE_IF_MISSING")
            .map(|v| v.parse::<bool>())
            .transpose()
            .context("DATABASE_CREATE_IF_MISSING must be `true` or `false`")?
            .unwrap_or(true);

        Ok(Self {
            database_file: database_file.into(),
            create_if_missing,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
