use std::net::SocketAddr;

use anyhow::{Context, Result};

use crate::auth::DEFAULT_ANONYMOUS_SALT;

/// Startup settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen: SocketAddr,
    pub max_connections: u32,
    pub anonymous_salt: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_url = dotenv::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let listen = dotenv::var("CHUTE_LISTEN")
            .unwrap_or_else(|_| "0.0.0.0:1600".to_owned())
            .parse()
            .context("CHUTE_LISTEN is not a socket address")?;
        let max_connections = match dotenv::var("CHUTE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("CHUTE_MAX_CONNECTIONS is not a number")?,
            Err(_) => 16,
        };
        let anonymous_salt =
            dotenv::var("CHUTE_ANONYMOUS_SALT").unwrap_or_else(|_| DEFAULT_ANONYMOUS_SALT.to_owned());

        Ok(Config {
            database_url,
            listen,
            max_connections,
            anonymous_salt,
        })
    }
}
