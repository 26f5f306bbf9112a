use anyhow::{anyhow, bail, Context, Error};
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreBackend {
    Mongo { uri: String, database: String },
    Memory,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
}

impl Config {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_DATABASE: &'static str = "location-pins";

    /// Reads the process environment. `.env` is expected to be loaded already.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_owned());
        let port = match lookup("PORT") {
            Some(port) => port.parse::<u16>().with_context(|| format!("invalid PORT: {}", port))?,
            None => Self::DEFAULT_PORT,
        };
        let store = match lookup("STORE_BACKEND").as_deref().unwrap_or("mongo") {
            "mongo" => StoreBackend::Mongo {
                uri: lookup("MONGODB_URI").ok_or_else(|| anyhow!("MONGODB_URI must be set"))?,
                database: lookup("MONGODB_DATABASE").unwrap_or_else(|| Self::DEFAULT_DATABASE.to_owned()),
            },
            "memory" => StoreBackend::Memory,
            other => bail!("invalid STORE_BACKEND: {} (expected mongo or memory)", other),
        };
        Ok(Self { host, port, store })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
