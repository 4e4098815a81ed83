use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_QUOTA_FILE: &str = "./data/call_quota.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// JSON file the daily call quotas are persisted in.
    pub quota_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            quota_file: PathBuf::from(DEFAULT_QUOTA_FILE),
        }
    }
}

impl ServerConfig {
    /// Reads `TRACKING_BIND` and `TRACKING_QUOTA_FILE`. Returns `None` if the
    /// bind address is set but not a valid socket address.
    pub fn from_env() -> Option<Self> {
        let bind = env::var("TRACKING_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_owned())
            .parse()
            .ok()?;
        let quota_file = env::var("TRACKING_QUOTA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUOTA_FILE));
        Some(Self { bind, quota_file })
    }
}
