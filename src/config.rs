use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ITEMS_DB_PATH: &str = "./data/items.db";
pub const DEFAULT_CATEGORIES_DB_PATH: &str = "./data/categories.db";
pub const DEFAULT_PUBLIC_DIR: &str = "./public";
pub const DEFAULT_LOG_DIR: &str = "./data/logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub items_db_path: PathBuf,
    pub categories_db_path: PathBuf,
    pub public_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            items_db_path: PathBuf::from(DEFAULT_ITEMS_DB_PATH),
            categories_db_path: PathBuf::from(DEFAULT_CATEGORIES_DB_PATH),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let path = |name: &str, default: PathBuf| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        Self {
            port: lookup("PORT")
                .and_then(|value| value.trim().parse::<u16>().ok())
                .unwrap_or(defaults.port),
            items_db_path: path("ITEMS_DB_PATH", defaults.items_db_path),
            categories_db_path: path("CATEGORIES_DB_PATH", defaults.categories_db_path),
            public_dir: path("PUBLIC_DIR", defaults.public_dir),
            log_dir: path("LOG_DIR", defaults.log_dir),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
