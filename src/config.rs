//! Runtime configuration.
//!
//! Values come from the environment (after loading a `.env` file if present).
//! Command-line flags override them.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | KHATA_DATABASE | khata.db | SQLite database file |
//! | KHATA_HTTP_HOST | 127.0.0.1 | HTTP bind address |
//! | KHATA_HTTP_PORT | 3000 | HTTP port |
//! | KHATA_LOG_LEVEL | info | Log level when RUST_LOG is unset |
//! | KHATA_LOG_DIR | (unset) | Write daily log files here instead of stderr |
//! | KHATA_DEFAULT_PAGE_LIMIT | 1000 | Page size when a query gives none |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::domain::DEFAULT_PAGE_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: String,
    pub http_host: IpAddr,
    pub http_port: u16,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub default_page_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "khata.db".into(),
            http_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: 3000,
            log_level: "info".into(),
            log_dir: None,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            database: lookup("KHATA_DATABASE").unwrap_or(defaults.database),
            http_host: lookup("KHATA_HTTP_HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_host),
            http_port: lookup("KHATA_HTTP_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_port),
            log_level: lookup("KHATA_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: lookup("KHATA_LOG_DIR").filter(|v| !v.trim().is_empty()),
            default_page_limit: lookup("KHATA_DEFAULT_PAGE_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v >= 1)
                .unwrap_or(defaults.default_page_limit),
        }
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http_host, self.http_port)
    }
}
