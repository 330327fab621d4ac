use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_host")]
    pub host: String,
    #[serde(default = "DatabaseConfig::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseConfig::default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "DatabaseConfig::default_dbname")]
    pub dbname: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: usize,
    #[serde(
        with = "humantime_serde",
        default = "DatabaseConfig::default_connect_timeout"
    )]
    pub connect_timeout: Duration,
    /// Key of the transaction-scoped advisory lock taken by every run that
    /// writes tracking state.
    #[serde(default = "DatabaseConfig::default_lock_key")]
    pub lock_key: i64,
}

impl DatabaseConfig {
    fn default_host() -> String {
        String::from("localhost")
    }

    fn default_port() -> u16 {
        5432
    }

    fn default_user() -> String {
        String::from("postgres")
    }

    fn default_dbname() -> String {
        String::from("postgres")
    }

    fn default_max_connections() -> usize {
        4
    }

    fn default_connect_timeout() -> Duration {
        Duration::from_secs(5)
    }

    fn default_lock_key() -> i64 {
        // "partswep"
        0x7061_7274_7377_6570
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            user: Self::default_user(),
            password: String::new(),
            dbname: Self::default_dbname(),
            max_connections: Self::default_max_connections(),
            connect_timeout: Self::default_connect_timeout(),
            lock_key: Self::default_lock_key(),
        }
    }
}
