mod config;
mod database;
mod partitions;
mod schedule;
mod server;

pub use config::Config;
pub use database::DatabaseConfig;
pub use partitions::{CleanupConfig, PartitionsConfig};
pub use schedule::ScheduleConfig;
pub use server::ServerConfig;
