use clap::Parser;
use log::kv::{ToValue, Value};

/// Detaches and drops empty PostgreSQL partitions on a schedule.
#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    #[arg(short, long)]
    pub config: Option<String>,
    /// Serve the HTTP API only; scheduled runs are not started.
    #[arg(long)]
    pub no_scheduler: bool,
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}
