use config::builder::{ConfigBuilder, DefaultState};
use config::{Config as CConfig, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{
    conf::{CleanupConfig, DatabaseConfig, PartitionsConfig, ScheduleConfig, ServerConfig},
    core::{
        Ident,
        SweepError::{self, ConfigParsingError},
    },
    scheduler::CronJob,
};

const ENV_PREFIX: &str = "PARTSWEEP";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub partitions: PartitionsConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, SweepError> {
        Self::build(CConfig::builder().add_source(File::from_str(toml_str, FileFormat::Toml)))
    }

    /// Reads the optional TOML file, then applies `PARTSWEEP_SECTION__KEY`
    /// environment overrides on top.
    pub fn load(path: Option<&str>) -> Result<Config, SweepError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }
        Self::build(builder.add_source(env_source()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Config, SweepError> {
        let config = builder
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SweepError> {
        Ident::new(&self.partitions.target_schema)
            .map_err(|e| ConfigParsingError(format!("partitions.target_schema: {e}")))?;
        Ident::new(&self.partitions.tracking_schema)
            .map_err(|e| ConfigParsingError(format!("partitions.tracking_schema: {e}")))?;
        CronJob::parse("identify", &self.schedule.identify)
            .map_err(|e| ConfigParsingError(format!("schedule.identify: {e}")))?;
        CronJob::parse("drop", &self.schedule.drop)
            .map_err(|e| ConfigParsingError(format!("schedule.drop: {e}")))?;
        if self.database.max_connections == 0 {
            return Err(ConfigParsingError(
                "database.max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
