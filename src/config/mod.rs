use std::path::PathBuf;

use anyhow::{bail, Result};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::feed::SubscriptionErrorPolicy;
use crate::progress::DurationPolicy;
use crate::store::Direction;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection URL. Without one the in-memory store is used.
    pub database_url: Option<String>,
    /// JSON file used to seed the in-memory store
    pub seed_file: Option<PathBuf>,
    #[serde(default = "default_projects_collection")]
    pub projects_collection: String,
    #[serde(default = "default_probe_collection")]
    pub probe_collection: String,
    #[serde(default = "default_order_field")]
    pub order_field: String,
    #[serde(default)]
    pub order_direction: Direction,
    /// Duration substituted when a record has no usable `constructionDays`
    #[serde(default = "default_construction_days")]
    pub default_construction_days: i64,
    #[serde(default)]
    pub duration_policy: DurationPolicy,
    #[serde(default)]
    pub subscription_errors: SubscriptionErrorPolicy,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
    #[serde(default = "default_sql_log_level")]
    pub sql_log_level: log::LevelFilter,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_projects_collection() -> String {
    "clients".to_string()
}

fn default_probe_collection() -> String {
    "categories".to_string()
}

fn default_order_field() -> String {
    "createdAt".to_string()
}

fn default_construction_days() -> i64 {
    45
}

fn default_max_connections() -> u32 {
    5
}

fn default_sql_log_level() -> log::LevelFilter {
    log::LevelFilter::Debug
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_construction_days <= 0 {
            bail!(
                "DEFAULT_CONSTRUCTION_DAYS must be positive, got {}",
                self.default_construction_days
            );
        }
        if self.max_connections == 0 {
            bail!("MAX_CONNECTIONS must be at least 1");
        }
        Ok(())
    }

    /// Get the database URL, if one is configured
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        seed_file: Option<PathBuf>,
        collection: Option<String>,
    ) -> Self {
        if database_url.is_some() {
            self.database_url = database_url;
        }
        if seed_file.is_some() {
            self.seed_file = seed_file;
        }
        if let Some(collection) = collection {
            self.projects_collection = collection;
        }
        self
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}
