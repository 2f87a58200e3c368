//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then from `RICKHOUSE__*` environment variables
//! (e.g. `RICKHOUSE__SERVER__PORT=3000`).

use config::{Config, ConfigError, Environment, File};
use engine::{DensitySample, DensityTable, EngineError, density::REFERENCE_TEMPERATURE_F};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub port: u16,
    pub bind: Option<String>,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub reference_temperature_f: f64,
    /// Replaces the built-in density reference when present.
    pub density_table: Option<Vec<DensitySample>>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reference_temperature_f: REFERENCE_TEMPERATURE_F,
            density_table: None,
        }
    }
}

impl EngineSettings {
    pub fn density_table(&self) -> Result<DensityTable, EngineError> {
        let samples = match &self.density_table {
            Some(samples) => samples.clone(),
            None => DensityTable::default().samples().to_vec(),
        };
        DensityTable::new(samples, self.reference_temperature_f)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("RICKHOUSE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
