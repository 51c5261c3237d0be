use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::zones::ZoneFields;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub planner: PlannerConfig,
    pub zones: ZonesConfig,
}

/// Trip planner endpoint and the fixed query parameters sent with every trip
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlannerConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout_secs: u64,
    /// Maximum number of requests in flight
    pub concurrency: usize,
    pub mode: String,
    pub arrive_by: bool,
    pub wheelchair: bool,
    pub show_intermediate_stops: bool,
    pub locale: String,
    pub num_itineraries: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            path: "/otp/routers/default/plan".to_string(),
            timeout_secs: 30,
            concurrency: 50,
            mode: "TRANSIT,WALK".to_string(),
            arrive_by: false,
            wheelchair: false,
            show_intermediate_stops: true,
            locale: "en".to_string(),
            num_itineraries: 3,
        }
    }
}

impl PlannerConfig {
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}://{}:{}{}",
            self.scheme, self.host, self.port, self.path
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ZonesConfig {
    pub shapefile: Option<PathBuf>,
    /// `EPSG:<code>` or proj4 string; falls back to the `.prj` sidecar
    pub source_crs: Option<String>,
    pub id_field: String,
    pub name_field: String,
    pub description_field: String,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        let fields = ZoneFields::default();
        Self {
            shapefile: None,
            source_crs: None,
            id_field: fields.id,
            name_field: fields.name,
            description_field: fields.description,
        }
    }
}

impl ZonesConfig {
    pub fn fields(&self) -> ZoneFields {
        ZoneFields {
            id: self.id_field.clone(),
            name: self.name_field.clone(),
            description: self.description_field.clone(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
