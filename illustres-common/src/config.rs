//! Configuration loading and resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`ILLUSTRES_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the
//! remaining tiers apply.

use crate::geo::{Coordinate, DEFAULT_START};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Explicit TOML path
pub const ENV_CONFIG_PATH: &str = "ILLUSTRES_CONFIG";
pub const ENV_BIND_ADDRESS: &str = "ILLUSTRES_BIND";
pub const ENV_LOG_LEVEL: &str = "ILLUSTRES_LOG_LEVEL";
pub const ENV_PORTRAITS_URL: &str = "ILLUSTRES_PORTRAITS_URL";
pub const ENV_GEO_TRACES_URL: &str = "ILLUSTRES_GEO_TRACES_URL";
pub const ENV_GEOCODER_URL: &str = "ILLUSTRES_GEOCODER_URL";
pub const ENV_GEOCODER_CITY: &str = "ILLUSTRES_GEOCODER_CITY";
pub const ENV_GEOCODER_MIN_INTERVAL_MS: &str = "ILLUSTRES_GEOCODER_MIN_INTERVAL_MS";
pub const ENV_SWEEP_DELAY_MS: &str = "ILLUSTRES_SWEEP_DELAY_MS";

/// Highest zoom level accepted by the tile layer
pub const MAX_ZOOM: u8 = 19;

/// User-Agent sent to every third-party service
pub fn get_user_agent() -> String {
    format!("FemmesIllustresMap/{}", env!("CARGO_PKG_VERSION"))
}

/// Compiled defaults (tier 4)
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_address: SocketAddr,
    pub log_level: String,
    pub portraits_url: String,
    pub geo_traces_url: String,
    pub geocoder_url: String,
    pub geocoder_city: String,
    pub geocoder_min_interval: Duration,
    pub geocoder_timeout: Duration,
    pub map_center: Coordinate,
    pub initial_zoom: u8,
    pub focus_zoom: u8,
    pub place_zoom: u8,
    pub sweep_delay: Duration,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5780)),
            log_level: "info".to_string(),
            portraits_url: "https://parisdata.opendatasoft.com/api/explore/v2.1/catalog/datasets/femmes-illustres-a-paris-portraits/records?limit=20".to_string(),
            geo_traces_url: "https://opendata.paris.fr/api/explore/v2.1/catalog/datasets/femmes-illustres-a-paris-parcours/records?limit=10".to_string(),
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_city: "Paris".to_string(),
            // Nominatim usage policy: at most one request per second
            geocoder_min_interval: Duration::from_millis(1000),
            geocoder_timeout: Duration::from_secs(15),
            map_center: DEFAULT_START,
            initial_zoom: 12,
            focus_zoom: 17,
            place_zoom: 16,
            sweep_delay: Duration::from_millis(400),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Tracing level filter: trace, debug, info, warn, error
    pub level: Option<String>,
}

/// `[sources]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourcesConfig {
    pub portraits_url: Option<String>,
    pub geo_traces_url: Option<String>,
}

/// `[geocoder]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeocoderConfig {
    pub base_url: Option<String>,
    /// Suffix appended to address lookups
    pub city: Option<String>,
    /// Minimum interval between requests; 0 disables throttling
    pub min_interval_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// `[map]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub initial_zoom: Option<u8>,
    pub focus_zoom: Option<u8>,
    pub place_zoom: Option<u8>,
    /// Delay before the background geocoding sweep starts
    pub sweep_delay_ms: Option<u64>,
}

/// TOML config file contents (tier 3); every field optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub map: MapConfig,
}

/// Values supplied on the command line (tier 1)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    pub portraits_url: Option<String>,
    pub geo_traces_url: Option<String>,
    pub geocoder_url: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub log_level: String,
    pub portraits_url: String,
    pub geo_traces_url: String,
    pub geocoder_url: String,
    pub geocoder_city: String,
    pub user_agent: String,
    pub geocoder_min_interval: Duration,
    pub geocoder_timeout: Duration,
    pub map_center: Coordinate,
    pub initial_zoom: u8,
    pub focus_zoom: u8,
    pub place_zoom: u8,
    pub sweep_delay: Duration,
}

/// Locate the TOML file: explicit path, then `ILLUSTRES_CONFIG`, then
/// `<config dir>/illustres/config.toml`
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_value(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("illustres").join("config.toml"))
}

/// Read a TOML config file; a missing file yields the empty config
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file {} not found, using environment and compiled defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolves [`AppConfig`] across the four tiers
pub struct ConfigResolver {
    cli: CliOverrides,
    toml: TomlConfig,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(toml: TomlConfig) -> Self {
        Self {
            cli: CliOverrides::default(),
            toml,
            defaults: CompiledDefaults::default(),
        }
    }

    pub fn with_cli(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    /// Load the TOML file named by `cli` (or the default location) and resolve
    pub fn from_cli(cli: CliOverrides) -> Result<AppConfig> {
        let toml = match config_file_path(cli.config_path.as_deref()) {
            Some(path) => load_toml_config(&path)?,
            None => TomlConfig::default(),
        };
        Self::new(toml).with_cli(cli).resolve()
    }

    pub fn resolve(self) -> Result<AppConfig> {
        let d = &self.defaults;
        let t = &self.toml;
        let c = &self.cli;

        let bind_text = pick(&c.bind_address, ENV_BIND_ADDRESS, &t.bind_address);
        let bind_address = match bind_text {
            Some(text) => text
                .parse::<SocketAddr>()
                .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", text, e)))?,
            None => d.bind_address,
        };

        let geocoder_min_interval = parsed_env::<u64>(ENV_GEOCODER_MIN_INTERVAL_MS)?
            .or(t.geocoder.min_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(d.geocoder_min_interval);

        let sweep_delay = parsed_env::<u64>(ENV_SWEEP_DELAY_MS)?
            .or(t.map.sweep_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(d.sweep_delay);

        let map_center = match (t.map.center_lat, t.map.center_lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
                .ok_or_else(|| Error::Config("Map center must be finite".to_string()))?,
            (None, None) => d.map_center,
            _ => {
                return Err(Error::Config(
                    "Map center needs both center_lat and center_lon".to_string(),
                ))
            }
        };

        let config = AppConfig {
            bind_address,
            log_level: pick(&c.log_level, ENV_LOG_LEVEL, &t.logging.level)
                .unwrap_or_else(|| d.log_level.clone()),
            portraits_url: pick(&c.portraits_url, ENV_PORTRAITS_URL, &t.sources.portraits_url)
                .unwrap_or_else(|| d.portraits_url.clone()),
            geo_traces_url: pick(&c.geo_traces_url, ENV_GEO_TRACES_URL, &t.sources.geo_traces_url)
                .unwrap_or_else(|| d.geo_traces_url.clone()),
            geocoder_url: pick(&c.geocoder_url, ENV_GEOCODER_URL, &t.geocoder.base_url)
                .unwrap_or_else(|| d.geocoder_url.clone()),
            geocoder_city: pick(&None, ENV_GEOCODER_CITY, &t.geocoder.city)
                .unwrap_or_else(|| d.geocoder_city.clone()),
            user_agent: get_user_agent(),
            geocoder_min_interval,
            geocoder_timeout: t
                .geocoder
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(d.geocoder_timeout),
            map_center,
            initial_zoom: t.map.initial_zoom.unwrap_or(d.initial_zoom),
            focus_zoom: t.map.focus_zoom.unwrap_or(d.focus_zoom),
            place_zoom: t.map.place_zoom.unwrap_or(d.place_zoom),
            sweep_delay,
        };

        config.validate()?;
        Ok(config)
    }
}

impl AppConfig {
    fn validate(&self) -> Result<()> {
        for (label, zoom) in [
            ("initial_zoom", self.initial_zoom),
            ("focus_zoom", self.focus_zoom),
            ("place_zoom", self.place_zoom),
        ] {
            if zoom > MAX_ZOOM {
                return Err(Error::Config(format!(
                    "{} must be between 0 and {}, got {}",
                    label, MAX_ZOOM, zoom
                )));
            }
        }
        if self.geocoder_timeout.is_zero() {
            return Err(Error::Config("Geocoder timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// CLI value, else environment variable, else TOML value
fn pick(cli: &Option<String>, env_name: &str, toml: &Option<String>) -> Option<String> {
    non_blank(cli.clone())
        .or_else(|| env_value(env_name))
        .or_else(|| non_blank(toml.clone()))
}

fn env_value(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_value(name) {
        Some(text) => text
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Invalid {}='{}': {}", name, text, e))),
        None => Ok(None),
    }
}
