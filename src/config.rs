use crate::functions::TrafficSegmenter;
use crate::navigation::route_session::SessionSettings;
use crate::navigation::search::SearchSettings;
use crate::utils::{CoordinateError, GeoCoordinate};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const MAX_DEBOUNCE_MS: u64 = 60_000;
const MAX_TICK_MS: u64 = 3_600_000;
const MAX_CATEGORY_SPREAD_DEG: f64 = 1.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("Invalid home position: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("Invalid value for {0}: '{1}'")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org/route/v1/driving".into(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub limit: usize,
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/search".into(),
            limit: 5,
            user_agent: concat!("nav-engine/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub recent_limit: usize,
    pub category_results: usize,
    pub category_spread_deg: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 600,
            recent_limit: 5,
            category_results: 3,
            category_spread_deg: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    pub maneuver_threshold_m: f64,
    pub default_speed_limit: u32,
    pub home_lat: f64,
    pub home_lon: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        // Estocolmo
        Self {
            tick_ms: 1000,
            maneuver_threshold_m: 30.0,
            default_speed_limit: 90,
            home_lat: 59.3293,
            home_lon: 18.0686,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub chunk_size: usize,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::functions::traffic::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Configuración del motor. Todas las secciones del TOML son opcionales.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub routing: RoutingConfig,
    pub geocoding: GeocodingConfig,
    pub search: SearchConfig,
    pub simulation: SimulationConfig,
    pub traffic: TrafficConfig,
}

impl NavConfig {
    /// Lee un archivo TOML y valida URLs y posición inicial.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: NavConfig = toml::from_str(&text)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Carga `.env`, el archivo de `NAV_CONFIG` si existe y las variables `NAV_*`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        let mut config = match env::var("NAV_CONFIG") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("NAV_ROUTING_URL") {
            self.routing.base_url = url;
        }
        if let Some(url) = lookup("NAV_GEOCODE_URL") {
            self.geocoding.base_url = url;
        }
        if let Some(value) = lookup("NAV_TICK_MS") {
            self.simulation.tick_ms = parse_var("NAV_TICK_MS", &value)?;
        }
        if let Some(value) = lookup("NAV_HOME_LAT") {
            self.simulation.home_lat = parse_var("NAV_HOME_LAT", &value)?;
        }
        if let Some(value) = lookup("NAV_HOME_LON") {
            self.simulation.home_lon = parse_var("NAV_HOME_LON", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.routing.base_url)?;
        validate_url(&self.geocoding.base_url)?;
        self.home()?;
        if !(1..=MAX_TICK_MS).contains(&self.simulation.tick_ms) {
            return Err(invalid("simulation.tick_ms", self.simulation.tick_ms));
        }
        if self.search.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(invalid("search.debounce_ms", self.search.debounce_ms));
        }
        // NaN no pasa ninguna de las dos comprobaciones de rango
        let spread = self.search.category_spread_deg;
        if !(0.0..=MAX_CATEGORY_SPREAD_DEG).contains(&spread) {
            return Err(invalid("search.category_spread_deg", spread));
        }
        let threshold = self.simulation.maneuver_threshold_m;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid("simulation.maneuver_threshold_m", threshold));
        }
        Ok(())
    }

    pub fn home(&self) -> Result<GeoCoordinate, ConfigError> {
        Ok(GeoCoordinate::new(self.simulation.home_lat, self.simulation.home_lon)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.routing.timeout_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            maneuver_threshold_m: self.simulation.maneuver_threshold_m,
            default_speed_limit: self.simulation.default_speed_limit,
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            debounce: Duration::from_millis(self.search.debounce_ms),
            recent_limit: self.search.recent_limit,
            category_results: self.search.category_results,
            category_spread_deg: self.search.category_spread_deg,
        }
    }

    pub fn segmenter(&self) -> TrafficSegmenter {
        TrafficSegmenter::new(self.traffic.chunk_size)
    }
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl(url.to_string(), e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(
            url.to_string(),
            format!("unsupported scheme '{}'", other),
        )),
    }
}

fn invalid(key: &str, value: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), value.to_string())
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), value.to_string()))
}
