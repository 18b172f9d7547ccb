//! # Service Configuration
//!
//! Loads `config/pulse.toml` (path overridable via `PULSE_CONFIG_PATH`),
//! then applies scalar env overrides. Built-in defaults cover a missing
//! file so the service always boots.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::weights::DEFAULT_WEIGHT_FLOOR;

pub const DEFAULT_CONFIG_PATH: &str = "config/pulse.toml";

pub const ENV_CONFIG_PATH: &str = "PULSE_CONFIG_PATH";
pub const ENV_BIND: &str = "PULSE_BIND";
pub const ENV_WEIGHT_FLOOR: &str = "PULSE_WEIGHT_FLOOR";
pub const ENV_WATCH_INTERVAL_SECS: &str = "PULSE_WATCH_INTERVAL_SECS";

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_HISTORY_CAPACITY: usize = 2_000;
const DEFAULT_ROLLING_WINDOW_DAYS: u64 = 30;
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 60;

/// On-disk shape of `config/pulse.toml`. All sections optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    bind: Option<String>,
    weight_floor: Option<f64>,
    history_capacity: Option<usize>,
    rolling_window_days: Option<u64>,
    watch_interval_secs: Option<u64>,
    /// Optional macro-model override file, relative to the working dir.
    macro_config_path: Option<String>,
    #[serde(default)]
    catalog: CatalogConfig,
    /// Explicit starting weights; equal split over the catalog when absent.
    #[serde(default)]
    weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogConfig {
    #[serde(default)]
    sectors: Vec<String>,
    #[serde(default)]
    aliases: HashMap<String, String>,
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub weight_floor: f64,
    pub history_capacity: usize,
    pub rolling_window_days: u64,
    pub watch_interval_secs: u64,
    pub macro_config_path: Option<PathBuf>,
    /// Sector universe; empty means "use the built-in catalog seed".
    pub sectors: Vec<String>,
    pub aliases: HashMap<String, String>,
    pub default_weights: BTreeMap<String, f64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            weight_floor: DEFAULT_WEIGHT_FLOOR,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            rolling_window_days: DEFAULT_ROLLING_WINDOW_DAYS,
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            macro_config_path: None,
            sectors: Vec::new(),
            aliases: HashMap::new(),
            default_weights: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load from the config file (env path override, then the default
    /// path), then apply env scalar overrides. A missing file is fine; a
    /// present but unparsable file is an error.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let file: FileConfig = toml::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!(path = %path.display(), "loaded pulse config");
            Self::from_file(file)
        } else {
            info!(path = %path.display(), "no config file, using built-in defaults");
            Self::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn from_file(file: FileConfig) -> Self {
        let d = Self::default();
        Self {
            bind: file.bind.unwrap_or(d.bind),
            weight_floor: file
                .weight_floor
                .map(|f| f.clamp(0.0, 100.0))
                .unwrap_or(d.weight_floor),
            history_capacity: file.history_capacity.unwrap_or(d.history_capacity),
            rolling_window_days: file.rolling_window_days.unwrap_or(d.rolling_window_days),
            watch_interval_secs: file.watch_interval_secs.unwrap_or(d.watch_interval_secs),
            macro_config_path: file.macro_config_path.map(PathBuf::from),
            sectors: file.catalog.sectors,
            aliases: file.catalog.aliases,
            default_weights: file.weights,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var(ENV_BIND) {
            if !bind.trim().is_empty() {
                self.bind = bind;
            }
        }
        if let Some(floor) = parse_env_f64(ENV_WEIGHT_FLOOR) {
            self.weight_floor = floor.clamp(0.0, 100.0);
        }
        if let Some(secs) = parse_env_u64(ENV_WATCH_INTERVAL_SECS) {
            self.watch_interval_secs = secs.max(1);
        }
    }
}

fn parse_env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
