use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LaneConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scoring: ScoringConfig,
    pub feed: FeedConfig,
    pub anti_loop: AntiLoopConfig,
    pub recovery: RecoveryConfig,
    pub pacing: PacingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Dimension weights for the static relevance score.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub memory_weight: f64,
    pub insight_weight: f64,
    pub relationship_weight: f64,
    pub needs_weight: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub default_count: usize,
    /// Algorithm score at or above which an item lands in the high bucket.
    pub coverage_threshold: f64,
    /// Share of a page reserved for the high bucket.
    pub coverage_ratio: f64,
    pub reason_probability: f64,
    /// Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AntiLoopConfig {
    pub history_window: usize,
    pub jitter_epoch: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RecoveryConfig {
    pub base_distance: f64,
    pub cleanup_threshold: u64,
    pub stale_window: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PacingConfig {
    pub batch_size: usize,
    pub initial_delay_ms: u64,
    pub min_delay_ms: u64,
    pub acceleration_span: usize,
    pub preload_threshold: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memlane_dir()
            .join("inventory.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            memory_weight: 0.30,
            insight_weight: 0.25,
            relationship_weight: 0.25,
            needs_weight: 0.20,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_count: 20,
            coverage_threshold: 0.3,
            coverage_ratio: 0.9,
            reason_probability: 0.10,
            seed: None,
        }
    }
}

impl Default for AntiLoopConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            jitter_epoch: 100,
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            base_distance: 20.0,
            cleanup_threshold: 10_000,
            stale_window: 1_000,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            batch_size: 6,
            initial_delay_ms: 80,
            min_delay_ms: 40,
            acceleration_span: 12,
            preload_threshold: 15,
        }
    }
}

/// Returns `~/.memlane/`
pub fn default_memlane_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memlane")
}

/// Returns the default config file path: `~/.memlane/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memlane_dir().join("config.toml")
}

impl LaneConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LaneConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMLANE_DB, MEMLANE_LOG_LEVEL, MEMLANE_SEED).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMLANE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMLANE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MEMLANE_SEED") {
            match val.parse::<u64>() {
                Ok(seed) => self.feed.seed = Some(seed),
                Err(_) => tracing::warn!(value = %val, "ignoring non-numeric MEMLANE_SEED"),
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
