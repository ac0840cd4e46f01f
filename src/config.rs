use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::DEFAULT_INDENT;
use crate::error::RepairError;
use crate::patch::{BACKUP_DIR_NAME, MatchPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub patch: PatchConfig,
    pub cycle: CycleConfig,
    pub codec: CodecConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    pub create_backups: bool,
    pub backup_dir_name: String,
    pub base_dirs: Vec<PathBuf>,
    pub match_policy: MatchPolicy,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            create_backups: true,
            backup_dir_name: BACKUP_DIR_NAME.to_string(),
            base_dirs: vec![PathBuf::from(".")],
            match_policy: MatchPolicy::Permissive,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Number of recent signature sets and fingerprints remembered.
    pub window_size: usize,
    /// Similarity above which a same-location patch counts as a refinement.
    pub refinement_threshold: f64,
    /// Similarity above which a same-location patch counts as a distinct approach.
    pub distinct_threshold: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            window_size: 4,
            refinement_threshold: 0.9,
            distinct_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub indent: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { indent: DEFAULT_INDENT }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            patch: PatchConfig::default(),
            cycle: CycleConfig::default(),
            codec: CodecConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `REPAIR_*` overrides. Unparseable values are logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("REPAIR_LOG_LEVEL") {
            self.log_level = Some(level);
        }

        if let Some(raw) = lookup("REPAIR_CYCLE_WINDOW") {
            match raw.trim().parse::<usize>() {
                Ok(window) => self.cycle.window_size = window,
                Err(e) => log::warn!("Ignoring REPAIR_CYCLE_WINDOW={:?}: {}", raw, e),
            }
        }

        if let Some(raw) = lookup("REPAIR_CREATE_BACKUPS") {
            match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" => self.patch.create_backups = true,
                "false" | "0" | "no" => self.patch.create_backups = false,
                _ => log::warn!("Ignoring REPAIR_CREATE_BACKUPS={:?}: expected true or false", raw),
            }
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.cycle.window_size == 0 {
            return Err(RepairError::Config("cycle.window_size must be at least 1".to_string()));
        }
        if self.codec.indent == 0 {
            return Err(RepairError::Config("codec.indent must be at least 1".to_string()));
        }
        let (distinct, refinement) = (self.cycle.distinct_threshold, self.cycle.refinement_threshold);
        if !(0.0..=1.0).contains(&distinct) || !(0.0..=1.0).contains(&refinement) || distinct > refinement {
            return Err(RepairError::Config(format!(
                "similarity thresholds must satisfy 0 <= distinct ({}) <= refinement ({}) <= 1",
                distinct, refinement
            )));
        }
        Ok(())
    }
}
