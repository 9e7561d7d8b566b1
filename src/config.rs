use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::grade::Thresholds;
use crate::vendor::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: String,
    pub ping_count: u16,
    pub vendor_endpoint: String,
    pub lookup_timeout_secs: u64,
    pub probe_interval_ms: u64,
    pub green_threshold: u64,
    pub yellow_threshold: u64,
    pub loss_threshold: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            target: "google.com".to_string(),
            ping_count: 3,
            vendor_endpoint: DEFAULT_ENDPOINT.to_string(),
            lookup_timeout_secs: 10,
            probe_interval_ms: 1000,
            green_threshold: thresholds.green_ms,
            yellow_threshold: thresholds.yellow_ms,
            loss_threshold: thresholds.loss,
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SurveyError::Config("could not find config directory".to_string()))?
            .join("NetSurvey");

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("config.json"))
    }

    /// Loads the user's config file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        let path = match Self::get_config_path() {
            Ok(path) => path,
            Err(e) => {
                log::warn!("using default config: {e}");
                return AppConfig::default();
            }
        };
        if !path.exists() {
            return AppConfig::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("using default config: {e}");
            AppConfig::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SurveyError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| SurveyError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SurveyError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        log::info!("saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(SurveyError::Config("target must not be empty".to_string()));
        }
        if self.ping_count == 0 {
            return Err(SurveyError::Config("ping_count must be at least 1".to_string()));
        }
        if self.green_threshold > self.yellow_threshold {
            return Err(SurveyError::Config(format!(
                "green_threshold ({}) exceeds yellow_threshold ({})",
                self.green_threshold, self.yellow_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.loss_threshold) {
            return Err(SurveyError::Config(format!(
                "loss_threshold {} is not a fraction",
                self.loss_threshold
            )));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            green_ms: self.green_threshold,
            yellow_ms: self.yellow_threshold,
            loss: self.loss_threshold,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }
}
