//! Configuration management

use crate::playback::{NarratorOptions, Rate};
use crate::{ReadalongError, Result};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Persistent narration settings (~/.readalong.cfg)
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, creating it with defaults if missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| ReadalongError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| ReadalongError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| ReadalongError::Config(format!("Failed to save config: {}", e)))
    }

    /// Default config file path
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readalong.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("playback"))
            .set("rate", "1.0")
            .set("min_rate", "0.25")
            .set("max_rate", "4.0")
            .set("rate_step", "0.25")
            .set("autoplay", "true")
            .set("auto_scroll", "true")
            .set("outro", "");

        ini
    }

    /// Get a boolean value from config
    pub fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f64) -> f64 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Slowest allowed rate
    pub fn min_rate(&self) -> f64 {
        let min = self.get_float("playback", "min_rate", 0.25);
        if min > 0.0 {
            min
        } else {
            warn!("min_rate must be positive, using 0.25");
            0.25
        }
    }

    /// Fastest allowed rate
    pub fn max_rate(&self) -> f64 {
        self.get_float("playback", "max_rate", 4.0).max(self.min_rate())
    }

    /// Clamp a requested rate into the configured range
    pub fn clamp_rate(&self, rate: f64) -> f64 {
        rate.clamp(self.min_rate(), self.max_rate())
    }

    /// Starting playback rate
    pub fn rate(&self) -> f64 {
        self.clamp_rate(self.get_float("playback", "rate", 1.0))
    }

    /// Increment used by faster/slower
    pub fn rate_step(&self) -> f64 {
        self.get_float("playback", "rate_step", 0.25).abs()
    }

    /// Start narrating as soon as the document is loaded
    pub fn autoplay(&self) -> bool {
        self.get_bool("playback", "autoplay", true)
    }

    /// Scroll highlighted spans into view
    pub fn auto_scroll(&self) -> bool {
        self.get_bool("playback", "auto_scroll", true)
    }

    /// Outro locator, if one is configured
    pub fn outro(&self) -> Option<String> {
        let outro = self.get_string("playback", "outro", "");
        (!outro.trim().is_empty()).then(|| outro.trim().to_string())
    }

    /// Engine settings derived from this config
    pub fn narrator_options(&self) -> NarratorOptions {
        NarratorOptions {
            rate: Rate::new(self.rate()).unwrap_or_default(),
            min_rate: self.min_rate(),
            max_rate: self.max_rate(),
            auto_scroll: self.auto_scroll(),
        }
    }
}

impl Default for Config {
    /// In-memory defaults; nothing is read from or written to disk
    fn default() -> Self {
        Self {
            ini: Self::default_config(),
            path: Self::config_path(),
        }
    }
}
