//! Inference thresholds and pattern settings.
//!
//! Supports a config file (heartwood.toml) for overriding the defaults:
//! ```toml
//! categorical_threshold = 0.25
//! numeric_categorical_threshold = 0.1
//! email_inference_pattern = '^[^@]+@corp\.example$'
//! ```
//!
//! `Config` is an explicit object passed to every inference call rather than
//! process-global state; inference functions read it at call time, so a
//! change takes effect on the next call. Scoped overrides roll back on drop,
//! including during unwinding.

use std::env;
use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SchemaError};

/// Maximum unique-to-non-null ratio for a string column to be categorical.
pub const DEFAULT_CATEGORICAL_THRESHOLD: f64 = 0.2;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9_.+\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9\-.]+$";
const URL_PATTERN: &str = r"^(https?|ftp)://[^\s/$.?#][^\s]*$";
const IP_PATTERN: &str = r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(/\d{1,2})?$|^([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}$";

static DEFAULT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).unwrap());
static DEFAULT_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(URL_PATTERN).unwrap());
static DEFAULT_IP_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(IP_PATTERN).unwrap());

/// A named setting, for reset-by-name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    CategoricalThreshold,
    NumericCategoricalThreshold,
    EmailInferencePattern,
    UrlInferencePattern,
    IpInferencePattern,
}

impl ConfigOption {
    pub fn from_str(s: &str) -> Option<ConfigOption> {
        match s {
            "categorical_threshold" => Some(ConfigOption::CategoricalThreshold),
            "numeric_categorical_threshold" => Some(ConfigOption::NumericCategoricalThreshold),
            "email_inference_pattern" => Some(ConfigOption::EmailInferencePattern),
            "url_inference_pattern" => Some(ConfigOption::UrlInferencePattern),
            "ip_inference_pattern" => Some(ConfigOption::IpInferencePattern),
            _ => None,
        }
    }
}

/// Inference settings read by inference functions at call time.
#[derive(Debug, Clone)]
pub struct Config {
    categorical_threshold: f64,
    numeric_categorical_threshold: Option<f64>,
    email_regex: Regex,
    url_regex: Regex,
    ip_regex: Regex,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categorical_threshold: DEFAULT_CATEGORICAL_THRESHOLD,
            numeric_categorical_threshold: None,
            email_regex: DEFAULT_EMAIL_REGEX.clone(),
            url_regex: DEFAULT_URL_REGEX.clone(),
            ip_regex: DEFAULT_IP_REGEX.clone(),
        }
    }
}

/// On-disk form of [`Config`]; patterns are validated when applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    categorical_threshold: Option<f64>,
    numeric_categorical_threshold: Option<f64>,
    email_inference_pattern: Option<String>,
    url_inference_pattern: Option<String>,
    ip_inference_pattern: Option<String>,
}

impl Config {
    pub fn categorical_threshold(&self) -> f64 {
        self.categorical_threshold
    }

    /// Ratio under which a numeric column also qualifies as categorical.
    /// `None` (the default) means numeric columns are never categorical.
    pub fn numeric_categorical_threshold(&self) -> Option<f64> {
        self.numeric_categorical_threshold
    }

    pub fn email_regex(&self) -> &Regex {
        &self.email_regex
    }

    pub fn url_regex(&self) -> &Regex {
        &self.url_regex
    }

    pub fn ip_regex(&self) -> &Regex {
        &self.ip_regex
    }

    pub fn set_categorical_threshold(&mut self, threshold: f64) {
        self.categorical_threshold = threshold;
    }

    pub fn set_numeric_categorical_threshold(&mut self, threshold: Option<f64>) {
        self.numeric_categorical_threshold = threshold;
    }

    /// Replace the email inference pattern. The pattern is compiled before
    /// it is stored, so a bad pattern leaves the config unchanged.
    pub fn set_email_pattern(&mut self, pattern: &str) -> Result<()> {
        self.email_regex = Regex::new(pattern)?;
        Ok(())
    }

    pub fn set_url_pattern(&mut self, pattern: &str) -> Result<()> {
        self.url_regex = Regex::new(pattern)?;
        Ok(())
    }

    pub fn set_ip_pattern(&mut self, pattern: &str) -> Result<()> {
        self.ip_regex = Regex::new(pattern)?;
        Ok(())
    }

    /// Restore one setting to its default.
    pub fn reset(&mut self, option: ConfigOption) {
        match option {
            ConfigOption::CategoricalThreshold => {
                self.categorical_threshold = DEFAULT_CATEGORICAL_THRESHOLD;
            }
            ConfigOption::NumericCategoricalThreshold => {
                self.numeric_categorical_threshold = None;
            }
            ConfigOption::EmailInferencePattern => {
                self.email_regex = DEFAULT_EMAIL_REGEX.clone();
            }
            ConfigOption::UrlInferencePattern => {
                self.url_regex = DEFAULT_URL_REGEX.clone();
            }
            ConfigOption::IpInferencePattern => {
                self.ip_regex = DEFAULT_IP_REGEX.clone();
            }
        }
    }

    /// Restore every setting to its default.
    pub fn reset_all(&mut self) {
        *self = Config::default();
    }

    /// Begin a scoped override. Changes made through the returned guard are
    /// rolled back when it is dropped, including when the guarded block
    /// panics.
    pub fn scoped(&mut self) -> ScopedConfig<'_> {
        let saved = self.clone();
        ScopedConfig {
            saved: Some(saved),
            inner: self,
        }
    }

    /// Load settings from a TOML file, applied over the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)?;

        let mut config = Config::default();
        if let Some(t) = file.categorical_threshold {
            config.set_categorical_threshold(t);
        }
        if let Some(t) = file.numeric_categorical_threshold {
            config.set_numeric_categorical_threshold(Some(t));
        }
        if let Some(p) = &file.email_inference_pattern {
            config.set_email_pattern(p)?;
        }
        if let Some(p) = &file.url_inference_pattern {
            config.set_url_pattern(p)?;
        }
        if let Some(p) = &file.ip_inference_pattern {
            config.set_ip_pattern(p)?;
        }
        Ok(config)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `HEARTWOOD_CONFIG`
    /// 2. `./heartwood.toml`
    /// 3. `~/.config/heartwood/config.toml`
    ///
    /// Falls back to the defaults when no file is found.
    pub fn load() -> Result<Self> {
        if let Ok(path) = env::var("HEARTWOOD_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("heartwood.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("heartwood").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Config::default())
    }
}

/// Guard restoring the previous config state on drop.
pub struct ScopedConfig<'a> {
    inner: &'a mut Config,
    saved: Option<Config>,
}

impl Deref for ScopedConfig<'_> {
    type Target = Config;

    fn deref(&self) -> &Config {
        self.inner
    }
}

impl DerefMut for ScopedConfig<'_> {
    fn deref_mut(&mut self) -> &mut Config {
        self.inner
    }
}

impl Drop for ScopedConfig<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.inner = saved;
        }
    }
}
