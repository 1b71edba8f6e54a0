use crate::core::canonical::DEFAULT_MIN_SCORE;
use crate::core::fusion::DEFAULT_MIN_CONFIDENCE;
use crate::core::ttl_store::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
use crate::domain::ports::DetectionConfigProvider;
use crate::utils::error::{NutriError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    pub canonical: Option<CanonicalConfig>,
    pub store: Option<StoreConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub endpoint: Option<String>,
    pub min_confidence: Option<f64>,
    /// GPT 偵測器的功能開關
    pub enable_gpt: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalConfig {
    pub min_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl CoachConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NutriError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| NutriError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DETECTOR_API_KEY})，未設定者保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.detection.endpoint.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.detection.timeout_seconds.map(Duration::from_secs)
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.detection.headers.clone().unwrap_or_default()
    }

    pub fn canonical_min_score(&self) -> f64 {
        self.canonical
            .as_ref()
            .and_then(|c| c.min_score)
            .unwrap_or(DEFAULT_MIN_SCORE)
    }

    pub fn store_ttl(&self) -> Duration {
        self.store
            .as_ref()
            .and_then(|s| s.ttl_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL)
    }

    pub fn sweep_interval(&self) -> Duration {
        self.store
            .as_ref()
            .and_then(|s| s.sweep_interval_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(endpoint) = &self.detection.endpoint {
            validation::validate_url("detection.endpoint", endpoint)?;
        }

        if let Some(min_confidence) = self.detection.min_confidence {
            validation::validate_range("detection.min_confidence", min_confidence, 0.0, 1.0)?;
        }

        if let Some(timeout) = self.detection.timeout_seconds {
            validation::validate_positive_number("detection.timeout_seconds", timeout, 1)?;
        }

        if let Some(min_score) = self.canonical.as_ref().and_then(|c| c.min_score) {
            validation::validate_range("canonical.min_score", min_score, 0.0, 1.0)?;
        }

        if let Some(store) = &self.store {
            if let Some(ttl) = store.ttl_seconds {
                validation::validate_positive_number("store.ttl_seconds", ttl, 1)?;
            }
            if let Some(interval) = store.sweep_interval_seconds {
                validation::validate_positive_number("store.sweep_interval_seconds", interval, 1)?;
            }
        }

        if let Some(level) = self.logging.as_ref().and_then(|l| l.level.as_deref()) {
            validation::validate_non_empty_string("logging.level", level)?;
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level) {
                return Err(NutriError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.to_string(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl DetectionConfigProvider for CoachConfig {
    fn min_confidence(&self) -> f64 {
        self.detection.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE)
    }

    fn enable_gpt(&self) -> bool {
        self.detection.enable_gpt.unwrap_or(false)
    }
}

impl Validate for CoachConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
