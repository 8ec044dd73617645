use crate::core::scanner::{CommitPolicy, ScanOptions};
use crate::domain::model::SearchSpec;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_NOTIFY_DELAY_MS: u64 = 1500;
pub const MAX_NOTIFY_DELAY_MS: u64 = 600_000;
pub const DEFAULT_STORE_PATH: &str = "seen_items.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub notifier: NotifierConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub searches: Vec<SearchSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Ntfy,
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub r#type: NotifierKind,
    pub url: String,
    pub tags: Option<Vec<String>>,
    pub timeout_seconds: Option<u64>,
    pub delay_ms: Option<u64>,
}

impl NotifierConfig {
    /// Per-request timeout; a notifier that never answers must not stall the scan.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub base_url: Option<String>,
    pub items_path: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
    pub fields: Option<FieldMapping>,
}

/// Dot-paths of the listing fields inside one feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub link: String,
    pub title: String,
    pub price: String,
    pub size: String,
    pub image_url: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            link: "url".to_string(),
            title: "title".to_string(),
            price: "price".to_string(),
            size: "size_title".to_string(),
            image_url: "photo.url".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default)]
    pub commit: CommitPolicy,
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            commit: CommitPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    pub first_match_only: Option<bool>,
    pub monitor: Option<bool>,
}

impl ScannerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NTFY_TOPIC})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScanError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("notifier.url", &self.notifier.url)?;
        validation::validate_endpoint_template("source.endpoint", &self.source.endpoint)?;

        if let Some(base_url) = &self.source.base_url {
            validation::validate_url("source.base_url", base_url)?;
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }
        if let Some(timeout) = self.notifier.timeout_seconds {
            validation::validate_positive_number("notifier.timeout_seconds", timeout, 1)?;
        }
        if let Some(delay) = self.notifier.delay_ms {
            validation::validate_range("notifier.delay_ms", delay, 0, MAX_NOTIFY_DELAY_MS)?;
        }

        validation::validate_non_empty_string("store.path", &self.store.path)?;
        validation::validate_path("store.path", &self.store.path)?;

        if self.searches.is_empty() {
            return Err(ScanError::MissingConfigError {
                field: "searches".to_string(),
            });
        }
        if !self.searches.iter().any(SearchSpec::is_runnable) {
            return Err(ScanError::ConfigValidationError {
                field: "searches".to_string(),
                message: "every search has an empty brand".to_string(),
            });
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.source
                .timeout_seconds
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        )
    }

    pub fn notify_timeout(&self) -> Duration {
        self.notifier.timeout()
    }

    pub fn notify_delay(&self) -> Duration {
        Duration::from_millis(self.notifier.delay_ms.unwrap_or(DEFAULT_NOTIFY_DELAY_MS))
    }

    pub fn first_match_only(&self) -> bool {
        self.scan.first_match_only.unwrap_or(false)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.scan.monitor.unwrap_or(false)
    }

    /// Runnable searches in configured order; blank brands are reported by the scanner.
    pub fn runnable_searches(&self) -> impl Iterator<Item = &SearchSpec> {
        self.searches.iter().filter(|s| s.is_runnable())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            fetch_timeout: self.fetch_timeout(),
            notify_timeout: self.notify_timeout(),
            notify_delay: self.notify_delay(),
            commit: self.store.commit,
            first_match_only: self.first_match_only(),
        }
    }
}

impl Validate for ScannerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
