use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Fetching listings for '{query}' timed out after {seconds}s")]
    FetchTimeout { query: String, seconds: u64 },

    #[error("Fetching listings for '{query}' failed: {message}")]
    FetchFailure { query: String, message: String },

    #[error("Notification for {link} failed: {message}")]
    NotifierFailure { link: String, message: String },

    #[error("Seen-item store at {} is not accessible: {source}", path.display())]
    PersistenceError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Fetch,
    Notification,
    Persistence,
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 單一搜尋或單一通知失敗，掃描繼續
    Low,
    High,
    /// 本次執行必須中止
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ConfigError { .. }
            | ScanError::ConfigValidationError { .. }
            | ScanError::InvalidConfigValueError { .. }
            | ScanError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ScanError::FetchTimeout { .. } | ScanError::FetchFailure { .. } => {
                ErrorCategory::Fetch
            }
            ScanError::NotifierFailure { .. } => ErrorCategory::Notification,
            ScanError::PersistenceError { .. } | ScanError::IoError(_) => {
                ErrorCategory::Persistence
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Fetch | ErrorCategory::Notification => ErrorSeverity::Low,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Persistence => ErrorSeverity::Critical,
        }
    }

    /// Fatal errors abort the run; everything else is skip-and-continue.
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScanError::ConfigError { message } => format!("Configuration problem: {}", message),
            ScanError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            ScanError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            ScanError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            ScanError::FetchTimeout { query, .. } => {
                format!("The search for '{}' took too long and was skipped", query)
            }
            ScanError::FetchFailure { query, .. } => {
                format!("The search for '{}' could not be loaded", query)
            }
            ScanError::NotifierFailure { link, .. } => {
                format!("Could not send the notification for {}", link)
            }
            ScanError::PersistenceError { path, .. } => format!(
                "Could not read or save seen items at {}; the next run may send duplicates",
                path.display()
            ),
            ScanError::IoError(_) => "A file operation failed".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML configuration file and any ${VAR} environment variables it uses"
            }
            ErrorCategory::Fetch => {
                "The search is retried on the next scheduled run; raise source.timeout_seconds if it keeps timing out"
            }
            ErrorCategory::Notification => {
                "Verify the notifier URL is reachable; the listing will not be re-sent"
            }
            ErrorCategory::Persistence => {
                "Make sure the seen-items file and its directory are writable"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_search_errors_are_not_fatal() {
        let timeout = ScanError::FetchTimeout {
            query: "nike".to_string(),
            seconds: 45,
        };
        let notify = ScanError::NotifierFailure {
            link: "https://example.com/items/1".to_string(),
            message: "503".to_string(),
        };

        assert!(!timeout.is_fatal());
        assert!(!notify.is_fatal());
        assert_eq!(timeout.category(), ErrorCategory::Fetch);
    }

    #[test]
    fn test_config_and_persistence_errors_are_fatal() {
        let config = ScanError::MissingConfigError {
            field: "searches".to_string(),
        };
        let persist = ScanError::PersistenceError {
            path: PathBuf::from("seen_items.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(config.is_fatal());
        assert!(persist.is_fatal());
        assert_eq!(persist.severity(), ErrorSeverity::Critical);
        assert!(persist.user_friendly_message().contains("seen_items.txt"));
    }
}
