pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliArgs;
pub use crate::config::ScannerConfig;

pub use crate::adapters::{FileSeenStore, HttpNotifier, JsonFeedSource};
pub use crate::core::matcher::{filter_new, MatchBatch};
pub use crate::core::scanner::{CommitPolicy, ScanOptions, ScanReport, Scanner, SearchStatus};
pub use crate::domain::model::{ListingRecord, MatchResult, SearchSpec, SeenSet};
pub use crate::utils::error::{Result, ScanError};
