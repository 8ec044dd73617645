pub mod matcher;
pub mod scanner;

pub use crate::domain::model::{ListingRecord, MatchResult, SearchSpec, SeenSet};
pub use crate::domain::ports::{ListingSource, Notifier, SeenStore};
pub use crate::utils::error::Result;
