// Adapters layer: concrete implementations of the domain ports (HTTP feed, HTTP notifier, seen-items file).

pub mod feed;
pub mod notify;
pub mod storage;

pub use feed::JsonFeedSource;
pub use notify::HttpNotifier;
pub use storage::FileSeenStore;
