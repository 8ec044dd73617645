use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder shown for a price or size the feed did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// 已通知過的 listing 連結；BTreeSet 保證序列化時已排序
pub type SeenSet = BTreeSet<String>;

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// One listing card as extracted from a search results feed.
///
/// `link` and `title` are optional because extraction can miss them; such
/// records are dropped by the match engine instead of failing the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "not_available")]
    pub price: String,
    #[serde(default = "not_available")]
    pub size: String,
    #[serde(default)]
    pub image_url: String,
}

impl ListingRecord {
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            title: Some(title.into()),
            price: not_available(),
            size: not_available(),
            image_url: String::new(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    /// Link with surrounding whitespace removed, `None` when missing, blank or
    /// carrying control characters (the store keeps one link per line).
    pub fn link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.chars().any(char::is_control))
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// A configured search: the query sent to the listing source plus the
/// keyword and size filters applied to its results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpec {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub include_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl SearchSpec {
    pub fn new(brand: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            ..Self::default()
        }
    }

    pub fn include<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    /// Searches without a query are skipped by the scanner.
    pub fn is_runnable(&self) -> bool {
        !self.brand.trim().is_empty()
    }

    /// Case-insensitive substring filters over title and size.
    ///
    /// Containment is deliberately raw: include keyword `fit` matches
    /// `outfit`, and size `m` matches `size 10 / M`.
    pub fn matches_filters(&self, record: &ListingRecord) -> bool {
        let Some(title) = record.title() else {
            return false;
        };
        let title = title.to_lowercase();

        if contains_any(&title, &self.exclude_keywords) {
            return false;
        }

        if !self.include_keywords.is_empty() && !contains_any(&title, &self.include_keywords) {
            return false;
        }

        if !self.sizes.is_empty() && !contains_any(&record.size.to_lowercase(), &self.sizes) {
            return false;
        }

        true
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// A new listing that passed a search's filters, ready to be notified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub brand: String,
    pub link: String,
    pub title: String,
    pub listing: ListingRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nike_air_max() -> ListingRecord {
        ListingRecord::new("https://example.com/items/1", "Nike Air Max size 42").with_size("42")
    }

    #[test]
    fn test_matches_filters_include_exclude_and_size() {
        let spec = SearchSpec::new("nike")
            .include(["nike"])
            .exclude(["fake"])
            .with_sizes(["42"]);
        assert!(spec.matches_filters(&nike_air_max()));

        let spec = spec.exclude(["fake", "air"]);
        assert!(!spec.matches_filters(&nike_air_max()));
    }

    #[test]
    fn test_matches_filters_is_case_insensitive() {
        let record = ListingRecord::new("https://example.com/items/2", "Red HOODIE").with_size("M");
        let spec = SearchSpec::new("hoodies").include(["Hoodie"]).with_sizes(["m"]);
        assert!(spec.matches_filters(&record));
    }

    #[test]
    fn test_matches_filters_uses_raw_substrings() {
        let record = ListingRecord::new("https://example.com/items/3", "Summer outfit bundle")
            .with_size("size 10 / M");

        assert!(SearchSpec::new("x").include(["fit"]).matches_filters(&record));
        assert!(SearchSpec::new("x").with_sizes(["/ m"]).matches_filters(&record));
        assert!(!SearchSpec::new("x").with_sizes(["l"]).matches_filters(&record));
    }

    #[test]
    fn test_empty_filters_accept_everything_with_a_title() {
        let spec = SearchSpec::new("anything");
        assert!(spec.matches_filters(&nike_air_max()));

        let mut untitled = nike_air_max();
        untitled.title = None;
        assert!(!spec.matches_filters(&untitled));
    }

    #[test]
    fn test_missing_size_is_not_available() {
        let record = ListingRecord::new("https://example.com/items/4", "Plain tee");
        assert_eq!(record.size, NOT_AVAILABLE);
        assert!(!SearchSpec::new("x").with_sizes(["m"]).matches_filters(&record));
    }

    #[test]
    fn test_deserialize_defaults() {
        let record: ListingRecord =
            serde_json::from_str(r#"{"link": " https://example.com/items/5 ", "title": "Tee"}"#)
                .unwrap();
        assert_eq!(record.price, "N/A");
        assert_eq!(record.size, "N/A");
        assert_eq!(record.image_url, "");
        assert_eq!(record.link(), Some("https://example.com/items/5"));
    }

    #[test]
    fn test_link_with_line_break_is_unusable() {
        let record = ListingRecord::new(
            "https://example.com/items/1\nhttps://example.com/items/2",
            "Nike tee",
        );
        assert_eq!(record.link(), None);

        let record = ListingRecord::new("  https://example.com/items/1 ", "Nike tee");
        assert_eq!(record.link(), Some("https://example.com/items/1"));
    }

    #[test]
    fn test_blank_brand_is_not_runnable() {
        assert!(!SearchSpec::new("  ").is_runnable());
        assert!(SearchSpec::new("carhartt").is_runnable());
    }
}
