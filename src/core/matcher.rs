use crate::domain::model::{ListingRecord, MatchResult, SearchSpec, SeenSet};

/// Output of one match pass over a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchBatch {
    /// New listings passing the search's filters, in feed order.
    pub matches: Vec<MatchResult>,
    /// Links of `matches`; the caller merges these into its seen set.
    pub new_links: SeenSet,
}

impl MatchBatch {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Selects the records that are unseen and pass `spec`'s filters.
///
/// `seen` is never mutated. A link appearing more than once in `records`
/// produces at most one match. Records without a link or title are skipped.
pub fn filter_new(records: &[ListingRecord], spec: &SearchSpec, seen: &SeenSet) -> MatchBatch {
    let mut batch = MatchBatch::default();

    for record in records {
        let Some(link) = record.link() else {
            tracing::debug!(brand = %spec.brand, "Skipping listing without a link");
            continue;
        };
        if seen.contains(link) || batch.new_links.contains(link) {
            continue;
        }
        let Some(title) = record.title() else {
            tracing::debug!(brand = %spec.brand, link, "Skipping listing without a title");
            continue;
        };
        if !spec.matches_filters(record) {
            continue;
        }

        batch.new_links.insert(link.to_string());
        batch.matches.push(MatchResult {
            brand: spec.brand.clone(),
            link: link.to_string(),
            title: title.to_string(),
            listing: record.clone(),
        });
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed() -> Vec<ListingRecord> {
        vec![
            ListingRecord::new("https://example.com/items/3", "Nike Air Max size 42").with_size("42"),
            ListingRecord::new("https://example.com/items/2", "Nike hoodie fake").with_size("M"),
            ListingRecord::new("https://example.com/items/1", "Nike Dunk Low").with_size("42 / 8.5"),
        ]
    }

    #[test]
    fn test_filter_new_keeps_feed_order() {
        let spec = SearchSpec::new("nike").include(["nike"]).exclude(["fake"]);
        let batch = filter_new(&feed(), &spec, &SeenSet::new());

        let links: Vec<&str> = batch.matches.iter().map(|m| m.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://example.com/items/3", "https://example.com/items/1"]
        );
        assert_eq!(batch.new_links.len(), 2);
        assert!(batch.matches.iter().all(|m| m.brand == "nike"));
    }

    #[test]
    fn test_saturated_seen_set_yields_nothing() {
        let spec = SearchSpec::new("nike");
        let seen: SeenSet = feed().iter().filter_map(|r| r.link.clone()).collect();

        let batch = filter_new(&feed(), &spec, &seen);
        assert!(batch.is_empty());
        assert!(batch.new_links.is_empty());
    }

    #[test]
    fn test_duplicate_link_in_one_feed_matches_once() {
        let record = ListingRecord::new("https://example.com/items/9", "Carhartt jacket");
        let records = vec![record.clone(), record.clone().with_price("20.00 GBP"), record];

        let batch = filter_new(&records, &SearchSpec::new("carhartt"), &SeenSet::new());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.matches[0].listing.price, "N/A");
    }

    #[test]
    fn test_does_not_mutate_seen_set() {
        let seen: SeenSet = ["https://example.com/items/3".to_string()].into();
        let before = seen.clone();

        let batch = filter_new(&feed(), &SearchSpec::new("nike"), &seen);
        assert_eq!(seen, before);
        assert!(!batch.new_links.contains("https://example.com/items/3"));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_records_without_link_or_title_are_dropped() {
        let mut no_link = ListingRecord::new("", "Nike tee");
        no_link.link = None;
        let blank_link = ListingRecord::new("   ", "Nike tee");
        let mut no_title = ListingRecord::new("https://example.com/items/7", "");
        no_title.title = None;
        let blank_title = ListingRecord::new("https://example.com/items/8", "  ");
        let split_link = ListingRecord::new("https://example.com/items/5\nhttps://x/6", "Nike tee");

        let batch = filter_new(
            &[no_link, blank_link, no_title, blank_title, split_link],
            &SearchSpec::new("nike"),
            &SeenSet::new(),
        );
        assert!(batch.is_empty());
    }

    #[test]
    fn test_red_hoodie_scenario_across_two_runs() {
        let records = vec![ListingRecord::new("A", "red hoodie").with_size("M")];
        let spec = SearchSpec::new("hoodies").include(["hoodie"]).with_sizes(["m"]);

        let first = filter_new(&records, &spec, &SeenSet::new());
        assert_eq!(first.len(), 1);
        assert_eq!(first.matches[0].link, "A");

        let second = filter_new(&records, &spec, &first.new_links);
        assert!(second.is_empty());
    }

    #[test]
    fn test_filtered_out_duplicate_does_not_block_later_copy() {
        // Filters depend only on title/size, so identical copies share the verdict;
        // a differently titled copy under the same link still matches once.
        let records = vec![
            ListingRecord::new("https://example.com/items/5", "fake nike"),
            ListingRecord::new("https://example.com/items/5", "nike"),
        ];
        let spec = SearchSpec::new("nike").exclude(["fake"]);

        let batch = filter_new(&records, &spec, &SeenSet::new());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.matches[0].title, "nike");
    }
}
