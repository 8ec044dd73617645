use crate::core::matcher::filter_new;
use crate::domain::model::{ListingRecord, MatchResult, SearchSpec, SeenSet};
use crate::domain::ports::{ListingSource, Notifier, SeenStore};
use crate::utils::error::{Result, ScanError};
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// When the seen set is written back to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// One save after every search has been processed.
    #[default]
    EndOfScan,
    /// Save after each notification, plus the final save.
    PerMatch,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub fetch_timeout: Duration,
    /// Upper bound on a single notifier call; exceeding it counts as a notifier failure.
    pub notify_timeout: Duration,
    /// Minimum gap between two consecutive notifier calls.
    pub notify_delay: Duration,
    pub commit: CommitPolicy,
    /// Notify only the first match of each search; later matches wait for the next run.
    pub first_match_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(45),
            notify_timeout: Duration::from_secs(10),
            notify_delay: Duration::from_millis(1500),
            commit: CommitPolicy::EndOfScan,
            first_match_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchStatus {
    Skipped,
    TimedOut,
    Failed {
        reason: String,
    },
    Completed {
        listings: usize,
        matches: usize,
        notified: usize,
        notify_failures: usize,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub brand: String,
    pub status: SearchStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub searches: Vec<SearchReport>,
    pub total_matches: usize,
    pub seen_before: usize,
    pub seen_after: usize,
}

impl ScanReport {
    pub fn notified(&self) -> usize {
        self.searches
            .iter()
            .map(|s| match s.status {
                SearchStatus::Completed { notified, .. } => notified,
                _ => 0,
            })
            .sum()
    }

    /// Searches that timed out or failed; they are retried by the next run.
    pub fn failed_searches(&self) -> usize {
        self.searches
            .iter()
            .filter(|s| {
                matches!(
                    s.status,
                    SearchStatus::TimedOut | SearchStatus::Failed { .. }
                )
            })
            .count()
    }
}

/// Enforces the minimum gap between notifier calls.
#[derive(Debug)]
struct NotifyPacer {
    delay: Duration,
    last: Option<Instant>,
}

impl NotifyPacer {
    fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    async fn wait(&mut self) {
        if let Some(last) = self.last {
            tokio::time::sleep_until(last + self.delay).await;
        }
        self.last = Some(Instant::now());
    }
}

/// Runs every configured search once: fetch, match, notify, commit.
pub struct Scanner<L: ListingSource, N: Notifier, S: SeenStore> {
    source: L,
    notifier: N,
    store: S,
    options: ScanOptions,
    monitor: SystemMonitor,
}

impl<L: ListingSource, N: Notifier, S: SeenStore> Scanner<L, N, S> {
    pub fn new(source: L, notifier: N, store: S, options: ScanOptions) -> Self {
        Self::new_with_monitoring(source, notifier, store, options, false)
    }

    pub fn new_with_monitoring(
        source: L,
        notifier: N,
        store: S,
        options: ScanOptions,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            options,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Scans `searches` in order.
    ///
    /// Fetch and notifier failures are recorded in the report and never stop
    /// the scan; only a store load/save failure returns `Err`.
    pub async fn run(&self, searches: &[SearchSpec]) -> Result<ScanReport> {
        let started_at = Utc::now();

        let mut seen = self.store.load().await?;
        let seen_before = seen.len();
        tracing::info!("📚 Loaded {} previously seen items", seen_before);

        let mut pacer = NotifyPacer::new(self.options.notify_delay);
        let mut reports = Vec::with_capacity(searches.len());
        let mut total_matches = 0;

        for (index, spec) in searches.iter().enumerate() {
            let status = self.scan_search(spec, &mut seen, &mut pacer).await?;
            if let SearchStatus::Completed { matches, .. } = status {
                total_matches += matches;
            }

            self.monitor.log_stats(&format!(
                "Search {}/{} '{}'",
                index + 1,
                searches.len(),
                spec.brand
            ));
            reports.push(SearchReport {
                brand: spec.brand.clone(),
                status,
            });
        }

        // 全部搜尋結束後一次寫回
        self.store.save(&seen).await?;
        self.monitor.log_final_stats();

        let report = ScanReport {
            started_at,
            finished_at: Utc::now(),
            searches: reports,
            total_matches,
            seen_before,
            seen_after: seen.len(),
        };

        tracing::info!(
            "🏁 Scan complete: {} new matches, {} notified, {} failed searches",
            report.total_matches,
            report.notified(),
            report.failed_searches()
        );
        Ok(report)
    }

    async fn scan_search(
        &self,
        spec: &SearchSpec,
        seen: &mut SeenSet,
        pacer: &mut NotifyPacer,
    ) -> Result<SearchStatus> {
        if !spec.is_runnable() {
            tracing::warn!("⚠️ Skipping search without a brand/query");
            return Ok(SearchStatus::Skipped);
        }

        tracing::info!(brand = %spec.brand, "🔎 Fetching listings");
        let records = match self.fetch(spec).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(brand = %spec.brand, error = %e, "❌ Search skipped");
                return Ok(match e {
                    ScanError::FetchTimeout { .. } => SearchStatus::TimedOut,
                    other => SearchStatus::Failed {
                        reason: other.to_string(),
                    },
                });
            }
        };

        let mut batch = filter_new(&records, spec, seen);
        if self.options.first_match_only && batch.len() > 1 {
            batch.matches.truncate(1);
            batch.new_links = batch.matches.iter().map(|m| m.link.clone()).collect();
        }
        tracing::info!(
            brand = %spec.brand,
            "Found {} listings, {} new matches",
            records.len(),
            batch.len()
        );

        let mut notified = 0;
        let mut notify_failures = 0;
        for found in &batch.matches {
            pacer.wait().await;
            match self.notify(found).await {
                Ok(()) => {
                    notified += 1;
                    tracing::info!(
                        brand = %found.brand,
                        link = %found.link,
                        "✅ Notified: {}",
                        found.title
                    );
                }
                Err(e) => {
                    // 通知失敗仍視為已看過，不會在下次重送
                    notify_failures += 1;
                    tracing::warn!(
                        brand = %found.brand,
                        link = %found.link,
                        error = %e,
                        "❌ Notification failed"
                    );
                }
            }

            if self.options.commit == CommitPolicy::PerMatch {
                seen.insert(found.link.clone());
                self.store.save(seen).await?;
            }
        }

        let matches = batch.len();
        seen.extend(batch.new_links);

        Ok(SearchStatus::Completed {
            listings: records.len(),
            matches,
            notified,
            notify_failures,
        })
    }

    async fn notify(&self, found: &MatchResult) -> Result<()> {
        let timeout = self.options.notify_timeout;
        match tokio::time::timeout(timeout, self.notifier.notify(found)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::NotifierFailure {
                link: found.link.clone(),
                message: format!("no response within {}s", timeout.as_secs()),
            }),
        }
    }

    async fn fetch(&self, spec: &SearchSpec) -> Result<Vec<ListingRecord>> {
        let timeout = self.options.fetch_timeout;
        match tokio::time::timeout(timeout, self.source.fetch(&spec.brand)).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::FetchTimeout {
                query: spec.brand.clone(),
                seconds: timeout.as_secs(),
            }),
        }
    }
}
