//! In-process usage counters. Nothing here is persisted; the admin stats
//! endpoint reads a point-in-time summary.

use serde_json::{json, Value};
use shelf_query::MaterialFilter;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

const MAX_RECENT_SEARCHES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    pub filter: MaterialFilter,
    pub results: usize,
    pub at_unix: u64,
}

#[derive(Default)]
pub struct UsageMetrics {
    pub requests_total: AtomicU64,
    pub searches_total: AtomicU64,
    pub uploads_total: AtomicU64,
    pub reports_total: AtomicU64,
    pub suggestions_total: AtomicU64,
    pub logins_total: AtomicU64,
    recent_searches: Mutex<VecDeque<SearchSummary>>,
}

impl UsageMetrics {
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self) {
        self.logins_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upload(&self) {
        self.uploads_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suggestion(&self) {
        self.suggestions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search(&self, filter: &MaterialFilter, results: usize) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut recent) = self.recent_searches.lock() {
            if recent.len() == MAX_RECENT_SEARCHES {
                recent.pop_front();
            }
            recent.push_back(SearchSummary {
                filter: filter.clone(),
                results,
                at_unix: shelf_core::unix_now_secs(),
            });
        }
    }

    #[must_use]
    pub fn summary(&self) -> Value {
        let recent: Vec<Value> = self
            .recent_searches
            .lock()
            .map(|q| {
                q.iter()
                    .map(|s| {
                        json!({
                            "filter": s.filter,
                            "results": s.results,
                            "at_unix": s.at_unix,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        json!({
            "requests_total": self.requests_total.load(Ordering::Relaxed),
            "searches_total": self.searches_total.load(Ordering::Relaxed),
            "uploads_total": self.uploads_total.load(Ordering::Relaxed),
            "reports_total": self.reports_total.load(Ordering::Relaxed),
            "suggestions_total": self.suggestions_total.load(Ordering::Relaxed),
            "logins_total": self.logins_total.load(Ordering::Relaxed),
            "recent_searches": recent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_summarize() {
        let metrics = UsageMetrics::default();
        metrics.record_request();
        metrics.record_request();
        metrics.record_upload();
        metrics.record_search(&MaterialFilter::default(), 3);

        let summary = metrics.summary();
        assert_eq!(summary["requests_total"], 2);
        assert_eq!(summary["uploads_total"], 1);
        assert_eq!(summary["searches_total"], 1);
        assert_eq!(summary["recent_searches"][0]["results"], 3);
    }

    #[test]
    fn recent_searches_ring_is_bounded() {
        let metrics = UsageMetrics::default();
        for _ in 0..(MAX_RECENT_SEARCHES + 10) {
            metrics.record_search(&MaterialFilter::default(), 0);
        }
        let summary = metrics.summary();
        let recent = summary["recent_searches"].as_array().expect("array");
        assert_eq!(recent.len(), MAX_RECENT_SEARCHES);
    }
}
