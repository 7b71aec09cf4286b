//! Translation metrics and observability module.
//!
//! Counters for translation API traffic and sync outcomes. Each orchestrator
//! owns one collector and shares it with its translation client.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of HTTP attempts made to the translation API
    api_calls: AtomicUsize,

    /// Number of HTTP attempts that failed (retried or not)
    api_failures: AtomicUsize,

    /// Syncs that returned without calling the API
    syncs_skipped: AtomicUsize,

    /// Syncs that committed at least one translation
    syncs_committed: AtomicUsize,

    /// Syncs that aborted with an error
    syncs_failed: AtomicUsize,

    /// Number of (field, locale) values written
    translations_written: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_skipped(&self) {
        self.syncs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_committed(&self, translations: usize) {
        self.syncs_committed.fetch_add(1, Ordering::Relaxed);
        self.translations_written
            .fetch_add(translations, Ordering::Relaxed);
    }

    pub fn record_sync_failed(&self) {
        self.syncs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn syncs_skipped(&self) -> usize {
        self.syncs_skipped.load(Ordering::Relaxed)
    }

    pub fn syncs_committed(&self) -> usize {
        self.syncs_committed.load(Ordering::Relaxed)
    }

    pub fn syncs_failed(&self) -> usize {
        self.syncs_failed.load(Ordering::Relaxed)
    }

    pub fn translations_written(&self) -> usize {
        self.translations_written.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            api_calls: calls,
            api_failures: failures,
            api_success_rate,
            syncs_skipped: self.syncs_skipped(),
            syncs_committed: self.syncs_committed(),
            syncs_failed: self.syncs_failed(),
            translations_written: self.translations_written(),
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub api_calls: usize,
    pub api_failures: usize,

    /// API success rate as a percentage (0-100)
    pub api_success_rate: f64,

    pub syncs_skipped: usize,
    pub syncs_committed: usize,
    pub syncs_failed: usize,
    pub translations_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = TranslationMetrics::new();

        assert_eq!(metrics.api_calls(), 0);
        assert_eq!(metrics.api_failures(), 0);
        assert_eq!(metrics.syncs_skipped(), 0);
        assert_eq!(metrics.syncs_committed(), 0);
        assert_eq!(metrics.syncs_failed(), 0);
        assert_eq!(metrics.translations_written(), 0);
    }

    #[test]
    fn test_record_sync_committed_counts_translations() {
        let metrics = TranslationMetrics::new();

        metrics.record_sync_committed(3);
        metrics.record_sync_committed(2);

        assert_eq!(metrics.syncs_committed(), 2);
        assert_eq!(metrics.translations_written(), 5);
    }

    #[test]
    fn test_report_empty() {
        let report = TranslationMetrics::new().report();

        assert_eq!(report.api_calls, 0);
        assert_eq!(report.api_success_rate, 0.0);
    }

    #[test]
    fn test_report_api_success_rate() {
        let metrics = TranslationMetrics::new();

        // 4 calls, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_api_call();
        }
        metrics.record_api_failure();

        let report = metrics.report();
        assert_eq!(report.api_calls, 4);
        assert_eq!(report.api_failures, 1);
        assert_eq!(report.api_success_rate, 75.0);
    }

    #[test]
    fn test_report_all_api_failures() {
        let metrics = TranslationMetrics::new();

        metrics.record_api_call();
        metrics.record_api_failure();
        metrics.record_sync_failed();
        metrics.record_sync_skipped();

        let report = metrics.report();
        assert_eq!(report.api_success_rate, 0.0);
        assert_eq!(report.syncs_failed, 1);
        assert_eq!(report.syncs_skipped, 1);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = TranslationMetrics::new();
        metrics.record_sync_committed(1);

        let json = serde_json::to_value(metrics.report()).expect("Should serialize");
        assert_eq!(json["translations_written"], 1);
        assert_eq!(json["syncs_committed"], 1);
    }
}
