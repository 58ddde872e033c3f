//! Metrics collection for updown-rs.
//!
//! Counts HTTP traffic, database round-trips, and vote-engine outcomes.
//! Everything is a relaxed atomic; aggregates are assembled on read.

use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    // === Request metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// Active HTTP requests
    pub http_requests_active: AtomicU64,
    /// HTTP requests by status class (2xx, 4xx, 5xx)
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds, with the matching count
    pub http_request_latency_us_total: AtomicU64,
    pub http_request_latency_count: AtomicU64,

    // === Database metrics ===
    /// Total database queries executed
    pub db_queries_total: AtomicU64,
    /// Database query errors
    pub db_errors_total: AtomicU64,

    // === Vote metrics ===
    /// Votes created (first write for a pair)
    pub votes_cast: AtomicU64,
    /// Votes overwritten in place (re-vote on an existing pair)
    pub votes_updated: AtomicU64,
    /// Votes removed
    pub votes_removed: AtomicU64,
    /// Vote writes rejected by validation
    pub votes_rejected: AtomicU64,
    /// Insert races resolved by retrying as an update
    pub vote_conflicts_retried: AtomicU64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        let class = match status_code {
            200..=299 => Some(&self.http_requests_2xx),
            400..=499 => Some(&self.http_requests_4xx),
            500..=599 => Some(&self.http_requests_5xx),
            _ => None,
        };
        if let Some(counter) = class {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
        self.http_request_latency_count
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Start tracking an active request.
    pub fn start_request(&self) {
        self.http_requests_active.fetch_add(1, Ordering::Relaxed);
    }

    /// End tracking an active request.
    pub fn end_request(&self) {
        self.http_requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a database query.
    pub fn record_db_query(&self, is_error: bool) {
        self.db_queries_total.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.db_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a vote write.
    pub fn record_vote_write(&self, created: bool) {
        let counter = if created {
            &self.votes_cast
        } else {
            &self.votes_updated
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a vote removal.
    pub fn record_vote_removed(&self) {
        self.votes_removed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a validation rejection.
    pub fn record_vote_rejected(&self) {
        self.votes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an insert race resolved as an update.
    pub fn record_conflict_retried(&self) {
        self.vote_conflicts_retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            http_requests_total: load(&self.http_requests_total),
            http_requests_active: load(&self.http_requests_active),
            http_requests_2xx: load(&self.http_requests_2xx),
            http_requests_4xx: load(&self.http_requests_4xx),
            http_requests_5xx: load(&self.http_requests_5xx),
            http_request_latency_avg_us: self.average_latency_us(),

            db_queries_total: load(&self.db_queries_total),
            db_errors_total: load(&self.db_errors_total),

            votes_cast: load(&self.votes_cast),
            votes_updated: load(&self.votes_updated),
            votes_removed: load(&self.votes_removed),
            votes_rejected: load(&self.votes_rejected),
            vote_conflicts_retried: load(&self.vote_conflicts_retried),
        }
    }

    /// Calculate average HTTP request latency.
    fn average_latency_us(&self) -> u64 {
        let total = self.http_request_latency_us_total.load(Ordering::Relaxed);
        let count = self.http_request_latency_count.load(Ordering::Relaxed);
        if count > 0 { total / count } else { 0 }
    }

    /// Export metrics in Prometheus text format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();

        write_metric(
            &mut out,
            "updown_http_requests_total",
            "Total HTTP requests",
            "counter",
            &[("", s.http_requests_total)],
        );
        write_metric(
            &mut out,
            "updown_http_requests_active",
            "Active HTTP requests",
            "gauge",
            &[("", s.http_requests_active)],
        );
        write_metric(
            &mut out,
            "updown_http_requests_by_status",
            "HTTP requests by status class",
            "counter",
            &[
                ("{status=\"2xx\"}", s.http_requests_2xx),
                ("{status=\"4xx\"}", s.http_requests_4xx),
                ("{status=\"5xx\"}", s.http_requests_5xx),
            ],
        );
        write_metric(
            &mut out,
            "updown_http_request_latency_avg_us",
            "Average request latency",
            "gauge",
            &[("", s.http_request_latency_avg_us)],
        );

        write_metric(
            &mut out,
            "updown_db_queries_total",
            "Total database queries",
            "counter",
            &[("", s.db_queries_total)],
        );
        write_metric(
            &mut out,
            "updown_db_errors_total",
            "Database errors",
            "counter",
            &[("", s.db_errors_total)],
        );

        write_metric(
            &mut out,
            "updown_votes_cast",
            "Votes created",
            "counter",
            &[("", s.votes_cast)],
        );
        write_metric(
            &mut out,
            "updown_votes_updated",
            "Votes overwritten in place",
            "counter",
            &[("", s.votes_updated)],
        );
        write_metric(
            &mut out,
            "updown_votes_removed",
            "Votes removed",
            "counter",
            &[("", s.votes_removed)],
        );
        write_metric(
            &mut out,
            "updown_votes_rejected",
            "Vote writes rejected by validation",
            "counter",
            &[("", s.votes_rejected)],
        );
        write_metric(
            &mut out,
            "updown_vote_conflicts_retried",
            "Insert races resolved as updates",
            "counter",
            &[("", s.vote_conflicts_retried)],
        );

        out
    }
}

/// One HELP/TYPE header plus a sample line per (label-set, value) pair.
fn write_metric(out: &mut String, name: &str, help: &str, kind: &str, samples: &[(&str, u64)]) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
    for (labels, value) in samples {
        let _ = writeln!(out, "{name}{labels} {value}");
    }
}

/// Snapshot of all metrics at a point in time.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    // HTTP
    pub http_requests_total: u64,
    pub http_requests_active: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,

    // Database
    pub db_queries_total: u64,
    pub db_errors_total: u64,

    // Votes
    pub votes_cast: u64,
    pub votes_updated: u64,
    pub votes_removed: u64,
    pub votes_rejected: u64,
    pub vote_conflicts_retried: u64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.http_requests_total.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.votes_cast.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_http_request_buckets_by_status() {
        let metrics = Metrics::new();

        metrics.record_http_request(200, Duration::from_millis(50));
        metrics.record_http_request(404, Duration::from_millis(10));
        metrics.record_http_request(500, Duration::from_millis(100));

        assert_eq!(metrics.http_requests_total.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.http_requests_2xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.http_requests_4xx.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.http_requests_5xx.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_active_request_tracking() {
        let metrics = Metrics::new();

        metrics.start_request();
        metrics.start_request();
        assert_eq!(metrics.http_requests_active.load(Ordering::Relaxed), 2);

        metrics.end_request();
        assert_eq!(metrics.http_requests_active.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_vote_write_splits_created_and_updated() {
        let metrics = Metrics::new();

        metrics.record_vote_write(true);
        metrics.record_vote_write(true);
        metrics.record_vote_write(false);

        assert_eq!(metrics.votes_cast.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.votes_updated.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = Metrics::new();
        metrics.votes_cast.fetch_add(10, Ordering::Relaxed);
        metrics.vote_conflicts_retried.fetch_add(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.votes_cast, 10);
        assert_eq!(snapshot.vote_conflicts_retried, 2);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_http_request(200, Duration::from_millis(50));
        metrics.record_vote_write(true);

        let prometheus = metrics.to_prometheus();
        assert!(prometheus.contains("# TYPE updown_http_requests_total counter"));
        assert!(prometheus.contains("updown_http_requests_total 1"));
        assert!(prometheus.contains("updown_votes_cast 1"));
        assert!(prometheus.contains("updown_http_requests_by_status{status=\"2xx\"} 1"));
    }

    #[test]
    fn test_average_latency() {
        let metrics = Metrics::new();
        metrics.record_http_request(200, Duration::from_micros(100));
        metrics.record_http_request(200, Duration::from_micros(200));
        assert_eq!(metrics.average_latency_us(), 150);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }
}
