use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct MapMetrics {
    // Request lifecycle
    pub total_requests_issued: AtomicUsize,
    pub total_requests_resolved: AtomicUsize,
    pub total_chunks_unavailable: AtomicUsize,
    pub total_sampler_failures: AtomicUsize,
    pub total_stale_resolutions: AtomicUsize,
    pub total_request_latency_us: AtomicU64,
    pub max_request_latency_us: AtomicU64,

    // Cache
    pub total_cache_hits: AtomicUsize,
    pub total_cache_misses: AtomicUsize,
    pub total_chunks_evicted: AtomicUsize,

    // Drawing
    pub total_full_draws: AtomicUsize,
    pub total_draw_time_us: AtomicU64,
    pub max_draw_time_us: AtomicU64,
    pub total_tile_repaints: AtomicUsize,
    pub total_markers_drawn: AtomicUsize,
    pub total_markers_clamped: AtomicUsize,

    // Session
    pub start_time: Option<Instant>,
    pub config_summary: String,
}

impl MapMetrics {
    pub fn new(config_summary: String) -> Self {
        Self {
            start_time: Some(Instant::now()),
            config_summary,
            ..Default::default()
        }
    }

    pub fn record_request_issued(&self) {
        self.total_requests_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request_resolved(&self, latency: Duration) {
        self.total_requests_resolved.fetch_add(1, Ordering::Relaxed);
        let us = latency.as_micros() as u64;
        self.total_request_latency_us.fetch_add(us, Ordering::Relaxed);
        self.max_request_latency_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn record_unavailable(&self) {
        self.total_chunks_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sampler_failure(&self) {
        self.total_sampler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_resolution(&self) {
        self.total_stale_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.total_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.total_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize) {
        self.total_chunks_evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_full_draw(&self, duration: Duration) {
        self.total_full_draws.fetch_add(1, Ordering::Relaxed);
        let us = duration.as_micros() as u64;
        self.total_draw_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_draw_time_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn record_tile_repaint(&self) {
        self.total_tile_repaints.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_marker(&self, clamped: bool) {
        self.total_markers_drawn.fetch_add(1, Ordering::Relaxed);
        if clamped {
            self.total_markers_clamped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();

        let issued = self.total_requests_issued.load(Ordering::Relaxed);
        let resolved = self.total_requests_resolved.load(Ordering::Relaxed);
        let unavailable = self.total_chunks_unavailable.load(Ordering::Relaxed);
        let failures = self.total_sampler_failures.load(Ordering::Relaxed);
        let stale = self.total_stale_resolutions.load(Ordering::Relaxed);
        let latency_total = self.total_request_latency_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let latency_max = self.max_request_latency_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let latency_avg = if resolved > 0 { latency_total / resolved as f64 } else { 0.0 };

        let hits = self.total_cache_hits.load(Ordering::Relaxed);
        let misses = self.total_cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 { (hits as f64 / lookups as f64) * 100.0 } else { 0.0 };
        let evicted = self.total_chunks_evicted.load(Ordering::Relaxed);

        let draws = self.total_full_draws.load(Ordering::Relaxed);
        let draw_total = self.total_draw_time_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let draw_max = self.max_draw_time_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let draw_avg = if draws > 0 { draw_total / draws as f64 } else { 0.0 };
        let repaints = self.total_tile_repaints.load(Ordering::Relaxed);
        let markers = self.total_markers_drawn.load(Ordering::Relaxed);
        let clamped = self.total_markers_clamped.load(Ordering::Relaxed);

        format!(
            "Voxmap Metrics Report\n\
             =====================\n\
             Configuration: {}\n\
             Session Duration: {:.2?}\n\n\
             [Requests]\n\
             Issued: {}\n\
             Resolved: {}\n\
               - Unavailable: {}\n\
               - Sampler Failures: {}\n\
               - Discarded (evicted in flight): {}\n\
             Avg Latency: {:.2} ms\n\
             Max Latency: {:.2} ms\n\n\
             [Cache]\n\
             Hits: {}\n\
             Misses: {}\n\
             Hit Rate: {:.1}%\n\
             Evicted: {}\n\n\
             [Drawing]\n\
             Full Draws: {}\n\
             Avg Draw Time: {:.2} ms\n\
             Max Draw Time: {:.2} ms\n\
             Tile Repaints: {}\n\
             Markers Drawn: {} ({} clamped)\n",
            self.config_summary,
            uptime,
            issued, resolved, unavailable, failures, stale,
            latency_avg, latency_max,
            hits, misses, hit_rate, evicted,
            draws, draw_avg, draw_max, repaints,
            markers, clamped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let metrics = MapMetrics::new("flat 256x256".to_string());
        metrics.record_request_issued();
        metrics.record_request_issued();
        metrics.record_request_resolved(Duration::from_millis(4));
        metrics.record_cache_hit();
        metrics.record_cache_miss();
        metrics.record_marker(true);

        let report = metrics.generate_report();
        assert!(report.contains("Configuration: flat 256x256"));
        assert!(report.contains("Issued: 2"));
        assert!(report.contains("Resolved: 1"));
        assert!(report.contains("Hit Rate: 50.0%"));
        assert!(report.contains("Markers Drawn: 1 (1 clamped)"));
        assert_eq!(metrics.max_request_latency_us.load(Ordering::Relaxed), 4000);
    }
}
