//! Rolling latency time series
//!
//! The daemon may deliver latency data two ways: a full history backfill
//! (poll response, or push on reconnect) or a single live tick. The series
//! absorbs both without the consumer needing to know which path fired.

use std::collections::VecDeque;

use tunnelmon_api::{LatencySample, LatencyStats};

/// Maximum number of retained samples
pub const WINDOW_LEN: usize = 60;
/// Age horizon of the visible window in seconds
pub const WINDOW_SECS: f64 = 60.0;

/// Bounded rolling buffer of latency samples with a parallel average series
#[derive(Debug, Clone, Default)]
pub struct LatencySeries {
    samples: VecDeque<LatencySample>,
    /// Server-provided average mirrored per point; `None` where the server
    /// sent no stats, so the average line is absent rather than zero
    average: VecDeque<Option<f64>>,
    stats: Option<LatencyStats>,
}

impl LatencySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole buffer from server-supplied history.
    ///
    /// Samples older than `now - 60s` are dropped, the rest sorted ascending
    /// by timestamp; if more than 60 remain only the most recent 60 are kept.
    pub fn replace_from_history(
        &mut self,
        history: &[LatencySample],
        stats: Option<&LatencyStats>,
        now: f64,
    ) {
        let cutoff = now - WINDOW_SECS;
        let mut recent: Vec<LatencySample> = history
            .iter()
            .filter(|s| s.timestamp > cutoff)
            .copied()
            .collect();
        recent.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        if recent.len() > WINDOW_LEN {
            recent.drain(..recent.len() - WINDOW_LEN);
        }

        let avg = stats.map(|s| s.avg);
        self.average = recent.iter().map(|_| avg).collect();
        self.samples = recent.into();
        self.record_stats(stats);
    }

    /// Append one live sample, evicting from the front past the window cap
    pub fn append_live(&mut self, sample: LatencySample, stats: Option<&LatencyStats>) {
        self.samples.push_back(sample);
        self.average.push_back(stats.map(|s| s.avg));

        while self.samples.len() > WINDOW_LEN {
            self.samples.pop_front();
            self.average.pop_front();
        }

        self.record_stats(stats);
    }

    /// Reflect the last received server statistics; a payload without stats
    /// keeps the previous value (display-only, never recomputed locally)
    pub fn record_stats(&mut self, stats: Option<&LatencyStats>) {
        if let Some(s) = stats {
            self.stats = Some(*s);
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = &LatencySample> {
        self.samples.iter()
    }

    /// Average-line values, index-aligned with `samples()`
    pub fn average(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.average.iter().copied()
    }

    pub fn last(&self) -> Option<&LatencySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Last received server-side statistics, if any
    pub fn stats(&self) -> Option<&LatencyStats> {
        self.stats.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: f64, ms: f64) -> LatencySample {
        LatencySample {
            timestamp: ts,
            latency_ms: Some(ms),
        }
    }

    fn stats(avg: f64) -> LatencyStats {
        LatencyStats {
            avg,
            min: 10.0,
            max: 90.0,
            count: 10,
        }
    }

    #[test]
    fn test_replace_filters_and_sorts() {
        let mut series = LatencySeries::new();
        let now = 1000.0;

        // Out of order, with one stale sample outside the window
        let history = vec![
            sample(990.0, 30.0),
            sample(930.0, 50.0), // 70s old, dropped
            sample(960.0, 40.0),
            sample(995.0, 20.0),
        ];
        series.replace_from_history(&history, None, now);

        let timestamps: Vec<f64> = series.samples().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![960.0, 990.0, 995.0]);

        // Monotonically non-decreasing labels
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_replace_caps_to_window() {
        let mut series = LatencySeries::new();
        let now = 1000.0;

        // 61 samples inside the window; only the most recent 60 survive
        let history: Vec<LatencySample> =
            (0..61).map(|i| sample(941.0 + i as f64, 25.0)).collect();
        series.replace_from_history(&history, None, now);

        assert_eq!(series.len(), WINDOW_LEN);
        assert_eq!(series.samples().next().unwrap().timestamp, 942.0);
        assert_eq!(series.last().unwrap().timestamp, 1001.0);
    }

    #[test]
    fn test_replace_fills_average_from_stats() {
        let mut series = LatencySeries::new();
        series.replace_from_history(
            &[sample(990.0, 30.0), sample(995.0, 50.0)],
            Some(&stats(40.2)),
            1000.0,
        );

        let avg: Vec<Option<f64>> = series.average().collect();
        assert_eq!(avg, vec![Some(40.2), Some(40.2)]);
    }

    #[test]
    fn test_replace_without_stats_leaves_average_absent() {
        let mut series = LatencySeries::new();
        series.replace_from_history(&[sample(990.0, 30.0)], None, 1000.0);
        assert_eq!(series.average().collect::<Vec<_>>(), vec![None]);
    }

    #[test]
    fn test_append_evicts_fifo() {
        let mut series = LatencySeries::new();
        for i in 0..WINDOW_LEN {
            series.append_live(sample(i as f64, 20.0), None);
        }
        assert_eq!(series.len(), WINDOW_LEN);

        series.append_live(sample(60.0, 35.0), Some(&stats(28.0)));
        assert_eq!(series.len(), WINDOW_LEN);
        // Oldest entry evicted first
        assert_eq!(series.samples().next().unwrap().timestamp, 1.0);
        assert_eq!(series.last().unwrap().timestamp, 60.0);
        // Average series stays index-aligned
        assert_eq!(series.average().count(), WINDOW_LEN);
        assert_eq!(series.average().last().unwrap(), Some(28.0));
    }

    #[test]
    fn test_stats_reflect_last_received() {
        let mut series = LatencySeries::new();
        series.append_live(sample(1.0, 20.0), Some(&stats(33.0)));
        assert_eq!(series.stats().unwrap().avg, 33.0);

        // A payload without stats keeps the previous value
        series.append_live(sample(2.0, 25.0), None);
        assert_eq!(series.stats().unwrap().avg, 33.0);
    }

    #[test]
    fn test_failed_probe_sample_is_retained() {
        let mut series = LatencySeries::new();
        series.append_live(
            LatencySample {
                timestamp: 1.0,
                latency_ms: None,
            },
            None,
        );
        assert_eq!(series.len(), 1);
        assert!(series.last().unwrap().latency_ms.is_none());
    }
}
