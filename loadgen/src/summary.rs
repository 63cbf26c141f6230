use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context as _;
use hdrhistogram::Histogram;
use loadgen_core::{CallResult, RetCode};

/// Latency percentiles in microseconds.
#[derive(Debug, Clone)]
pub struct LatencySummary {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub target: String,
    /// Calls the generator dispatched, whether or not a result made it back.
    pub calls_attempted: i64,
    pub results_total: u64,
    pub by_code: BTreeMap<RetCode, u64>,
    pub latency: Option<LatencySummary>,
    pub elapsed: Duration,
}

impl RunSummary {
    #[must_use]
    pub fn failures_total(&self) -> u64 {
        self.by_code
            .iter()
            .filter(|(code, _)| !code.is_success())
            .map(|(_, n)| n)
            .sum()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures_total() == 0
    }

    #[must_use]
    pub fn results_per_sec(&self) -> f64 {
        (self.results_total as f64) / self.elapsed.as_secs_f64().max(1e-9)
    }
}

/// Snapshot handed to progress reporters while a run is in flight.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub elapsed: Duration,
    pub duration: Duration,
    pub calls_attempted: i64,
    pub results_total: u64,
    pub failures_total: u64,
}

/// Folds the result stream into counters and a latency histogram.
pub struct Recorder {
    latency_us: Histogram<u64>,
    by_code: BTreeMap<RetCode, u64>,
    results_total: u64,
    failures_total: u64,
}

impl Recorder {
    pub fn new() -> anyhow::Result<Self> {
        // Up to one hour, in microseconds.
        let latency_us = Histogram::<u64>::new_with_bounds(1, 3_600_000_000, 3)
            .context("failed to create latency histogram")?;

        Ok(Self {
            latency_us,
            by_code: BTreeMap::new(),
            results_total: 0,
            failures_total: 0,
        })
    }

    pub fn record(&mut self, result: &CallResult) {
        self.results_total += 1;
        *self.by_code.entry(result.code).or_insert(0) += 1;
        if !result.code.is_success() {
            self.failures_total += 1;
        }

        // Panic results never reached the target, so they carry no latency.
        if result.req.is_some() {
            let us = u64::try_from(result.elapsed.as_micros()).unwrap_or(u64::MAX);
            self.latency_us.saturating_record(us.max(1));
        }
    }

    #[must_use]
    pub fn progress(
        &self,
        elapsed: Duration,
        duration: Duration,
        calls_attempted: i64,
    ) -> ProgressUpdate {
        ProgressUpdate {
            elapsed,
            duration,
            calls_attempted,
            results_total: self.results_total,
            failures_total: self.failures_total,
        }
    }

    #[must_use]
    pub fn finish(self, target: String, calls_attempted: i64, elapsed: Duration) -> RunSummary {
        let h = &self.latency_us;
        let latency = (!h.is_empty()).then(|| LatencySummary {
            p50: h.value_at_quantile(0.50) as f64,
            p90: h.value_at_quantile(0.90) as f64,
            p99: h.value_at_quantile(0.99) as f64,
            mean: h.mean(),
            max: h.max() as f64,
            count: h.len(),
        });

        RunSummary {
            target,
            calls_attempted,
            results_total: self.results_total,
            by_code: self.by_code,
            latency,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use loadgen_core::RawReq;

    use super::*;

    fn req(id: i64) -> RawReq {
        RawReq {
            id,
            ..RawReq::default()
        }
    }

    fn recorder() -> Recorder {
        match Recorder::new() {
            Ok(v) => v,
            Err(err) => panic!("recorder: {err}"),
        }
    }

    #[test]
    fn counts_results_per_code() {
        let mut rec = recorder();
        for (id, code, ms) in [
            (1, RetCode::Success, 10),
            (2, RetCode::Success, 20),
            (3, RetCode::WarningCallTimeout, 100),
            (4, RetCode::ErrorResponse, 5),
        ] {
            rec.record(
                &CallResult::new(req(id), code, "").with_elapsed(Duration::from_millis(ms)),
            );
        }

        let summary = rec.finish("t".to_string(), 5, Duration::from_secs(2));
        assert_eq!(summary.results_total, 4);
        assert_eq!(summary.by_code.get(&RetCode::Success), Some(&2));
        assert_eq!(summary.by_code.get(&RetCode::WarningCallTimeout), Some(&1));
        assert_eq!(summary.failures_total(), 2);
        assert!(!summary.all_succeeded());
        assert!((summary.results_per_sec() - 2.0).abs() < 1e-9);

        let latency = match summary.latency {
            Some(v) => v,
            None => panic!("expected latency"),
        };
        assert_eq!(latency.count, 4);
        assert!(latency.max >= 99_000.0 && latency.max <= 101_000.0);
    }

    #[test]
    fn results_without_a_request_skip_latency() {
        let mut rec = recorder();
        rec.record(&CallResult {
            id: -1,
            req: None,
            resp: None,
            code: RetCode::FatalCall,
            msg: "async call panic".to_string(),
            elapsed: Duration::ZERO,
        });

        let summary = rec.finish("t".to_string(), 1, Duration::from_secs(1));
        assert_eq!(summary.by_code.get(&RetCode::FatalCall), Some(&1));
        assert!(summary.latency.is_none());
    }

    #[test]
    fn empty_run_has_no_latency_and_counts_as_success() {
        let summary = recorder().finish("t".to_string(), 0, Duration::from_secs(1));
        assert!(summary.latency.is_none());
        assert!(summary.all_succeeded());
    }
}
