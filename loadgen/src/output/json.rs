use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write as _;

use super::{OutputFormatter, ProgressFn, RunPlan};
use crate::summary::RunSummary;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _plan: &RunPlan<'_>) {}

    fn progress(&self) -> Option<ProgressFn> {
        None
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let line = build_summary_line(summary);
        emit_json_line(&line)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub target: String,
    pub calls_attempted: i64,
    pub results_total: u64,
    pub failures_total: u64,
    /// Keyed by the numeric result code.
    pub codes: BTreeMap<u16, JsonCodeCount>,
    pub latency: Option<JsonLatencySummary>,
    pub elapsed_secs: f64,
    pub results_per_sec: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonCodeCount {
    pub name: &'static str,
    pub count: u64,
}

/// Microseconds.
#[derive(Debug, Serialize)]
pub(crate) struct JsonLatencySummary {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub mean: f64,
    pub max: f64,
    pub count: u64,
}

fn build_summary_line(summary: &RunSummary) -> JsonSummaryLine {
    JsonSummaryLine {
        kind: "summary",
        target: summary.target.clone(),
        calls_attempted: summary.calls_attempted,
        results_total: summary.results_total,
        failures_total: summary.failures_total(),
        codes: summary
            .by_code
            .iter()
            .map(|(code, count)| {
                (
                    code.code(),
                    JsonCodeCount {
                        name: code.plain(),
                        count: *count,
                    },
                )
            })
            .collect(),
        latency: summary.latency.as_ref().map(|h| JsonLatencySummary {
            p50: h.p50,
            p90: h.p90,
            p99: h.p99,
            mean: h.mean,
            max: h.max,
            count: h.count,
        }),
        elapsed_secs: summary.elapsed.as_secs_f64(),
        results_per_sec: summary.results_per_sec(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, line)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use loadgen_core::RetCode;

    use super::*;

    #[test]
    fn summary_line_keys_codes_by_number() {
        let summary = RunSummary {
            target: "t".to_string(),
            calls_attempted: 3,
            results_total: 3,
            by_code: BTreeMap::from([(RetCode::Success, 2), (RetCode::ErrorCall, 1)]),
            latency: None,
            elapsed: Duration::from_secs(1),
        };

        let value = match serde_json::to_value(build_summary_line(&summary)) {
            Ok(v) => v,
            Err(err) => panic!("serialize: {err}"),
        };

        assert_eq!(value["kind"], "summary");
        assert_eq!(value["failures_total"], 1);
        assert_eq!(value["codes"]["0"]["count"], 2);
        assert_eq!(value["codes"]["2001"]["name"], "Call Error");
        assert!(value["latency"].is_null());
    }
}
