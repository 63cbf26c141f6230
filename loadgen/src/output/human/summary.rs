use std::fmt::Write as _;

use super::format::{format_duration_single, format_micros, format_rate};
use crate::summary::RunSummary;

pub(crate) fn render(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(&mut out, "  target: {}", summary.target).ok();
    writeln!(
        &mut out,
        "  calls: attempted {} results {} (failed {})",
        summary.calls_attempted,
        summary.results_total,
        summary.failures_total()
    )
    .ok();

    if !summary.by_code.is_empty() {
        out.push_str("  codes:\n");
        for (code, count) in &summary.by_code {
            writeln!(&mut out, "    {:>4} {code}: {count}", code.code()).ok();
        }
    }

    match &summary.latency {
        Some(h) => {
            writeln!(
                &mut out,
                "  latency = p50={} p90={} p99={} mean={} max={} (n={})",
                format_micros(h.p50),
                format_micros(h.p90),
                format_micros(h.p99),
                format_micros(h.mean),
                format_micros(h.max),
                h.count
            )
            .ok();
        }
        None => out.push_str("  latency: n/a\n"),
    }

    writeln!(
        &mut out,
        "  rates: results/s={} elapsed={}",
        format_rate(summary.results_per_sec()),
        format_duration_single(summary.elapsed)
    )
    .ok();

    out
}
