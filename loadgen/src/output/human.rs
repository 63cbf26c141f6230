use std::sync::Arc;

mod format;
mod progress;
mod summary;

use format::{format_duration_single, format_rate};
use progress::HumanProgress;
use summary::render;

use super::{OutputFormatter, ProgressFn, RunPlan};
use crate::summary::RunSummary;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, plan: &RunPlan<'_>) {
        println!("target: {}", plan.target);
        println!(
            "load: lps={} timeout={} duration={} concurrency={}",
            plan.lps,
            format_duration_single(plan.timeout),
            format_duration_single(plan.duration),
            plan.concurrency
        );
        println!();
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u| {
            let secs = u.elapsed.as_secs_f64().max(1e-9);
            let message = format!(
                "elapsed={} calls={} results={} results/s={} failed={}",
                format_duration_single(u.elapsed),
                u.calls_attempted,
                u.results_total,
                format_rate((u.results_total as f64) / secs),
                u.failures_total
            );
            progress.update(u.duration, u.elapsed, message);
        }))
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", render(summary));

        if !summary.all_succeeded() {
            eprintln!(
                "{} of {} results did not succeed",
                summary.failures_total(),
                summary.results_total
            );
        }

        Ok(())
    }
}
