use std::sync::Arc;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::summary::{ProgressUpdate, RunSummary};

mod human;
mod json;

pub(crate) type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// What a run is about to do, as printed before it starts.
#[derive(Debug, Clone)]
pub(crate) struct RunPlan<'a> {
    pub target: &'a str,
    pub lps: u32,
    pub timeout: Duration,
    pub duration: Duration,
    pub concurrency: u32,
}

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, plan: &RunPlan<'_>);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
