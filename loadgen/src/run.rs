use std::time::Duration;

use anyhow::Context as _;
use loadgen_core::{Generator, ParamSet, result_channel};
use loadgen_tcp::TcpCaller;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output::{self, RunPlan};
use crate::run_error::RunError;
use crate::summary::Recorder;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let (result_tx, mut result_rx) = result_channel(args.result_capacity);
    let caller = TcpCaller::new(args.target.clone());
    let params = ParamSet::new(caller, args.timeout, args.lps, args.duration, result_tx);

    let generator = Generator::new(params)
        .context("invalid load parameters")
        .map_err(RunError::InvalidInput)?;

    out.print_header(&RunPlan {
        target: &args.target,
        lps: args.lps,
        timeout: args.timeout,
        duration: args.duration,
        concurrency: generator.concurrency(),
    });

    let mut recorder = Recorder::new().map_err(RunError::RuntimeError)?;
    let progress = out.progress();

    if !generator.start() {
        return Err(RunError::RuntimeError(anyhow::anyhow!(
            "load generator refused to start (status: {})",
            generator.status()
        )));
    }
    let started = Instant::now();

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    // The sink closes when the run ends, on its own or after a stop.
    loop {
        tokio::select! {
            result = result_rx.recv() => match result {
                Some(result) => recorder.record(&result),
                None => break,
            },
            _ = ticker.tick(), if progress.is_some() => {
                if let Some(progress) = &progress {
                    progress(recorder.progress(
                        started.elapsed(),
                        args.duration,
                        generator.call_count(),
                    ));
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                warn!("interrupted, stopping load generator");
                generator.stop().await;
            }
        }
    }

    generator.wait_stopped().await;
    let elapsed = started.elapsed();
    info!(
        status = %generator.status(),
        call_count = generator.call_count(),
        ?elapsed,
        "run finished"
    );

    let summary = recorder.finish(args.target, generator.call_count(), elapsed);
    out.print_summary(&summary)
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_outcome(summary.all_succeeded()))
}
