use std::io::IsTerminal as _;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Installs the stderr log subscriber.
///
/// Defaults to `warn` so engine chatter stays out of the summary; `--verbose` raises it to
/// `debug`, and `RUST_LOG` overrides both.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let directive = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
    .into();

    tracing_subscriber::fmt()
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(directive)
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))?;

    tracing::debug!("tracing is set up");
    Ok(())
}
