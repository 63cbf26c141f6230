use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bar while running, text summary at the end.
    HumanReadable,
    /// A single JSON summary line on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "loadgen",
    version,
    about = "Constant-rate load generator",
    long_about = "loadgen issues calls against a target at a fixed rate (loads per second) for a fixed duration.\n\nEvery call is bounded by a timeout and classified into a result code; the number of calls in flight is capped at timeout / (1s / lps) + 1.",
    after_help = "Examples:\n  loadgen run --target 127.0.0.1:8080 --lps 100 --duration 10s\n  loadgen run --target 127.0.0.1:8080 --lps 500 --timeout 50ms --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drive load against a TCP arithmetic target
    #[command(
        long_about = "Send random arithmetic requests to a TCP target at a fixed rate and summarize the results.\n\nExits with 10 when any call did not succeed."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target address (host:port)
    #[arg(long, env = "LOADGEN_TARGET")]
    pub target: String,

    /// Target load, in calls per second
    #[arg(long, env = "LOADGEN_LPS", default_value_t = 100)]
    pub lps: u32,

    /// Per-call timeout (e.g. 50ms, 1s)
    #[arg(long, env = "LOADGEN_TIMEOUT", value_parser = humantime::parse_duration, default_value = "1s")]
    pub timeout: Duration,

    /// Run duration (e.g. 10s, 250ms, 1m)
    #[arg(long, env = "LOADGEN_DURATION", value_parser = humantime::parse_duration, default_value = "10s")]
    pub duration: Duration,

    /// Result buffer size; results beyond it are discarded while the consumer lags
    #[arg(long, env = "LOADGEN_RESULT_CAPACITY", default_value_t = 4096)]
    pub result_capacity: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log engine events at debug level (RUST_LOG overrides)
    #[arg(long, short)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> Result<RunArgs, clap::Error> {
        let mut argv = vec!["loadgen", "run", "--target", "localhost:1"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).map(|cli| match cli.command {
            Command::Run(args) => args,
        })
    }

    #[test]
    fn durations_accept_common_units() {
        for (input, want) in [
            ("250ms", Duration::from_millis(250)),
            ("10s", Duration::from_secs(10)),
            ("1m", Duration::from_secs(60)),
            ("2h", Duration::from_secs(2 * 60 * 60)),
            ("1s 500ms", Duration::from_millis(1500)),
        ] {
            match run_args(&["--duration", input]) {
                Ok(args) => assert_eq!(args.duration, want, "{input}"),
                Err(err) => panic!("failed to parse --duration {input}: {err}"),
            }
        }
    }

    #[test]
    fn durations_reject_invalid_values() {
        for input in ["", "abc", "10x", "-1s", "5"] {
            assert!(run_args(&["--timeout", input]).is_err(), "{input}");
        }
    }

    #[test]
    fn cli_parses_run_flags() {
        let parsed = Cli::try_parse_from([
            "loadgen",
            "run",
            "--target",
            "127.0.0.1:9000",
            "--lps",
            "250",
            "--timeout",
            "50ms",
            "--duration",
            "3s",
            "--result-capacity",
            "16",
            "--output",
            "json",
            "-v",
        ]);

        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Run(args) = cli.command;
        assert_eq!(args.target, "127.0.0.1:9000");
        assert_eq!(args.lps, 250);
        assert_eq!(args.timeout, Duration::from_millis(50));
        assert_eq!(args.duration, Duration::from_secs(3));
        assert_eq!(args.result_capacity, 16);
        assert!(matches!(args.output, OutputFormat::Json));
        assert!(args.verbose);
    }

    #[test]
    fn cli_run_defaults() {
        let parsed = Cli::try_parse_from(["loadgen", "run", "--target", "localhost:1"]);
        let cli = match parsed {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        };

        let Command::Run(args) = cli.command;
        assert_eq!(args.timeout, Duration::from_secs(1));
        assert_eq!(args.duration, Duration::from_secs(10));
        assert!(matches!(args.output, OutputFormat::HumanReadable));
        assert!(!args.verbose);
    }

    #[test]
    fn cli_rejects_bad_durations() {
        let parsed = Cli::try_parse_from([
            "loadgen",
            "run",
            "--target",
            "localhost:1",
            "--timeout",
            "10x",
        ]);
        assert!(parsed.is_err());
    }
}
