use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut delay = Duration::ZERO;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bind" => {
                let addr = args.next().ok_or_else(|| {
                    anyhow::anyhow!("--bind requires an address, e.g. 127.0.0.1:0")
                })?;
                bind_addr = addr.parse()?;
            }
            "--delay" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--delay requires a duration, e.g. 50ms"))?;
                delay = humantime::parse_duration(&value)?;
            }
            "-h" | "--help" => {
                eprintln!(
                    "loadgen-testserver\n\nUSAGE:\n  loadgen-testserver [--bind 127.0.0.1:0] [--delay 0ms]\n\nOUTPUT:\n  Prints TCP_ADDR=<host:port> to stdout once ready."
                );
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    println!("TCP_ADDR={addr}");

    let stats = loadgen_testserver::TestServerStats::default();
    loadgen_testserver::serve(listener, stats, delay, async move {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    Ok(())
}
