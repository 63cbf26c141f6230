use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use loadgen_tcp::{ServerReq, ServerResp, read_line, write_line};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

/// How long a shutdown waits for connections that are still being answered.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    malformed_total: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_malformed_total(&self) {
        self.malformed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn malformed_total(&self) -> u64 {
        self.malformed_total.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub bind: SocketAddr,
    /// Added before every answer, to simulate a slow system under test.
    pub delay: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            delay: Duration::ZERO,
        }
    }
}

/// Answers one request line: the evaluated formula, or a response with `err` set.
pub fn respond(line: &[u8]) -> ServerResp {
    match serde_json::from_slice::<ServerReq>(line) {
        Ok(req) => ServerResp::answer(&req),
        Err(err) => ServerResp::failure(format!("server: malformed request: {err}")),
    }
}

/// Accepts connections until `shutdown` resolves, answering one request per connection.
pub async fn serve<F>(listener: TcpListener, stats: TestServerStats, delay: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut conns = JoinSet::new();

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    conns.spawn(handle_conn(stream, stats.clone(), delay));
                }
                Err(err) => warn!(error = %err, "accept failed"),
            },
            Some(_) = conns.join_next(), if !conns.is_empty() => {}
        }
    }

    drop(listener);
    let drain = async { while conns.join_next().await.is_some() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        debug!(remaining = conns.len(), "aborting unfinished connections");
        conns.abort_all();
    }
}

async fn handle_conn(mut stream: TcpStream, stats: TestServerStats, delay: Duration) {
    let (read, mut write) = stream.split();
    let mut reader = BufReader::new(read);

    let resp = match read_line(&mut reader).await {
        Ok(line) => {
            stats.inc_requests_total();
            let resp = respond(&line);
            if resp.err.is_some() {
                stats.inc_malformed_total();
            }
            resp
        }
        Err(err) => {
            debug!(error = %err, "request read failed");
            ServerResp::failure(format!("server: request read error: {err}"))
        }
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let body = match serde_json::to_vec(&resp) {
        Ok(v) => v,
        Err(err) => {
            error!(error = %err, "failed to encode response");
            return;
        }
    };
    if let Err(err) = write_line(&mut write, &body).await {
        debug!(error = %err, "response write failed");
    }
}

pub struct TestServer {
    addr: SocketAddr,
    stats: TestServerStats,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(ServerOptions::default()).await
    }

    pub async fn start_with(options: ServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind(options.bind).await?;
        let addr = listener.local_addr()?;

        let stats = TestServerStats::default();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(serve(listener, stats.clone(), options.delay, async move {
            let _ = shutdown_rx.await;
        }));

        Ok(Self {
            addr,
            stats,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
