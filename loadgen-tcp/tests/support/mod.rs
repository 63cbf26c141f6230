#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use loadgen_tcp::{ServerReq, ServerResp, read_line, write_line};
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How the stub target treats each connection.
#[derive(Debug, Clone, Copy)]
pub enum Mode {
    Answer,
    /// Answers with a wrong result.
    Lie,
    /// Reads the request, then never answers.
    Stall,
    /// Closes the connection right after reading the request.
    Hangup,
}

pub struct Stub {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl Stub {
    pub async fn start(mode: Mode) -> Self {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(v) => v,
            Err(err) => panic!("bind stub: {err}"),
        };
        let addr = match listener.local_addr() {
            Ok(v) => v,
            Err(err) => panic!("stub addr: {err}"),
        };

        let task = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let (read, mut write) = stream.split();
                    let mut reader = BufReader::new(read);
                    let Ok(line) = read_line(&mut reader).await else {
                        return;
                    };
                    let Ok(req) = serde_json::from_slice::<ServerReq>(&line) else {
                        return;
                    };

                    let resp = match mode {
                        Mode::Answer => ServerResp::answer(&req),
                        Mode::Lie => {
                            let mut resp = ServerResp::answer(&req);
                            resp.result += 1;
                            resp
                        }
                        Mode::Stall => {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            return;
                        }
                        Mode::Hangup => return,
                    };

                    if let Ok(body) = serde_json::to_vec(&resp) {
                        let _ = write_line(&mut write, &body).await;
                    }
                });
            }
        });

        Self { addr, task }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.task.abort();
    }
}
