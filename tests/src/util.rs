#![cfg(test)]
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use submergex_core::liveness::http::HeadRequester;
use submergex_core::process::{CommandRunner, ShellRunner};

pub fn shell() -> Arc<dyn CommandRunner> {
    Arc::new(ShellRunner::default())
}

/// Minimal HTTP/1.1 responder on 127.0.0.1.
///
/// `/ok` answers 200, `/moved` redirects to `/ok`, everything else is 404.
pub async fn http_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/");
                let response = match path {
                    "/ok" => "HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    "/moved" => {
                        "HTTP/1.1 301 Moved Permanently\r\nlocation: /ok\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    }
                    _ => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Sends `http://<live host>` to the local server and fails everything else,
/// so the real HTTP client can be driven by ordinary hostnames.
pub struct LocalRedirect {
    pub inner: Arc<dyn HeadRequester>,
    pub addr: SocketAddr,
    pub live: Vec<&'static str>,
}

#[async_trait]
impl HeadRequester for LocalRedirect {
    async fn head(&self, url: &str) -> anyhow::Result<u16> {
        let is_live = self.live.iter().any(|host| url == format!("http://{host}"));
        if !is_live {
            anyhow::bail!("unreachable: {url}");
        }
        self.inner.head(&format!("http://{}/ok", self.addr)).await
    }
}

/// Accepts connections and never writes a byte back.
pub async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// Points every request at `addr` over plain HTTP and records the URL it was asked for.
pub struct Recorded {
    pub inner: Arc<dyn HeadRequester>,
    pub addr: SocketAddr,
    pub asked: Mutex<Vec<String>>,
}

#[async_trait]
impl HeadRequester for Recorded {
    async fn head(&self, url: &str) -> anyhow::Result<u16> {
        self.asked.lock().unwrap().push(url.to_string());
        self.inner.head(&format!("http://{}/", self.addr)).await
    }
}
