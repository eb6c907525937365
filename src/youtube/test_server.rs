//! Local HTTP/1.1 responder serving canned replies to the API clients in tests

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// What the server saw for one request
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    /// Path and query, e.g. `/playlistItems?part=snippet&...`
    pub target: String,
    /// Header names are lowercased
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn has_query(&self, pair: &str) -> bool {
        self.target
            .split_once('?')
            .map(|(_, query)| query.split('&').any(|p| p == pair))
            .unwrap_or(false)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

type Responder = dyn Fn(&SeenRequest) -> (u16, String) + Send + Sync;

pub struct TestServer {
    base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestServer {
    /// Bind to an ephemeral port and answer every request with `respond`
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&SeenRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, respond.clone(), log.clone()));
            }
        });

        Self { base_url, seen }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

async fn serve(stream: TcpStream, respond: Arc<Responder>, seen: Arc<Mutex<Vec<SeenRequest>>>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    // Keep-alive: one connection may carry several requests
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
            return;
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        let request = SeenRequest { method, target, headers };
        let content_length = request
            .header("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; content_length];
        if reader.read_exact(&mut body).await.is_err() {
            return;
        }

        let (status, body) = respond(&request);
        seen.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        if write.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}
