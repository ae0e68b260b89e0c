// crates/mneme/src/test_support.rs
// Shared fixtures for unit tests

use crate::embeddings::Embedder;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Deterministic bag-of-words embedder: texts sharing words land close together.
pub(crate) struct FakeEmbedder {
    dims: usize,
    pub(crate) calls: AtomicUsize,
}

impl FakeEmbedder {
    pub(crate) fn new(dims: usize) -> Self {
        Self {
            dims,
            calls: AtomicUsize::new(0),
        }
    }
}

pub(crate) fn bag_of_words(text: &str, dims: usize) -> Vec<f32> {
    let mut v = vec![0.01_f32; dims];
    for word in text.split_whitespace() {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(usize::from(b)))
            % dims;
        v[bucket] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn provider_id(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words(text, self.dims))
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| bag_of_words(t, self.dims)).collect())
    }

    async fn verify(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One-connection-per-response HTTP server for provider client tests.
pub(crate) struct MockHttpServer {
    addr: SocketAddr,
    handle: JoinHandle<Vec<String>>,
}

impl MockHttpServer {
    /// Serve `responses` in order, one per incoming connection
    pub(crate) async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut stream).await);

                let resp = format!(
                    "HTTP/1.1 {} Mock\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n\
                     {}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(resp.as_bytes()).await.unwrap();
                stream.flush().await.unwrap();
            }
            requests
        });

        Self { addr, handle }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for all responses to be served and return the raw requests
    pub(crate) async fn finish(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}
