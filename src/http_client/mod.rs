//! HTTP client for fetching Lodestone pages.
//!
//! [`PageFetcher`] is the network seam used by the scraper. A caller may hand
//! one shared fetcher to many scrapes (its lifecycle is theirs), or let the
//! scraper build a one-shot [`HttpClient`] per call.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::lodestone::FetchFailure;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Something that can fetch a page body by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` once. Non-success statuses are failures.
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure>;
}

/// HTTP client with a fixed user agent and per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, FetchFailure> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default scraper user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchFailure> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .no_proxy()
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchFailure::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        debug!(
            "GET {} -> {} in {}ms",
            url,
            response.status().as_u16(),
            start.elapsed().as_millis()
        );

        Ok(HttpResponse {
            status: response.status(),
            response,
        })
    }

    /// Get page content as text, failing on non-success statuses.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self.get(url).await.map_err(|e| self.transport(e))?;
        if !response.is_success() {
            return Err(FetchFailure::Status(response.status.as_u16()));
        }
        response.text().await.map_err(|e| self.transport(e))
    }

    fn transport(&self, e: reqwest::Error) -> FetchFailure {
        if e.is_timeout() {
            FetchFailure::Transport(format!(
                "request timed out after {}s",
                self.timeout.as_secs_f32()
            ))
        } else {
            FetchFailure::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response and hand back the raw request.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{}/lodestone/character/1/", addr), handle)
    }

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<p>Hello</p",
        )
        .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let body = client.fetch(&url).await.unwrap();
        assert_eq!(body, "<p>Hello</p");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /lodestone/character/1/"));
        assert!(request.contains("user-agent: lodestonescraper/1.0"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let (url, server) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        assert_eq!(client.fetch(&url).await, Err(FetchFailure::Status(404)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_keeps_status_and_body() {
        let (url, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 11\r\nConnection: close\r\n\r\nmaintenance",
        )
        .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let response = client.get(&url).await.unwrap();
        assert!(!response.is_success());
        assert_eq!(response.status.as_u16(), 503);
        assert_eq!(response.text().await.unwrap(), "maintenance");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = HttpClient::new(Duration::from_millis(200)).unwrap();
        match client.fetch(&format!("http://{}/", addr)).await {
            Err(FetchFailure::Transport(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpClient::new(Duration::from_secs(2)).unwrap();
        assert!(matches!(
            client.fetch(&format!("http://{}/", addr)).await,
            Err(FetchFailure::Transport(_))
        ));
    }
}
