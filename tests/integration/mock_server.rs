//! Mock HTTP server setup for integration tests

use auditor_client::utils::SequentialIds;
use auditor_client::{AuditClient, AuditClientBuilder, RetryPolicyConfig};
use mockito::{Mock, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Builder pointed at the mock server with fast, deterministic retries.
    pub fn builder(&self) -> AuditClientBuilder {
        fast_builder(&self.base_url)
    }

    pub fn client(&self) -> AuditClient {
        self.builder().build().expect("client builds")
    }

    /// JSON response expected exactly `hits` times.
    pub async fn mock_json(&self, path: &str, status: u16, body: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status.into())
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Bare status with no body, expected exactly `hits` times.
    pub async fn mock_status(&self, path: &str, status: u16, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(status.into())
            .expect(hits)
            .create_async()
            .await
    }

    /// 429 carrying a `Retry-After` header.
    pub async fn mock_rate_limited(&self, path: &str, retry_after: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .with_status(429)
            .with_header("retry-after", retry_after)
            .expect(hits)
            .create_async()
            .await
    }
}

pub const EMPTY_ANALYSIS: &str = r#"{"findings":[],"suggestions":[]}"#;

pub fn fast_builder(base_url: &str) -> AuditClientBuilder {
    AuditClientBuilder::new()
        .base_url(base_url)
        .api_key("sk-test")
        .timeout(Duration::from_secs(5))
        .retry(
            RetryPolicyConfig::default()
                .max_attempts(3)
                .base_delay_ms(1)
                .max_delay_ms(5),
        )
        .id_generator(Arc::new(SequentialIds::new("id")))
}

/// A server that accepts connections and never answers.
pub async fn hanging_server() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    (format!("http://{}", addr), handle)
}

/// An address nothing listens on.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}
