//! Mock HTTP server setup for integration tests

use graph_batch_rust::transport::{HttpTransport, HttpTransportConfig};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;
use tokio::sync::Mutex;

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

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig::default().with_base_url(&self.base_url))
            .expect("transport should build")
    }

    /// Batch POST whose form body matches `matcher`, answered with `body`.
    pub async fn mock_batch(&self, matcher: Matcher, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", "/")
            .match_body(matcher)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

/// JSON array of `n` success entries echoing `{"n": i}` starting at `first`.
pub fn success_entries(first: usize, n: usize) -> String {
    let entries: Vec<serde_json::Value> = (first..first + n)
        .map(|i| {
            serde_json::json!({
                "code": 200,
                "headers": [{"name": "Content-Type", "value": "application/json"}],
                "body": serde_json::json!({ "n": i }).to_string(),
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}
