use super::{ChunkResponse, ChunkTransport, TransportError};
use crate::batch::{BatchOperation, HttpOptions};
use crate::types::RawResult;
use crate::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub proxy_url: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 32,
            proxy_url: None,
        }
    }
}

impl HttpTransportConfig {
    /// Minimal production-friendly defaults (env-overridable).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("GRAPH_API_BASE_URL").unwrap_or(defaults.base_url),
            timeout: env::var("GRAPH_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            pool_max_idle_per_host: env::var("GRAPH_HTTP_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.pool_max_idle_per_host),
            proxy_url: env::var("GRAPH_PROXY_URL").ok(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sends a chunk as `POST {base_url}/` with `access_token` and a JSON `batch` field.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            if let Ok(proxy) = Proxy::all(proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(HttpTransportConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn encode_batch(credential: &str, operations: &[BatchOperation]) -> String {
        let params: Vec<serde_json::Value> = operations
            .iter()
            .map(|op| op.to_batch_params(credential))
            .collect();
        serde_json::Value::Array(params).to_string()
    }

    /// `null` or a blank body means the server had nothing to say about the chunk.
    pub(crate) fn parse_response(text: &str) -> std::result::Result<ChunkResponse, TransportError> {
        let text = text.trim();
        if text.is_empty() || text == "null" {
            return Ok(None);
        }
        let entries: Vec<Option<RawResult>> = serde_json::from_str(text)?;
        Ok(Some(entries))
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn dispatch(
        &self,
        credential: &str,
        operations: &[BatchOperation],
        options: &HttpOptions,
    ) -> std::result::Result<ChunkResponse, TransportError> {
        let url = format!("{}/", self.base_url);
        let batch = Self::encode_batch(credential, operations);
        let has_files = operations.iter().any(|op| op.files().is_some());

        debug!(
            operations = operations.len(),
            multipart = has_files,
            "dispatching batch chunk"
        );

        let mut request = self.client.post(&url);
        if has_files {
            let mut form = Form::new()
                .text("access_token", credential.to_string())
                .text("batch", batch);
            for op in operations {
                for (key, data) in op.files().into_iter().flatten() {
                    form = form.part(key.clone(), Part::bytes(data.to_vec()).file_name(key.clone()));
                }
            }
            request = request.multipart(form);
        } else {
            request = request.form(&[("access_token", credential), ("batch", batch.as_str())]);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Self::parse_response(&text)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_bodies() {
        assert!(HttpTransport::parse_response("").unwrap().is_none());
        assert!(HttpTransport::parse_response(" null ").unwrap().is_none());
    }

    #[test]
    fn test_parse_entries_with_null() {
        let parsed = HttpTransport::parse_response(
            r#"[{"code":200,"headers":[],"body":"{}"},null]"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[1].is_none());
    }

    #[test]
    fn test_parse_garbage_is_transport_error() {
        assert!(matches!(
            HttpTransport::parse_response("<html>"),
            Err(TransportError::Decode(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new(
            HttpTransportConfig::default().with_base_url("http://localhost:1234/"),
        )
        .unwrap();
        assert_eq!(transport.base_url(), "http://localhost:1234");
    }
}
