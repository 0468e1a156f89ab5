use crate::models::{HealthSnapshot, OllamaSettings};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// The status query itself failed (as opposed to reporting an unhealthy daemon).
#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("status request timed out")]
    Timeout,

    #[error("status endpoint returned HTTP {0}")]
    Status(u16),

    #[error("failed to decode status response: {0}")]
    Decode(String),

    #[error("status request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("health check unavailable: {0}")]
    Unavailable(String),
}

/// Reports the state of the local model daemon.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HealthCheckService: Send + Sync {
    async fn query_status(&self) -> Result<HealthSnapshot, HealthCheckError>;
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Health check against Ollama's `/api/tags` endpoint.
///
/// A refused connection means the daemon is not running and is reported as a
/// negative snapshot. Timeouts, HTTP errors and garbled bodies are errors.
pub struct OllamaHealthCheck {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaHealthCheck {
    pub fn new(settings: &OllamaSettings) -> Result<Self, HealthCheckError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            // The daemon is always reached directly, never through a system proxy
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    fn not_running(&self) -> HealthSnapshot {
        HealthSnapshot {
            daemon_running: false,
            model_installed: false,
            error_message: Some(format!("Ollama is not running at {}", self.base_url)),
        }
    }
}

/// `llama3` matches a listed `llama3:latest`; a tagged name must match exactly.
fn model_listed(tags: &TagsResponse, model: &str) -> bool {
    tags.models.iter().any(|tag| {
        tag.name == model || (!model.contains(':') && tag.name == format!("{}:latest", model))
    })
}

#[async_trait::async_trait]
impl HealthCheckService for OllamaHealthCheck {
    async fn query_status(&self) -> Result<HealthSnapshot, HealthCheckError> {
        let response = match self.client.get(self.tags_url()).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                tracing::debug!("Ollama connection refused at {}: {}", self.base_url, e);
                return Ok(self.not_running());
            }
            Err(e) if e.is_timeout() => return Err(HealthCheckError::Timeout),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(HealthCheckError::Status(status.as_u16()));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| HealthCheckError::Decode(e.to_string()))?;

        let model_installed = model_listed(&tags, &self.model);
        tracing::debug!(
            models = tags.models.len(),
            model = %self.model,
            model_installed,
            "Ollama status received"
        );

        Ok(HealthSnapshot {
            daemon_running: true,
            model_installed,
            error_message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn tags(names: &[&str]) -> TagsResponse {
        TagsResponse {
            models: names
                .iter()
                .map(|name| ModelTag {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn settings_for(base_url: String) -> OllamaSettings {
        OllamaSettings {
            base_url,
            model: "qwen2.5:1.5b".to_string(),
            request_timeout_secs: 3,
        }
    }

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_model_listed() {
        assert!(model_listed(&tags(&["qwen2.5:1.5b"]), "qwen2.5:1.5b"));
        assert!(model_listed(&tags(&["llama3:latest"]), "llama3"));
        assert!(!model_listed(&tags(&["qwen2.5:7b"]), "qwen2.5:1.5b"));
        assert!(!model_listed(&tags(&[]), "qwen2.5:1.5b"));
    }

    #[tokio::test]
    async fn test_refused_connection_means_not_running() {
        // Grab a free port and release it so nothing listens there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check = OllamaHealthCheck::new(&settings_for(format!("http://{}", addr))).unwrap();
        let snapshot = check.query_status().await.unwrap();

        assert!(!snapshot.daemon_running);
        assert!(!snapshot.model_installed);
        assert!(snapshot.error_message.unwrap().contains("not running"));
    }

    #[tokio::test]
    async fn test_running_with_model() {
        let base_url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"models":[{"name":"qwen2.5:1.5b","size":986061892}]}"#,
        )
        .await;

        let check = OllamaHealthCheck::new(&settings_for(base_url)).unwrap();
        let snapshot = check.query_status().await.unwrap();

        assert_eq!(snapshot, HealthSnapshot::healthy());
    }

    #[tokio::test]
    async fn test_running_without_model() {
        let base_url = serve_once("HTTP/1.1 200 OK", r#"{"models":[]}"#).await;

        let check = OllamaHealthCheck::new(&settings_for(base_url)).unwrap();
        let snapshot = check.query_status().await.unwrap();

        assert!(snapshot.daemon_running);
        assert!(!snapshot.model_installed);
        assert!(!snapshot.is_healthy());
    }

    #[tokio::test]
    async fn test_server_error_is_check_error() {
        let base_url = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;

        let check = OllamaHealthCheck::new(&settings_for(base_url)).unwrap();
        let result = check.query_status().await;

        assert!(matches!(result, Err(HealthCheckError::Status(500))));
    }

    #[tokio::test]
    async fn test_garbled_body_is_decode_error() {
        let base_url = serve_once("HTTP/1.1 200 OK", "not json").await;

        let check = OllamaHealthCheck::new(&settings_for(base_url)).unwrap();
        let result = check.query_status().await;

        assert!(matches!(result, Err(HealthCheckError::Decode(_))));
    }
}
