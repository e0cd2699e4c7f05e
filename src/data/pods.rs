//! Problematic pod reports from the pod-status endpoint.
//!
//! This is a side channel next to the live snapshots: one fetch is issued
//! per full render pass and the result is merged into its own region.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::FetchError;
use crate::source::NumericLeaf;

/// A pod the cluster reports as unhealthy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblematicPod {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub namespace: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phase: String,
    #[serde(default)]
    pub restart_count: NumericLeaf,
    #[serde(default, deserialize_with = "lenient_text")]
    pub age: String,
}

impl ProblematicPod {
    /// Crash, error and failure reasons are shown as critical.
    pub fn is_critical(&self) -> bool {
        let reason = self.reason.to_lowercase();
        ["crash", "error", "fail"].iter().any(|k| reason.contains(k))
    }
}

/// Pod counts returned next to the pod list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSummary {
    #[serde(default)]
    pub total_pods: NumericLeaf,
    #[serde(default)]
    pub ready_pods: NumericLeaf,
    #[serde(default)]
    pub failing_pods: NumericLeaf,
}

/// Body of `GET /api/pod-states`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodStateReport {
    #[serde(default, deserialize_with = "lenient_list")]
    pub problematic_pods: Vec<ProblematicPod>,
    #[serde(default)]
    pub summary: Option<PodSummary>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ProblematicPod>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Anything that can produce a [`PodStateReport`].
#[async_trait]
pub trait PodStatusClient: Send + Sync {
    async fn fetch(&self) -> Result<PodStateReport, FetchError>;
}

/// Fetches the report over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPodStatusClient {
    client: Client,
    url: String,
}

impl HttpPodStatusClient {
    /// `api_base` is the dashboard server root, e.g. `http://127.0.0.1:5001`.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/api/pod-states", api_base.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PodStatusClient for HttpPodStatusClient {
    async fn fetch(&self) -> Result<PodStateReport, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// A finished fetch, tagged with the render pass that asked for it.
#[derive(Debug)]
pub struct PodFetchOutcome {
    pub generation: u64,
    pub result: Result<PodStateReport, FetchError>,
}

/// Issues fetches on the runtime and reports completions over a channel.
///
/// Fetches are never cancelled. The receiver decides, by generation, whether
/// a completion is still current.
pub struct PodFetcher {
    client: Arc<dyn PodStatusClient>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<PodFetchOutcome>,
}

impl PodFetcher {
    /// Create a fetcher and the receiver its completions arrive on.
    pub fn new(
        client: Arc<dyn PodStatusClient>,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<PodFetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                client,
                runtime,
                tx,
            },
            rx,
        )
    }

    /// Start a fetch for render pass `generation`.
    pub fn dispatch(&self, generation: u64) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        debug!("Fetching pod states for pass {}", generation);
        self.runtime.spawn(async move {
            let result = client.fetch().await;
            let _ = tx.send(PodFetchOutcome { generation, result });
        });
    }
}

impl std::fmt::Debug for PodFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodFetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct FixedClient(Result<PodStateReport, ()>);

    #[async_trait]
    impl PodStatusClient for FixedClient {
        async fn fetch(&self) -> Result<PodStateReport, FetchError> {
            self.0.clone().map_err(|_| FetchError::Timeout)
        }
    }

    /// Serve one canned HTTP response and return the base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_report_parsing_is_lenient() {
        let report: PodStateReport = serde_json::from_value(json!({
            "problematic_pods": [
                { "name": "clara-7d9f", "namespace": "lamina", "reason": "CrashLoopBackOff",
                  "phase": "Running", "restart_count": 7, "age": "2h" },
                { "name": "luna-1", "restart_count": "many" }
            ],
            "summary": { "total_pods": 10, "ready_pods": 8, "failing_pods": 2 },
            "pod_states": { "Running": 8 }
        }))
        .unwrap();

        assert_eq!(report.problematic_pods.len(), 2);
        let first = &report.problematic_pods[0];
        assert_eq!(first.restart_count.as_f64(), 7.0);
        assert!(first.is_critical());

        let second = &report.problematic_pods[1];
        assert_eq!(second.reason, "");
        assert_eq!(second.restart_count.to_string(), "many");
        assert!(!second.is_critical());

        assert_eq!(report.summary.unwrap().failing_pods.as_f64(), 2.0);
    }

    #[test]
    fn test_report_without_pods() {
        let report: PodStateReport = serde_json::from_value(json!({})).unwrap();
        assert!(report.problematic_pods.is_empty());

        let report: PodStateReport =
            serde_json::from_value(json!({ "problematic_pods": null })).unwrap();
        assert!(report.problematic_pods.is_empty());
    }

    #[test]
    fn test_client_url() {
        let client =
            HttpPodStatusClient::new("http://127.0.0.1:5001/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:5001/api/pod-states");
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let base = serve_once(
            "200 OK",
            r#"{"problematic_pods":[{"name":"vesna-0","reason":"ImagePullBackOff"}]}"#,
        )
        .await;
        let client = HttpPodStatusClient::new(&base, Duration::from_secs(2)).unwrap();

        let report = client.fetch().await.unwrap();
        assert_eq!(report.problematic_pods[0].name, "vesna-0");
        assert!(!report.problematic_pods[0].is_critical());
    }

    #[tokio::test]
    async fn test_http_fetch_error_status() {
        let base = serve_once("500 Internal Server Error", "{}").await;
        let client = HttpPodStatusClient::new(&base, Duration::from_secs(2)).unwrap();

        assert!(matches!(client.fetch().await, Err(FetchError::Http(_))));
    }

    #[tokio::test]
    async fn test_http_fetch_bad_body() {
        let base = serve_once("200 OK", "not json").await;
        let client = HttpPodStatusClient::new(&base, Duration::from_secs(2)).unwrap();

        assert!(matches!(client.fetch().await, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetcher_tags_generation() {
        let report = PodStateReport {
            problematic_pods: vec![ProblematicPod {
                name: "p".to_string(),
                ..Default::default()
            }],
            summary: None,
        };
        let (fetcher, mut rx) =
            PodFetcher::new(Arc::new(FixedClient(Ok(report.clone()))), Handle::current());

        fetcher.dispatch(3);
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.generation, 3);
        assert_eq!(outcome.result.unwrap(), report);
    }

    #[tokio::test]
    async fn test_fetcher_reports_failures() {
        let (fetcher, mut rx) = PodFetcher::new(Arc::new(FixedClient(Err(()))), Handle::current());

        fetcher.dispatch(1);
        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(FetchError::Timeout)));
    }
}
