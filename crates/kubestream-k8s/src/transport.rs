use std::future::Future;

use futures::stream::BoxStream;
use futures::{AsyncReadExt, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::LogParams;

use crate::client::ConnectionRegistry;

/// Lines of history requested when a tail starts
pub const DEFAULT_TAIL_LINES: i64 = 100;

/// Read size for a single chunk pulled off the log stream
const CHUNK_SIZE: usize = 8 * 1024;

/// Raw byte chunks of a follow-mode log stream, in arrival order
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("log stream error: {0}")]
    Stream(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Stream(err.to_string())
    }
}

/// Parameters for a follow-mode log tail
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TailRequest {
    pub connection_id: String,
    pub namespace: String,
    pub pod_name: String,
    pub container: Option<String>,
    pub tail_lines: i64,
    pub since_seconds: Option<i64>,
}

impl TailRequest {
    /// Log parameters sent to the API server
    pub fn log_params(&self) -> LogParams {
        LogParams {
            follow: true,
            container: self.container.clone(),
            tail_lines: Some(self.tail_lines),
            since_seconds: self.since_seconds,
            timestamps: true,
            ..Default::default()
        }
    }
}

/// Source of live log streams
///
/// Implementations are cheap to clone; each session task owns a clone.
pub trait LogTransport: Clone + Send + Sync + 'static {
    /// Whether a connection id resolves to a live connection
    fn has_connection(&self, connection_id: &str) -> bool;

    /// Open a follow-mode tail
    fn open(
        &self,
        request: TailRequest,
    ) -> impl Future<Output = Result<ChunkStream, TransportError>> + Send;
}

/// Log transport backed by the Kubernetes API
#[derive(Clone, Default)]
pub struct KubeTransport {
    connections: ConnectionRegistry,
}

impl KubeTransport {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }
}

impl LogTransport for KubeTransport {
    fn has_connection(&self, connection_id: &str) -> bool {
        self.connections.contains(connection_id)
    }

    fn open(
        &self,
        request: TailRequest,
    ) -> impl Future<Output = Result<ChunkStream, TransportError>> + Send {
        let client = self.connections.get(&request.connection_id);

        async move {
            let client =
                client.ok_or_else(|| TransportError::ConnectionNotFound(request.connection_id.clone()))?;
            let pods: Api<Pod> = Api::namespaced(client, &request.namespace);

            let reader = pods
                .log_stream(&request.pod_name, &request.log_params())
                .await?;

            tracing::debug!(
                pod = %request.pod_name,
                namespace = %request.namespace,
                "opened log stream"
            );

            let chunks = futures::stream::try_unfold(Box::pin(reader), |mut reader| async move {
                let mut buf = vec![0u8; CHUNK_SIZE];
                let n = reader.read(&mut buf).await.map_err(TransportError::from)?;
                if n == 0 {
                    return Ok::<_, TransportError>(None);
                }
                buf.truncate(n);
                Ok(Some((buf, reader)))
            });

            Ok(chunks.boxed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_params_follow_with_timestamps() {
        let request = TailRequest {
            connection_id: "kind-dev".to_string(),
            namespace: "default".to_string(),
            pod_name: "web-0".to_string(),
            container: Some("nginx".to_string()),
            tail_lines: DEFAULT_TAIL_LINES,
            since_seconds: Some(300),
        };

        let params = request.log_params();
        assert!(params.follow);
        assert!(params.timestamps);
        assert_eq!(params.tail_lines, Some(100));
        assert_eq!(params.since_seconds, Some(300));
        assert_eq!(params.container.as_deref(), Some("nginx"));
    }

    #[test]
    fn test_unknown_connection() {
        let transport = KubeTransport::default();
        assert!(!transport.has_connection("missing"));
    }
}
