use std::collections::HashMap;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use kubestream_k8s::{DEFAULT_TAIL_LINES, LogTransport, TailRequest};
use kubestream_types::{SessionId, SessionKey, StreamEvent};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("connection not found: {0}")]
    ConnectionNotFound(String),
}

/// What the presentation layer asks for when starting a tail
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRequest {
    pub connection_id: String,
    pub namespace: String,
    pub pod_name: String,
    pub container_name: Option<String>,
    pub since_seconds: Option<i64>,
}

impl SessionRequest {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(
            self.connection_id.as_str(),
            self.namespace.as_str(),
            self.pod_name.as_str(),
            self.container_name.as_deref(),
        )
    }
}

struct ActiveSession {
    id: SessionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveSession {
    fn abort(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Receiving half of the session event channel
pub struct SessionEvents {
    receiver: mpsc::UnboundedReceiver<StreamEvent>,
}

impl SessionEvents {
    /// Next event from any session, in per-session transport order
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Owns live tailing sessions, at most one per session key
///
/// The table is only touched through `&mut self`, so callers keep it on a
/// single task. Sessions end through `stop_session` or when `observe` sees
/// their terminal event.
pub struct SessionManager<T: LogTransport> {
    transport: T,
    sessions: HashMap<SessionKey, ActiveSession>,
    keys: HashMap<SessionId, SessionKey>,
    events_tx: mpsc::UnboundedSender<StreamEvent>,
    next_id: u64,
    tail_lines: i64,
}

impl<T: LogTransport> SessionManager<T> {
    pub fn new(transport: T) -> (Self, SessionEvents) {
        let (events_tx, receiver) = mpsc::unbounded_channel();

        let manager = Self {
            transport,
            sessions: HashMap::new(),
            keys: HashMap::new(),
            events_tx,
            next_id: 1,
            tail_lines: DEFAULT_TAIL_LINES,
        };

        (manager, SessionEvents { receiver })
    }

    /// Lines of history requested when a session starts
    pub fn with_tail_lines(mut self, tail_lines: i64) -> Self {
        self.tail_lines = tail_lines;
        self
    }

    /// Start tailing, replacing any session already running under the same key
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session(&mut self, request: SessionRequest) -> Result<SessionId, SessionError> {
        if !self.transport.has_connection(&request.connection_id) {
            return Err(SessionError::ConnectionNotFound(request.connection_id));
        }

        let key = request.key();
        if let Some(previous) = self.sessions.remove(&key) {
            tracing::debug!(session = %previous.id, key = %key, "replacing session");
            self.keys.remove(&previous.id);
            previous.abort();
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;

        let tail = TailRequest {
            connection_id: request.connection_id,
            namespace: request.namespace,
            pod_name: request.pod_name,
            container: request.container_name,
            tail_lines: self.tail_lines,
            since_seconds: request.since_seconds,
        };

        let cancel = CancellationToken::new();
        let task = Self::spawn_pump(
            self.transport.clone(),
            id,
            tail,
            self.events_tx.clone(),
            cancel.clone(),
        );

        tracing::debug!(session = %id, key = %key, "started session");
        self.keys.insert(id, key.clone());
        self.sessions.insert(key, ActiveSession { id, cancel, task });

        Ok(id)
    }

    /// Forward transport chunks as events until the stream ends, fails, or is cancelled
    fn spawn_pump(
        transport: T,
        session_id: SessionId,
        request: TailRequest,
        events: mpsc::UnboundedSender<StreamEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let opened = tokio::select! {
                _ = cancel.cancelled() => return,
                opened = transport.open(request.clone()) => opened,
            };

            let mut chunks = match opened {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!(session = %session_id, pod = %request.pod_name, "failed to open log stream: {}", e);
                    let _ = events.send(StreamEvent::Error {
                        session_id,
                        message: e.to_string(),
                    });
                    return;
                }
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,

                    next = chunks.next() => {
                        let event = match next {
                            Some(Ok(chunk)) => StreamEvent::Data {
                                session_id,
                                pod_name: request.pod_name.clone(),
                                chunk,
                            },
                            Some(Err(e)) => {
                                tracing::warn!(session = %session_id, pod = %request.pod_name, "log stream failed: {}", e);
                                StreamEvent::Error {
                                    session_id,
                                    message: e.to_string(),
                                }
                            }
                            None => StreamEvent::End { session_id },
                        };

                        let terminal = event.is_terminal();
                        if events.send(event).is_err() || terminal {
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Stop a session; unknown or already-stopped ids are ignored
    pub fn stop_session(&mut self, session_id: &SessionId) {
        let Some(key) = self.keys.remove(session_id) else {
            return;
        };

        if let Some(session) = self.sessions.remove(&key) {
            tracing::debug!(session = %session_id, key = %key, "stopped session");
            session.abort();
        }
    }

    /// Update the table for a delivered event
    ///
    /// Terminal events tear down their session if it is still current.
    /// Returns false for events from sessions that are no longer current.
    pub fn observe(&mut self, event: &StreamEvent) -> bool {
        let session_id = event.session_id();
        if !self.keys.contains_key(&session_id) {
            return false;
        }

        if event.is_terminal() {
            if let Some(key) = self.keys.remove(&session_id) {
                self.sessions.remove(&key);
                tracing::debug!(session = %session_id, key = %key, "session closed by transport");
            }
        }

        true
    }

    #[cfg(test)]
    fn is_current(&self, session_id: &SessionId) -> bool {
        self.keys.contains_key(session_id)
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn stop_all(&mut self) {
        self.keys.clear();
        for (_, session) in self.sessions.drain() {
            session.abort();
        }
    }
}

impl<T: LogTransport> Drop for SessionManager<T> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kubestream_k8s::TransportError;
    use kubestream_k8s::testing::FakeTransport;

    use super::*;

    fn request(pod: &str) -> SessionRequest {
        SessionRequest {
            connection_id: "kind-dev".to_string(),
            namespace: "default".to_string(),
            pod_name: pod.to_string(),
            container_name: None,
            since_seconds: None,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    async fn next_event(events: &mut SessionEvents) -> StreamEvent {
        tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("event timed out")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_missing_connection_fails_fast() {
        let transport = FakeTransport::default();
        let (mut manager, _events) = SessionManager::new(transport.clone());

        let result = manager.start_session(request("web-0"));
        assert_eq!(
            result,
            Err(SessionError::ConnectionNotFound("kind-dev".to_string()))
        );
        assert_eq!(manager.active_count(), 0);

        tokio::task::yield_now().await;
        assert_eq!(transport.opened(), 0);
    }

    #[tokio::test]
    async fn test_tail_request_parameters() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (manager, _events) = SessionManager::new(transport.clone());
        let mut manager = manager.with_tail_lines(250);

        let mut req = request("web-0");
        req.container_name = Some("app".to_string());
        req.since_seconds = Some(900);
        manager.start_session(req).unwrap();

        wait_until(|| transport.opened() == 1).await;
        let tail = transport.request(0);
        assert_eq!(tail.pod_name, "web-0");
        assert_eq!(tail.container.as_deref(), Some("app"));
        assert_eq!(tail.tail_lines, 250);
        assert_eq!(tail.since_seconds, Some(900));
    }

    #[tokio::test]
    async fn test_data_then_end_in_order() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, mut events) = SessionManager::new(transport.clone());

        let id = manager.start_session(request("web-0")).unwrap();
        wait_until(|| transport.opened() == 1).await;

        let tx = transport.sender(0);
        tx.unbounded_send(Ok(b"one\n".to_vec())).unwrap();
        tx.unbounded_send(Ok(b"two\n".to_vec())).unwrap();
        transport.close(0);

        let first = next_event(&mut events).await;
        assert_eq!(
            first,
            StreamEvent::Data {
                session_id: id,
                pod_name: "web-0".to_string(),
                chunk: b"one\n".to_vec(),
            }
        );
        assert!(manager.observe(&first));

        let second = next_event(&mut events).await;
        assert!(matches!(second, StreamEvent::Data { ref chunk, .. } if chunk == b"two\n"));

        let end = next_event(&mut events).await;
        assert_eq!(end, StreamEvent::End { session_id: id });
        assert!(manager.observe(&end));
        assert!(!manager.is_current(&id));
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, mut events) = SessionManager::new(transport.clone());

        let id = manager.start_session(request("web-0")).unwrap();
        wait_until(|| transport.opened() == 1).await;

        transport
            .sender(0)
            .unbounded_send(Err(TransportError::Stream("connection reset".to_string())))
            .unwrap();

        let event = next_event(&mut events).await;
        assert_eq!(
            event,
            StreamEvent::Error {
                session_id: id,
                message: "log stream error: connection reset".to_string(),
            }
        );
        manager.observe(&event);
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_reported_as_error_event() {
        let transport = FakeTransport::with_connection("kind-dev");
        transport.fail_next_open("pods \"web-0\" not found");
        let (mut manager, mut events) = SessionManager::new(transport.clone());

        let id = manager.start_session(request("web-0")).unwrap();
        let event = next_event(&mut events).await;

        assert!(matches!(event, StreamEvent::Error { session_id, ref message }
            if session_id == id && message.contains("not found")));
        manager.observe(&event);
        assert!(!manager.is_current(&id));
    }

    #[tokio::test]
    async fn test_same_key_replaces_and_aborts_previous() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, _events) = SessionManager::new(transport.clone());

        let first = manager.start_session(request("web-0")).unwrap();
        wait_until(|| transport.opened() == 1).await;
        let first_tx = transport.sender(0);

        let second = manager.start_session(request("web-0")).unwrap();
        wait_until(|| transport.opened() == 2).await;

        assert_ne!(first, second);
        assert_eq!(manager.active_count(), 1);
        assert!(!manager.is_current(&first));
        assert!(manager.is_current(&second));

        // The aborted task drops its stream, closing the server side
        wait_until(|| first_tx.is_closed()).await;
        assert!(!transport.sender(1).is_closed());
    }

    #[tokio::test]
    async fn test_stale_events_ignored() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, _events) = SessionManager::new(transport.clone());

        let first = manager.start_session(request("web-0")).unwrap();
        let second = manager.start_session(request("web-0")).unwrap();

        let stale_end = StreamEvent::End { session_id: first };
        assert!(!manager.observe(&stale_end));
        assert!(manager.is_current(&second));
        assert_eq!(manager.active_count(), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_is_noop() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, _events) = SessionManager::new(transport.clone());

        manager.stop_session(&SessionId(42));

        let id = manager.start_session(request("web-0")).unwrap();
        manager.stop_session(&id);
        manager.stop_session(&id);
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_side_by_side() {
        let transport = FakeTransport::with_connection("kind-dev");
        let (mut manager, _events) = SessionManager::new(transport.clone());

        manager.start_session(request("web-0")).unwrap();
        manager.start_session(request("web-1")).unwrap();
        let mut sidecar = request("web-0");
        sidecar.container_name = Some("istio-proxy".to_string());
        manager.start_session(sidecar).unwrap();

        assert_eq!(manager.active_count(), 3);
        manager.stop_all();
        assert_eq!(manager.active_count(), 0);
    }
}
