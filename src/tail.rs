use kubestream_k8s::LogTransport;
use kubestream_logs::{
    LogLevel, LogRecord, LogSink, RecordKind, SessionEvents, SessionId, SessionKey,
    SessionManager, SessionRequest, StreamConsumer, StreamEvent,
};

/// The one pod tail the viewer shows
///
/// Glues the session manager to the consumer and routes parsed records
/// into the sink.
pub struct LiveTail<T: LogTransport> {
    manager: SessionManager<T>,
    events: SessionEvents,
    consumer: StreamConsumer,
    request: SessionRequest,
}

impl<T: LogTransport> LiveTail<T> {
    pub fn new(transport: T, request: SessionRequest, tail_lines: i64) -> Self {
        let (manager, events) = SessionManager::new(transport);

        Self {
            manager: manager.with_tail_lines(tail_lines),
            events,
            consumer: StreamConsumer::new(),
            request,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.request.key()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.consumer.active_session()
    }

    /// Start tailing; a failure shows up inline as an error record
    pub fn start(&mut self, sink: &mut LogSink) -> Option<SessionId> {
        sink.show_placeholder();

        match self.manager.start_session(self.request.clone()) {
            Ok(session_id) => {
                self.consumer.track(session_id, &self.request.pod_name);
                tracing::debug!(session = %session_id, key = %self.key(), "tailing");
                Some(session_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key(), "failed to start log session");
                self.consumer.untrack();
                sink.add_system_record(LogRecord::system(
                    RecordKind::StreamError,
                    LogLevel::Error,
                    format!("Failed to start log stream: {}", e),
                ));
                None
            }
        }
    }

    /// Start over with a new time window, replacing the running session
    pub fn restart(&mut self, since_seconds: Option<i64>, sink: &mut LogSink) -> Option<SessionId> {
        self.request.since_seconds = since_seconds;
        sink.clear();
        self.start(sink)
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Feed one session event through parsing into the sink
    ///
    /// Returns how many records were stored.
    pub fn apply(&mut self, event: StreamEvent, sink: &mut LogSink) -> usize {
        if !self.manager.observe(&event) {
            tracing::trace!(session = %event.session_id(), "ignoring event from replaced session");
        }

        let mut stored = 0;
        for record in self.consumer.handle(event) {
            if record.is_system() {
                sink.add_system_record(record);
                stored += 1;
            } else if sink.add_record(record) {
                stored += 1;
            }
        }
        stored
    }

    pub fn stop(&mut self) {
        self.manager.stop_all();
        self.consumer.untrack();
    }
}
