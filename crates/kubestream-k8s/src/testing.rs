//! In-memory transport for exercising sessions without a cluster.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use parking_lot::Mutex;

use crate::{ChunkStream, LogTransport, TailRequest, TransportError};

pub type ChunkSender = UnboundedSender<Result<Vec<u8>, TransportError>>;

/// Transport whose tails are fed by the test
///
/// Each opened tail gets a channel; index `i` is the `i`-th `open` call.
#[derive(Clone, Default)]
pub struct FakeTransport {
    connections: Arc<Mutex<HashSet<String>>>,
    opened: Arc<Mutex<Vec<(TailRequest, ChunkSender)>>>,
    fail_open: Arc<Mutex<Option<String>>>,
}

impl FakeTransport {
    pub fn with_connection(id: &str) -> Self {
        let transport = Self::default();
        transport.connections.lock().insert(id.to_string());
        transport
    }

    /// Make the next `open` fail with a stream error
    pub fn fail_next_open(&self, message: &str) {
        *self.fail_open.lock() = Some(message.to_string());
    }

    pub fn opened(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn request(&self, index: usize) -> TailRequest {
        self.opened.lock()[index].0.clone()
    }

    pub fn sender(&self, index: usize) -> ChunkSender {
        self.opened.lock()[index].1.clone()
    }

    pub fn send(&self, index: usize, chunk: &str) {
        let _ = self.opened.lock()[index]
            .1
            .unbounded_send(Ok(chunk.as_bytes().to_vec()));
    }

    /// Close the server side of an opened tail
    pub fn close(&self, index: usize) {
        self.opened.lock()[index].1.close_channel();
    }
}

impl LogTransport for FakeTransport {
    fn has_connection(&self, connection_id: &str) -> bool {
        self.connections.lock().contains(connection_id)
    }

    fn open(
        &self,
        request: TailRequest,
    ) -> impl Future<Output = Result<ChunkStream, TransportError>> + Send {
        let failure = self.fail_open.lock().take();
        let opened = Arc::clone(&self.opened);

        async move {
            if let Some(message) = failure {
                return Err(TransportError::Stream(message));
            }
            let (tx, rx) = unbounded();
            opened.lock().push((request, tx));
            Ok(rx.boxed())
        }
    }
}
