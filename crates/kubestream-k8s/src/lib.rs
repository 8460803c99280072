//! Kubernetes client for kubestream
//!
//! This crate owns the cluster connections and the follow-mode log
//! transport that sessions read from.

mod client;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::{ConnectionRegistry, KubeClient};
pub use transport::{
    ChunkStream, DEFAULT_TAIL_LINES, KubeTransport, LogTransport, TailRequest, TransportError,
};
