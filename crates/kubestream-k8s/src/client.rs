use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use parking_lot::RwLock;

/// Kubeconfig wrapper that builds clients per context
pub struct KubeClient {
    kubeconfig: Kubeconfig,
    current_context: Option<String>,
}

impl KubeClient {
    /// Create a new KubeClient by loading the kubeconfig
    pub fn new() -> Result<Self> {
        let kubeconfig =
            Kubeconfig::read().context("Failed to read kubeconfig. Is kubectl configured?")?;

        let current_context = kubeconfig.current_context.clone();

        Ok(Self {
            kubeconfig,
            current_context,
        })
    }

    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    /// Default namespace configured for a context, if any
    pub fn context_namespace(&self, context_name: &str) -> Option<String> {
        self.kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .and_then(|c| c.context.as_ref())
            .and_then(|c| c.namespace.clone())
    }

    /// Create a kube::Client for a specific context
    pub async fn client_for_context(&self, context_name: &str) -> Result<kube::Client> {
        let config = kube::Config::from_custom_kubeconfig(
            self.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(context_name.to_string()),
                ..Default::default()
            },
        )
        .await
        .context(format!(
            "Failed to create config for context: {}",
            context_name
        ))?;

        kube::Client::try_from(config).context(format!(
            "Failed to create client for context: {}",
            context_name
        ))
    }

    /// Connect to a context and register the client under the context name
    pub async fn connect(&self, registry: &ConnectionRegistry, context_name: &str) -> Result<String> {
        if !self.kubeconfig.contexts.iter().any(|c| c.name == context_name) {
            anyhow::bail!("Context '{}' not found in kubeconfig", context_name);
        }

        let client = self.client_for_context(context_name).await?;
        registry.insert(context_name, client);
        tracing::debug!(context = context_name, "registered connection");

        Ok(context_name.to_string())
    }
}

/// Owned table of live cluster connections, keyed by connection id
///
/// Cloning shares the same table.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    clients: Arc<RwLock<HashMap<String, kube::Client>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection_id: &str, client: kube::Client) {
        self.clients.write().insert(connection_id.to_string(), client);
    }

    pub fn get(&self, connection_id: &str) -> Option<kube::Client> {
        self.clients.read().get(connection_id).cloned()
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.clients.read().contains_key(connection_id)
    }
}
