use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{db::Store, models::ActionLogEntry};

/// Appends received actions to the audit table without holding up the response.
#[derive(Clone)]
pub struct ActionLogger {
    store: Arc<dyn Store>,
}

impl ActionLogger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Spawns the append and returns immediately. Failures only reach the tracing output.
    pub fn record(&self, entry: ActionLogEntry) -> JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.append_action(&entry).await {
                tracing::warn!("Failed to log action {}: {}", entry.action, e);
            }
        })
    }
}
