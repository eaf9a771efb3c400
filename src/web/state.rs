use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::Backend;
use crate::ui::DashboardHub;

/// Alerts raised by an action that ends in a redirect, shown on the next
/// page render.
#[derive(Clone, Default)]
pub struct FlashQueue {
    inner: Arc<RwLock<Vec<String>>>,
}

impl FlashQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_all(&self, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.inner.write().await.extend(messages);
    }

    pub async fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.write().await)
    }
}

/// Shared state for the console's web handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub dashboard: Arc<DashboardHub>,
    pub flash: FlashQueue,
    pub poll_interval_secs: u64,
}

impl AppState {
    pub fn new(backend: Arc<dyn Backend>, poll_interval_secs: u64) -> Self {
        Self {
            backend,
            dashboard: Arc::new(DashboardHub::new()),
            flash: FlashQueue::new(),
            poll_interval_secs,
        }
    }
}
