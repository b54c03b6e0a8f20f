use std::sync::Arc;

use chrono::Duration;
use tokio::sync::broadcast;

use crate::directory::admins::AdminDirectory;
use crate::directory::clients::ClientDirectory;
use crate::engine::lifecycle::LifecycleManager;
use crate::identity::IdentityProvider;
use crate::identity::local::LocalIdentityProvider;
use crate::observability::metrics::Metrics;
use crate::store::DeliveryStore;

pub struct AppState {
    pub lifecycle: LifecycleManager,
    pub admins: AdminDirectory,
    pub clients: ClientDirectory,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DeliveryStore>,
        identity: Arc<dyn IdentityProvider>,
        event_buffer_size: usize,
    ) -> Self {
        let metrics = Metrics::new();
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            lifecycle: LifecycleManager::new(store, events_tx, metrics.clone()),
            admins: AdminDirectory::new(identity),
            clients: ClientDirectory::new(),
            metrics,
        }
    }

    /// State backed by the local identity provider.
    pub fn with_local_identity(
        store: Arc<dyn DeliveryStore>,
        session_ttl: Duration,
        event_buffer_size: usize,
    ) -> Self {
        Self::new(
            store,
            Arc::new(LocalIdentityProvider::new(session_ttl)),
            event_buffer_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::AppState;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn zero_event_buffer_still_builds_a_feed() {
        let state = AppState::with_local_identity(
            Arc::new(InMemoryStore::new("test")),
            Duration::minutes(5),
            0,
        );
        let _events = state.lifecycle.subscribe();
        assert!(state.admins.is_empty());
    }
}
