use std::sync::Arc;

use chemviz_database::HistoryStore;

use crate::access::{AccessPolicy, AllowAny};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: HistoryStore,
    pub access: Arc<dyn AccessPolicy>,
}

impl AppState {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            store,
            access: Arc::new(AllowAny),
        }
    }

    pub fn with_access_policy<P: AccessPolicy + 'static>(mut self, policy: P) -> Self {
        self.access = Arc::new(policy);
        self
    }
}
