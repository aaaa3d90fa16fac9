use std::sync::{Arc, RwLock};

use netmap_core::Store;

/// Single shared resource (§5): handlers take a read lock for queries and a
/// write lock for mutations, holding the guard for the duration of the call.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        AppState {
            store: Arc::new(RwLock::new(store)),
        }
    }
}
