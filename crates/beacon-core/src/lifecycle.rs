//! Room lifecycle.
//!
//! A room is `Active` from first use until a peer ending the call tears it
//! down. Teardown purges both delivery paths: the durable records and the
//! live membership. There is no idle timeout - stale-room reclamation
//! belongs to an external periodic sweep, which can simply call
//! [`LifecycleManager::teardown`] per room.

use crate::registry::RoomRegistry;
use crate::store::{SignalStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// Enforces the create -> active -> torn-down transitions.
#[derive(Clone)]
pub struct LifecycleManager {
    registry: Arc<RoomRegistry>,
    store: Arc<dyn SignalStore>,
}

impl LifecycleManager {
    /// Create a manager over the registry and store.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>, store: Arc<dyn SignalStore>) -> Self {
        Self { registry, store }
    }

    /// Tear a room down: clear its durable records and drop its push-path
    /// membership.
    ///
    /// Idempotent - tearing down an already-torn-down, empty, or unknown
    /// room succeeds. Re-ensuring the identifier afterwards yields a
    /// fresh room with empty state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the durable purge failed;
    /// membership is left untouched in that case so a retry tears down
    /// both paths together.
    pub async fn teardown(&self, room_id: &str) -> Result<(), StoreError> {
        self.store.clear_room(room_id).await?;
        let existed = self.registry.teardown(room_id);
        debug!(room = %room_id, existed, "Teardown complete");
        Ok(())
    }
}
