//! In-process publish/subscribe channels.
//!
//! Components that need to react to another component's state change
//! (a sales report refreshing after checkout, a view leaving after logout)
//! subscribe to a typed [`EventBus`] instead of polling storage.

use tokio::sync::broadcast;
use tracing::debug;

use crate::sales::SaleRecord;

/// Default number of buffered events per bus.
const DEFAULT_CAPACITY: usize = 64;

/// A typed broadcast channel.
///
/// Publishing with no subscribers is not an error; the event is dropped.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus that buffers up to `capacity` events per lagging subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: T) -> usize {
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(delivered, "Published event");
        delivered
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Emitted after a sale record has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesUpdated {
    /// Owner key of the purchasing user.
    pub owner_user_id: String,
    /// The record that was just stored.
    pub new_record: SaleRecord,
}

/// Client entry points a component can be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The login screen.
    Login,
}

impl Route {
    /// Path of the route in the client.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
        }
    }
}
