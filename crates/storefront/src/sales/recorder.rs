//! Turning a cart into a persisted sale record.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use pokestore_core::{Identity, SaleId};

use super::{SaleItem, SaleRecord};
use crate::cart::CartLine;
use crate::events::{EventBus, SalesUpdated};
use crate::storage::{self, Storage, StorageError, keys};

/// Records purchases and announces them.
///
/// Appending is a read-modify-write of the owner's list. Two processes
/// writing the same storage at once can lose a record.
pub struct PurchaseRecorder {
    storage: Arc<dyn Storage>,
    events: EventBus<SalesUpdated>,
    last_id: AtomicI64,
}

impl std::fmt::Debug for PurchaseRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseRecorder")
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
    }
}

impl PurchaseRecorder {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            events: EventBus::new(),
            last_id: AtomicI64::new(0),
        }
    }

    /// Subscribe to [`SalesUpdated`] events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SalesUpdated> {
        self.events.subscribe()
    }

    /// Record a purchase of `lines` by `owner`.
    ///
    /// Returns `Ok(None)` and stores nothing when there is no identity or
    /// the cart is empty. Otherwise the record is appended to the owner's
    /// list, the owner is added to the sales index, and only then is a
    /// [`SalesUpdated`] event published.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    pub fn record_purchase(
        &self,
        lines: &[CartLine],
        owner: Option<&Identity>,
    ) -> Result<Option<SaleRecord>, StorageError> {
        let Some(owner) = owner else {
            debug!("No identity, purchase not recorded");
            return Ok(None);
        };
        if lines.is_empty() {
            debug!(user_id = %owner.id, "Empty cart, purchase not recorded");
            return Ok(None);
        }

        let now = Utc::now();
        let record = SaleRecord {
            id: self.next_id(now),
            timestamp: now,
            owner_user_id: owner.id.owner_key(),
            items: lines.iter().map(SaleItem::from).collect(),
        };

        self.append(&record)?;
        self.register_owner(&record.owner_user_id)?;

        info!(
            sale_id = %record.id,
            owner = %record.owner_user_id,
            items = record.items.len(),
            total = %record.total_price(),
            "Purchase recorded"
        );

        self.events.publish(SalesUpdated {
            owner_user_id: record.owner_user_id.clone(),
            new_record: record.clone(),
        });

        Ok(Some(record))
    }

    /// The creation time in milliseconds, bumped past the previous id.
    fn next_id(&self, now: DateTime<Utc>) -> SaleId {
        let millis = now.timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(millis.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        SaleId::new(millis.max(previous + 1))
    }

    fn append(&self, record: &SaleRecord) -> Result<(), StorageError> {
        let key = keys::sales_for(&record.owner_user_id);

        // Kept as raw values so entries this build cannot parse survive the rewrite.
        let mut list: Vec<serde_json::Value> =
            storage::read_json(self.storage.as_ref(), &key)?.unwrap_or_default();
        list.push(serde_json::to_value(record)?);

        storage::write_json(self.storage.as_ref(), &key, &list)
    }

    fn register_owner(&self, owner_user_id: &str) -> Result<(), StorageError> {
        let mut index: Vec<String> =
            storage::read_json(self.storage.as_ref(), keys::SALES_INDEX)?.unwrap_or_default();
        if index.iter().any(|id| id == owner_user_id) {
            return Ok(());
        }

        index.push(owner_user_id.to_string());
        debug!(owner = owner_user_id, owners = index.len(), "Registered owner in sales index");
        storage::write_json(self.storage.as_ref(), keys::SALES_INDEX, &index)
    }
}
