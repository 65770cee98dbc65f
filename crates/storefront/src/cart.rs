//! Shopping cart.
//!
//! The cart is an ordered list of product lines with at most one line per
//! catalog id. Every mutation writes the whole cart back to storage, and the
//! cart is rehydrated from storage at startup; anything unreadable there is
//! an empty cart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use pokestore_core::{Price, Product, ProductId};

use crate::storage::{self, Storage, keys};

/// One product and how many units of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// The product, copied at the time it was added.
    pub product: Product,
    /// Units in the cart; never zero.
    pub quantity: u32,
}

impl CartLine {
    /// `quantity × unit price`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.unit_price.times(self.quantity)
    }
}

/// The shopping cart, persisted on every change.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Rehydrate the cart from storage.
    ///
    /// A missing or corrupt stored cart yields an empty cart. Stored lines
    /// that break the one-line-per-product rule are merged, and empty lines
    /// are dropped.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let stored = storage::read_json::<Vec<CartLine>>(storage.as_ref(), keys::CART)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not read stored cart");
                None
            })
            .unwrap_or_default();

        let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
        for line in stored.into_iter().filter(|line| line.quantity > 0) {
            match lines
                .iter_mut()
                .find(|l| l.product.catalog_id == line.product.catalog_id)
            {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => lines.push(line),
            }
        }

        debug!(lines = lines.len(), "Loaded cart");
        Self { storage, lines }
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the same catalog id, or appends a
    /// new line with quantity 1.
    pub fn add_to_cart(&mut self, product: &Product) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product.catalog_id == product.catalog_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
        self.persist();
    }

    /// Remove the whole line for `catalog_id`, whatever its quantity.
    ///
    /// Removing an absent id changes nothing.
    pub fn remove_from_cart(&mut self, catalog_id: ProductId) {
        let before = self.lines.len();
        self.lines
            .retain(|line| line.product.catalog_id != catalog_id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.persist();
    }

    /// Lines in the order products were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `catalog_id`, if present.
    #[must_use]
    pub fn line(&self, catalog_id: ProductId) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.product.catalog_id == catalog_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ quantity.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Σ quantity × unit price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    fn persist(&self) {
        if let Err(e) = storage::write_json(self.storage.as_ref(), keys::CART, &self.lines) {
            error!(error = %e, "Could not persist cart");
        }
    }
}
