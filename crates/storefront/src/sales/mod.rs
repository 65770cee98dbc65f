//! Sale records: recording purchases, reading them back, and reporting.
//!
//! Each user's records live under their own storage key; the `sales_index`
//! key lists which users have any. Records are immutable once written.

mod aggregate;
mod recorder;
mod repository;

pub use aggregate::{AggregatedStat, SalesSummary, TopSelling, aggregate_top_selling};
pub use recorder::PurchaseRecorder;
pub use repository::{get_all_sales, purchases_for};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pokestore_core::{Price, ProductId, SaleId};

use crate::cart::CartLine;

/// One product line of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub catalog_id: ProductId,
    pub name: String,
    pub image_ref: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl SaleItem {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

impl From<&CartLine> for SaleItem {
    fn from(line: &CartLine) -> Self {
        Self {
            catalog_id: line.product.catalog_id,
            name: line.product.name.clone(),
            image_ref: line.product.image_ref.clone(),
            category: line.product.primary_category.clone(),
            quantity: line.quantity,
            unit_price: line.product.unit_price,
        }
    }
}

/// A completed checkout, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    /// Creation-time derived, increasing within a process.
    pub id: SaleId,
    pub timestamp: DateTime<Utc>,
    /// Owner key of the purchasing user.
    pub owner_user_id: String,
    pub items: Vec<SaleItem>,
}

impl SaleRecord {
    /// Units across all items.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Σ quantity × unit price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(SaleItem::subtotal).sum()
    }
}
