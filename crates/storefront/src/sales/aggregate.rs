//! Reporting over sale records.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use pokestore_core::{Price, ProductId};

use super::SaleRecord;

/// Units sold of one product across every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStat {
    pub catalog_id: ProductId,
    /// Name as it appeared in the first record seen for this product.
    pub name: String,
    pub image_ref: String,
    pub total_quantity_sold: u64,
}

/// A ranking of products by units sold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSelling {
    /// At most `limit` products, best sellers first.
    pub stats: Vec<AggregatedStat>,
    /// Units sold across every product, including those cut by `limit`.
    pub grand_total: u64,
}

impl TopSelling {
    /// The share of `stat` in the grand total, as a percentage rounded half-up
    /// to one decimal place. Zero when nothing was sold.
    #[must_use]
    pub fn share_percent(&self, stat: &AggregatedStat) -> Decimal {
        if self.grand_total == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(stat.total_quantity_sold) * Decimal::ONE_HUNDRED
            / Decimal::from(self.grand_total))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Group every item of `records` by catalog id, sum the quantities and
/// rank the groups.
///
/// Groups with equal totals keep the order in which they were first
/// encountered.
#[must_use]
pub fn aggregate_top_selling(records: &[SaleRecord], limit: usize) -> TopSelling {
    let mut stats: Vec<AggregatedStat> = Vec::new();
    let mut positions: HashMap<ProductId, usize> = HashMap::new();

    for item in records.iter().flat_map(|record| &record.items) {
        let quantity = u64::from(item.quantity);
        match positions.get(&item.catalog_id).and_then(|&at| stats.get_mut(at)) {
            Some(stat) => stat.total_quantity_sold += quantity,
            None => {
                positions.insert(item.catalog_id, stats.len());
                stats.push(AggregatedStat {
                    catalog_id: item.catalog_id,
                    name: item.name.clone(),
                    image_ref: item.image_ref.clone(),
                    total_quantity_sold: quantity,
                });
            }
        }
    }

    let grand_total = stats.iter().map(|stat| stat.total_quantity_sold).sum();

    // `sort_by` is stable, so ties stay in first-encountered order.
    stats.sort_by(|a, b| b.total_quantity_sold.cmp(&a.total_quantity_sold));
    stats.truncate(limit);

    TopSelling { stats, grand_total }
}

/// Headline figures for the sales history view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub record_count: usize,
    pub units_sold: u64,
    /// Σ quantity × unit price over every item.
    pub revenue: Price,
}

impl SalesSummary {
    #[must_use]
    pub fn from_records(records: &[SaleRecord]) -> Self {
        Self {
            record_count: records.len(),
            units_sold: records.iter().map(SaleRecord::total_quantity).sum(),
            revenue: records.iter().map(SaleRecord::total_price).sum(),
        }
    }
}
