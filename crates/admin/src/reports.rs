//! Sales history and top-selling reports.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pokestore_core::{Price, SaleId};
use pokestore_storefront::sales::{
    AggregatedStat, SaleRecord, SalesSummary, aggregate_top_selling,
};

use crate::console::AdminConsole;
use crate::error::AdminError;

/// How many products the top-selling report shows by default.
pub const DEFAULT_TOP_LIMIT: usize = 5;

/// One row of the sales history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesHistoryRow {
    pub sale_id: SaleId,
    pub timestamp: DateTime<Utc>,
    pub owner_user_id: String,
    /// Units across the record's items.
    pub units: u64,
    pub total: Price,
}

impl From<&SaleRecord> for SalesHistoryRow {
    fn from(record: &SaleRecord) -> Self {
        Self {
            sale_id: record.id,
            timestamp: record.timestamp,
            owner_user_id: record.owner_user_id.clone(),
            units: record.total_quantity(),
            total: record.total_price(),
        }
    }
}

/// Every sale, most recent first, with the headline totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesHistory {
    pub rows: Vec<SalesHistoryRow>,
    pub summary: SalesSummary,
}

/// One ranked product in the top-selling report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingRow {
    /// 1-based position.
    pub rank: usize,
    pub stat: AggregatedStat,
    /// Share of all units sold, in percent.
    pub share_percent: Decimal,
}

/// Best-selling products across every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellingReport {
    pub rows: Vec<TopSellingRow>,
    /// Units sold across every product, ranked or not.
    pub grand_total: u64,
}

impl AdminConsole {
    /// Every user's sales, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`/`NotAuthenticated` for non-admins, or
    /// `AdminError::Storage` if the records cannot be read.
    pub fn sales_history(&self) -> Result<SalesHistory, AdminError> {
        let records = self.storefront()?.all_sales()?;
        Ok(SalesHistory {
            rows: records.iter().map(SalesHistoryRow::from).collect(),
            summary: SalesSummary::from_records(&records),
        })
    }

    /// Total revenue across every sale.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConsole::sales_history`].
    pub fn total_revenue(&self) -> Result<Price, AdminError> {
        Ok(self.sales_history()?.summary.revenue)
    }

    /// The `limit` best-selling products.
    ///
    /// # Errors
    ///
    /// Same as [`AdminConsole::sales_history`].
    pub fn top_selling(&self, limit: usize) -> Result<TopSellingReport, AdminError> {
        let records = self.storefront()?.all_sales()?;
        let top = aggregate_top_selling(&records, limit);

        let rows = top
            .stats
            .iter()
            .enumerate()
            .map(|(position, stat)| TopSellingRow {
                rank: position + 1,
                stat: stat.clone(),
                share_percent: top.share_percent(stat),
            })
            .collect();

        Ok(TopSellingReport {
            rows,
            grand_total: top.grand_total,
        })
    }
}
