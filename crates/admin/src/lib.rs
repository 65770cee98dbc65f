//! PokeStore admin back-office.
//!
//! Everything here goes through an [`AdminConsole`], which only opens for a
//! logged-in administrator:
//!
//! - sales history across all users, with total revenue
//! - the top-selling products ranking
//! - inventory management (seed, update, delete)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod console;
pub mod error;
pub mod inventory;
pub mod reports;

#[cfg(test)]
mod test_support;

pub use console::AdminConsole;
pub use error::AdminError;
pub use reports::{
    DEFAULT_TOP_LIMIT, SalesHistory, SalesHistoryRow, TopSellingReport, TopSellingRow,
};
