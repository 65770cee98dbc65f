//! PokeStore Core - Shared domain types.
//!
//! This crate provides the value types used across all PokeStore components:
//! - `storefront` - Session, cart, purchases and sales aggregation
//! - `admin` - Back-office reports and inventory management
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. Anything that touches the network or persisted state
//! lives in `pokestore-storefront`.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, prices, emails, products and identities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
