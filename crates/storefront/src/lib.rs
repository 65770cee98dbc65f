//! PokeStore storefront library.
//!
//! Client-side core of the store: the session and authentication
//! lifecycle, the product catalog, the shopping cart, and the sale records
//! produced at checkout. Front ends build one [`Storefront`] and drive it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod sales;
pub mod session;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use config::StorefrontConfig;
pub use error::StorefrontError;
pub use state::Storefront;
