//! Core types for PokeStore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod identity;
pub mod price;
pub mod product;

pub use email::{Email, EmailError};
pub use id::*;
pub use identity::{ADMIN_ROLE, Identity, RoleClaim, Roles};
pub use price::{Price, PriceError};
pub use product::Product;
