//! Command implementations.

pub mod account;
pub mod admin;
pub mod output;
pub mod shop;
