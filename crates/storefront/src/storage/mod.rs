//! Client-side persisted storage.
//!
//! A small string key/value interface in the spirit of browser local storage.
//! Every persisted value is JSON; [`read_json`] treats a value that fails to
//! parse as absent so that corrupt data never takes the client down.
//!
//! # Keys
//!
//! See [`keys`] for the layout.

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// A synchronous string key/value store.
///
/// Implementations must be safe to share between the session, cart and
/// sales components of one client process.
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage keys.
pub mod keys {
    /// The bearer token (JSON string).
    pub const TOKEN: &str = "jwt_token";

    /// The serialized cart (JSON array of cart lines).
    pub const CART: &str = "cart";

    /// Registry of owner ids that have persisted sales (JSON array of strings).
    pub const SALES_INDEX: &str = "sales_index";

    /// Prefix of the per-user sales keys.
    pub const SALES_PREFIX: &str = "sales_user_";

    /// The sales key for one owner.
    #[must_use]
    pub fn sales_for(owner_user_id: &str) -> String {
        format!("{SALES_PREFIX}{owner_user_id}")
    }
}

/// Read and deserialize the JSON value under `key`.
///
/// A value that does not parse as `T` is logged and reported as `None`.
///
/// # Errors
///
/// Returns `StorageError` only if the backing store itself fails.
pub fn read_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Ignoring corrupt stored value");
            Ok(None)
        }
    }
}

/// Serialize `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)?;
    debug!(key, bytes = raw.len(), "Stored value");
    Ok(())
}
