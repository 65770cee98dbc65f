//! Admin error types.

use thiserror::Error;

use pokestore_storefront::catalog::CatalogError;
use pokestore_storefront::storage::StorageError;

/// Errors that can occur in the back-office.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Nobody is logged in.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The logged-in user is not an administrator.
    #[error("Administrator access required")]
    Forbidden,

    /// Sale records could not be read.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// An inventory operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
