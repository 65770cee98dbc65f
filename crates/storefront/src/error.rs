//! Unified error handling for the storefront.
//!
//! Each subsystem has its own error type; `StorefrontError` wraps them for
//! callers that drive several subsystems at once (the CLI, the admin crate).

use thiserror::Error;

use pokestore_core::ProductId;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Storefront-level error type.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Client storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Login or registration failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// A remote call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// No product has this catalog id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The operation needs a logged-in user.
    #[error("Not logged in")]
    NotAuthenticated,
}

impl StorefrontError {
    /// Whether the error points at a fault on our side or the backend's,
    /// as opposed to something the user can fix by retrying differently.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Config(_) | Self::Storage(_) => true,
            Self::Api(e) | Self::Catalog(CatalogError::Api(e)) => {
                matches!(e, ApiError::Decode(_) | ApiError::InvalidUrl(_))
                    || matches!(e, ApiError::Status { status, .. } if *status >= 500)
            }
            Self::Auth(AuthError::Storage(_)) => true,
            _ => false,
        }
    }
}
