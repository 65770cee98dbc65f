//! Catalog management.

use std::sync::Arc;

use tracing::info;

use pokestore_core::{Product, ProductId};
use pokestore_storefront::catalog::UpdateProduct;

use crate::console::AdminConsole;
use crate::error::AdminError;

impl AdminConsole {
    /// The current catalog.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`/`NotAuthenticated` for non-admins, or
    /// `AdminError::Catalog` if the listing cannot be fetched.
    pub async fn inventory(&self) -> Result<Arc<[Product]>, AdminError> {
        Ok(self.storefront()?.catalog().list_products().await?)
    }

    /// Load the backend's initial product set.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`/`NotAuthenticated` for non-admins, or
    /// `AdminError::Catalog` if the backend rejects the request.
    pub async fn seed_inventory(&self) -> Result<(), AdminError> {
        let admin = self.admin()?;
        self.storefront()?.catalog().seed().await?;
        info!(admin = %admin.id, "Inventory seeded");
        Ok(())
    }

    /// Change fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`/`NotAuthenticated` for non-admins, or
    /// `AdminError::Catalog` for an empty update or a rejected request.
    pub async fn update_product(
        &self,
        catalog_id: ProductId,
        update: &UpdateProduct,
    ) -> Result<(), AdminError> {
        let admin = self.admin()?;
        self.storefront()?
            .catalog()
            .update_product(catalog_id, update)
            .await?;
        info!(admin = %admin.id, %catalog_id, "Product updated");
        Ok(())
    }

    /// Remove a product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`/`NotAuthenticated` for non-admins, or
    /// `AdminError::Catalog` if the backend rejects the request.
    pub async fn delete_product(&self, catalog_id: ProductId) -> Result<(), AdminError> {
        let admin = self.admin()?;
        self.storefront()?.catalog().delete_product(catalog_id).await?;
        info!(admin = %admin.id, %catalog_id, "Product deleted");
        Ok(())
    }
}
