//! Blocking (synchronous) API.
//!
//! Wraps the async [`StacClient`] with a Tokio runtime so the acquisition
//! pipeline can stay synchronous.

use tracing::{debug, info};

use crate::auth::AssetSigner;
use crate::catalog::{Catalog, CatalogQuery};
use crate::error::{CloudError, Result};
use crate::stac_client::{StacCatalog, StacClient, StacClientOptions};
use crate::stac_models::StacItem;

/// Blocking wrapper around [`StacClient`].
///
/// Owns a single-threaded Tokio runtime. Construct once per process and
/// share it by reference.
pub struct StacClientBlocking {
    rt: tokio::runtime::Runtime,
    inner: StacClient,
}

impl StacClientBlocking {
    /// Create a new blocking STAC client.
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CloudError::Network(format!("failed to start runtime: {e}")))?;

        let inner = StacClient::new(catalog, options)?;
        Ok(Self { rt, inner })
    }

    pub fn catalog(&self) -> &StacCatalog {
        self.inner.catalog()
    }

    /// Validated search with automatic pagination (blocking).
    pub fn search_all(&self, query: &CatalogQuery) -> Result<Vec<StacItem>> {
        self.rt.block_on(self.inner.search_all(query))
    }

    /// Sign an asset href for Planetary Computer (blocking).
    pub fn sign_asset_href(&self, href: &str) -> Result<String> {
        self.rt.block_on(self.inner.sign_asset_href(href))
    }
}

impl Catalog for StacClientBlocking {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<StacItem>> {
        info!(
            catalog = %self.inner.catalog().search_url(),
            collections = ?query.collections,
            datetime = ?query.datetime,
            "searching catalog"
        );
        let items = self.search_all(query)?;
        info!(count = items.len(), "catalog returned candidates");
        Ok(items)
    }
}

impl AssetSigner for StacClientBlocking {
    fn sign(&self, href: &str) -> Result<String> {
        let signed = self.sign_asset_href(href)?;
        debug!(href, signed = signed != href, "resolved asset href");
        Ok(signed)
    }
}
