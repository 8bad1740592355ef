//! # stacchip cloud
//!
//! STAC (SpatioTemporal Asset Catalog) access for stacchip.
//!
//! - [`StacClient`]: async Item Search with pagination and Planetary
//!   Computer SAS signing
//! - [`CatalogQuery`]: validated search request (spatial, temporal,
//!   attribute filters)
//! - [`blocking`]: synchronous facade implementing the [`Catalog`] and
//!   [`AssetSigner`] traits consumed by the acquisition pipeline

pub mod auth;
pub mod catalog;
pub mod error;
pub mod stac_client;
pub mod stac_models;
pub mod sync_api;

pub use auth::{AssetSigner, NoSigning};
pub use catalog::{datetime_range, Catalog, CatalogQuery};
pub use error::{CloudError, Result};
pub use stac_client::{StacCatalog, StacClient, StacClientOptions};
pub use stac_models::{StacAsset, StacItem, StacItemCollection, StacSearchParams};

/// Blocking API re-exported as `blocking` module.
pub mod blocking {
    pub use crate::sync_api::*;
}
