//! Catalog search requests and the search seam used by the pipeline.

use crate::error::{CloudError, Result};
use crate::stac_models::{StacItem, StacSearchParams};

/// A catalog search over collections, geometry, time window and
/// attribute filters.
///
/// At least one of `collections`, `intersects`, `datetime` or `query` must be
/// set; an entirely unfiltered search is rejected before any network call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    pub collections: Option<Vec<String>>,
    /// GeoJSON geometry in WGS84.
    pub intersects: Option<serde_json::Value>,
    /// Closed interval `"start/end"` of ISO-8601 dates or timestamps.
    pub datetime: Option<String>,
    /// Property filters understood by the catalog, passed through as-is.
    pub query: Option<serde_json::Value>,
    /// Cap on the number of items collected across pages.
    pub max_items: Option<usize>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collections<S: AsRef<str>>(mut self, cols: &[S]) -> Self {
        self.collections = Some(cols.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    pub fn intersects(mut self, geometry: serde_json::Value) -> Self {
        self.intersects = Some(geometry);
        self
    }

    pub fn datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }

    pub fn query(mut self, query: Option<serde_json::Value>) -> Self {
        self.query = query;
        self
    }

    pub fn max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }

    /// Reject queries without any filter.
    pub fn validate(&self) -> Result<()> {
        if self.collections.is_none()
            && self.intersects.is_none()
            && self.datetime.is_none()
            && self.query.is_none()
        {
            return Err(CloudError::InvalidQuery(
                "must set at least one of collections, intersects, datetime or query".into(),
            ));
        }
        if let Some(0) = self.max_items {
            return Err(CloudError::InvalidQuery("max_items must be positive".into()));
        }
        Ok(())
    }

    /// Request body for the first `POST /search` page.
    pub fn to_search_params(&self, page_size: Option<u32>) -> StacSearchParams {
        let limit = match (self.max_items, page_size) {
            (Some(max), Some(page)) => Some(page.min(u32::try_from(max).unwrap_or(u32::MAX))),
            (Some(max), None) => u32::try_from(max).ok(),
            (None, page) => page,
        };
        StacSearchParams {
            collections: self.collections.clone(),
            intersects: self.intersects.clone(),
            datetime: self.datetime.clone(),
            query: self.query.clone(),
            limit,
            ..StacSearchParams::default()
        }
    }
}

/// Build a STAC datetime interval `"start/end"`.
pub fn datetime_range(start: &str, end: &str) -> String {
    format!("{start}/{end}")
}

/// Something that can answer a [`CatalogQuery`] with candidate scenes.
///
/// Results keep the catalog's order. An empty vector means the search
/// succeeded and matched nothing; failures are errors.
pub trait Catalog: Send + Sync {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<StacItem>>;
}
