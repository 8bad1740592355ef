//! Async STAC client for searching spatio-temporal asset catalogs.
//!
//! Supports Planetary Computer and Earth Search out of the box, plus
//! arbitrary STAC API endpoints via [`StacCatalog::Custom`].

use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::CatalogQuery;
use crate::error::{CloudError, Result};
use crate::stac_models::{StacItem, StacItemCollection, StacLink, StacSearchParams};

const PC_SIGN_URL: &str = "https://planetarycomputer.microsoft.com/api/sas/v1/sign";

// ---------------------------------------------------------------------------
// Catalog enum
// ---------------------------------------------------------------------------

/// Well-known STAC catalogs plus custom endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StacCatalog {
    /// Microsoft Planetary Computer STAC API.
    PlanetaryComputer,
    /// AWS Earth Search (Element 84).
    EarthSearch,
    /// Any STAC API endpoint (provide the root URL, e.g.
    /// `"https://my-stac.example.com/api/v1"`).
    Custom(String),
}

impl StacCatalog {
    /// Return the full POST `/search` URL for this catalog.
    pub fn search_url(&self) -> String {
        match self {
            Self::PlanetaryComputer => {
                "https://planetarycomputer.microsoft.com/api/stac/v1/search".to_string()
            }
            Self::EarthSearch => "https://earth-search.aws.element84.com/v1/search".to_string(),
            Self::Custom(base) => {
                let base = base.trim_end_matches('/');
                if base.ends_with("/search") {
                    base.to_string()
                } else {
                    format!("{}/search", base)
                }
            }
        }
    }

    /// Parse a shorthand string into a catalog.
    ///
    /// Recognized shorthands: `"pc"`, `"planetary-computer"`, `"es"`,
    /// `"earth-search"`. Anything else is treated as a custom URL.
    pub fn from_str_or_url(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pc" | "planetary-computer" | "planetarycomputer" => Self::PlanetaryComputer,
            "es" | "earth-search" | "earthsearch" => Self::EarthSearch,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Whether this catalog requires SAS token signing for asset access.
    pub fn needs_signing(&self) -> bool {
        matches!(self, Self::PlanetaryComputer)
    }
}

impl Default for StacCatalog {
    fn default() -> Self {
        Self::PlanetaryComputer
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`StacClient`].
#[derive(Debug, Clone)]
pub struct StacClientOptions {
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
    /// Retries on transient failures (default 0: each call is attempted once).
    pub max_retries: u32,
    /// Maximum total items to fetch across pages when the query sets no cap
    /// (default 100).
    pub max_items: usize,
    /// Items requested per page (default 100).
    pub page_size: u32,
}

impl Default for StacClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 0,
            max_items: 100,
            page_size: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Async client for STAC Item Search.
pub struct StacClient {
    catalog: StacCatalog,
    client: reqwest::Client,
    options: StacClientOptions,
}

impl StacClient {
    /// Create a new STAC client.
    pub fn new(catalog: StacCatalog, options: StacClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            catalog,
            client,
            options,
        })
    }

    /// The catalog this client is configured for.
    pub fn catalog(&self) -> &StacCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &StacClientOptions {
        &self.options
    }

    // ── Single-page search ──────────────────────────────────────────

    /// Execute a single search request and return one page of results.
    pub async fn search(&self, params: &StacSearchParams) -> Result<StacItemCollection> {
        let url = self.catalog.search_url();
        self.post_search(&url, params).await
    }

    // ── Paginated search ────────────────────────────────────────────

    /// Run a validated query, following pagination until the item cap is
    /// reached or the catalog runs out of pages. Catalog order is preserved.
    pub async fn search_all(&self, query: &CatalogQuery) -> Result<Vec<StacItem>> {
        query.validate()?;

        let max = query.max_items.unwrap_or(self.options.max_items);
        let params = query.to_search_params(Some(self.options.page_size));
        let mut all_items: Vec<StacItem> = Vec::new();

        let mut page = self.search(&params).await?;

        loop {
            let next = page.next_link().cloned();
            debug!(page_items = page.len(), total = all_items.len(), "received STAC page");
            all_items.append(&mut page.features);

            if all_items.len() >= max {
                break;
            }

            match next {
                Some(link) => {
                    page = self.follow_next(&link, &params).await?;
                    if page.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }

        all_items.truncate(max);
        Ok(all_items)
    }

    // ── Planetary Computer SAS token signing ────────────────────────

    /// Sign an asset href for Planetary Computer via the `/sign` endpoint.
    ///
    /// For non-PC catalogs this is a no-op and returns the href unchanged.
    pub async fn sign_asset_href(&self, href: &str) -> Result<String> {
        if !self.catalog.needs_signing() {
            return Ok(href.to_string());
        }
        self.sign_pc_href(href).await
    }

    // ── Private helpers ─────────────────────────────────────────────

    async fn post_search(&self, url: &str, params: &StacSearchParams) -> Result<StacItemCollection> {
        let mut attempt = 0;
        loop {
            let outcome = match self.client.post(url).json(params).send().await {
                Ok(resp) if resp.status().is_success() => return read_collection(resp).await,
                Ok(resp) => {
                    let status = resp.status();
                    let err = CloudError::Network(failure_message("search", resp).await);
                    // 4xx means the request itself is wrong
                    if status.is_client_error() {
                        return Err(err);
                    }
                    err
                }
                Err(e) => CloudError::Http(e),
            };

            if attempt >= self.options.max_retries {
                return Err(outcome);
            }
            attempt += 1;
            let delay = Duration::from_millis(500 << (attempt - 1).min(6));
            warn!(attempt, url, error = %outcome, ?delay, "search failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    /// Fetch the page a `next` link points at.
    ///
    /// POST links carry a body that either replaces the previous request or,
    /// with `merge: true`, overrides its fields. Other links are plain GETs.
    async fn follow_next(&self, link: &StacLink, previous: &StacSearchParams) -> Result<StacItemCollection> {
        let is_post = link
            .method
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("POST"));

        if !is_post {
            let resp = self.client.get(&link.href).send().await?;
            if !resp.status().is_success() {
                return Err(CloudError::Network(failure_message("next page", resp).await));
            }
            return read_collection(resp).await;
        }

        let params = match (&link.body, link.merge.unwrap_or(false)) {
            (Some(body), true) => {
                let mut merged = to_json(previous)?;
                if let (Some(target), Some(overrides)) = (merged.as_object_mut(), body.as_object()) {
                    target.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                from_json(merged)?
            }
            (Some(body), false) => from_json(body.clone())?,
            (None, _) => previous.clone(),
        };
        self.post_search(&link.href, &params).await
    }

    /// Exchange an href for a SAS-signed one at the Planetary Computer.
    async fn sign_pc_href(&self, href: &str) -> Result<String> {
        let resp = self
            .client
            .get(PC_SIGN_URL)
            .query(&[("href", href)])
            .send()
            .await
            .map_err(|e| CloudError::Auth(format!("sign request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(CloudError::Auth(failure_message("sign", resp).await));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CloudError::Auth(format!("unreadable sign response: {e}")))?;
        body.get("href")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CloudError::Auth("sign response has no href".into()))
    }
}

async fn read_collection(resp: reqwest::Response) -> Result<StacItemCollection> {
    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| CloudError::Network(format!("not a STAC item collection: {e}")))
}

/// `"{what} returned HTTP {status}: {body}"`, body truncated.
async fn failure_message(what: &str, resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let body: String = body.chars().take(300).collect();
    format!("{what} returned HTTP {status}: {body}")
}

fn to_json(params: &StacSearchParams) -> Result<serde_json::Value> {
    serde_json::to_value(params).map_err(|e| CloudError::Network(format!("encoding search body: {e}")))
}

fn from_json(body: serde_json::Value) -> Result<StacSearchParams> {
    serde_json::from_value(body).map_err(|e| CloudError::Network(format!("decoding next-page body: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
