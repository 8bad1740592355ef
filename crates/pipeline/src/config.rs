//! Request parameters and job configuration loaded from TOML.
//!
//! A job file has one required `[request]` table and optional `[catalog]`,
//! `[selection]`, `[warp]` and `[run]` tables:
//!
//! ```toml
//! [request]
//! name = "site_a"
//! lat = 40.0
//! lon = -105.0
//! radius = 500
//! collection_id = "landsat-c2-l2"
//! target_asset_keys = ["red", "nir08"]
//! start_query = "2023-06-01"
//! end_query = "2023-08-31"
//! out_dir = "data/site_a"
//!
//! [selection]
//! policy = { kind = "max-coverage" }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use stacchip_cloud::{datetime_range, StacCatalog, StacClientOptions};

use crate::error::{PipelineError, Result};
use crate::retrieve::{GdalWarp, WarpOptions};
use crate::select::{CloudCoverPredicate, FlagPredicate, RankingPolicy, Selector, BANDING_FLAG};

/// Everything one acquisition request needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestParams {
    /// Site name, first component of the output file prefix.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// AOI radius in metres.
    pub radius: f64,
    pub collection_id: String,
    /// Attribute filter forwarded to the catalog as-is.
    #[serde(default)]
    pub query: Option<serde_json::Value>,
    pub target_asset_keys: Vec<String>,
    /// Start of the search window, `YYYY-MM-DD` or a full timestamp.
    pub start_query: String,
    pub end_query: String,
    pub out_dir: PathBuf,
    #[serde(default)]
    pub max_items: Option<usize>,
    /// Overrides the derived output file prefix.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl RequestParams {
    /// Check parameters that the AOI and catalog layers do not.
    pub fn validate(&self) -> Result<()> {
        if self.collection_id.trim().is_empty() {
            return Err(PipelineError::Config("collection_id is empty".into()));
        }
        if self.target_asset_keys.is_empty() {
            return Err(PipelineError::Config("target_asset_keys is empty".into()));
        }
        if let Some(key) = self.target_asset_keys.iter().find(|k| k.trim().is_empty()) {
            return Err(PipelineError::Config(format!("invalid asset key '{key}'")));
        }
        Ok(())
    }

    /// `{name}_{lat}_{lon}_{radius}m_`, unless overridden.
    pub fn prefix(&self) -> String {
        match &self.prefix {
            Some(prefix) => prefix.clone(),
            None => format!(
                "{}_{}_{}_{}m_",
                self.name,
                format_coordinate(self.lat),
                format_coordinate(self.lon),
                self.radius
            ),
        }
    }

    /// `{out_dir}/{prefix}{asset_key}.tif`
    pub fn output_path(&self, asset_key: &str) -> PathBuf {
        self.out_dir.join(format!("{}{}.tif", self.prefix(), asset_key))
    }

    /// STAC datetime interval of the search window.
    pub fn datetime(&self) -> String {
        datetime_range(&self.start_query, &self.end_query)
    }
}

/// Coordinates always keep a decimal point (`40.0`, not `40`).
fn format_coordinate(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Directory holding the first of a list of expected output files.
pub fn out_dir_from_outputs<P: AsRef<Path>>(outputs: &[P]) -> Option<PathBuf> {
    outputs
        .first()
        .map(|p| p.as_ref().parent().map(Path::to_path_buf).unwrap_or_default())
}

/// Which catalog to search and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// `pc`, `es` or a full STAC API URL.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub page_size: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        let options = StacClientOptions::default();
        Self {
            endpoint: "pc".to_string(),
            timeout_secs: options.request_timeout.as_secs(),
            max_retries: options.max_retries,
            page_size: options.page_size,
        }
    }
}

impl CatalogSettings {
    pub fn catalog(&self) -> StacCatalog {
        StacCatalog::from_str_or_url(&self.endpoint)
    }

    /// Client options; `max_items` caps pagination when the request has
    /// its own limit.
    pub fn client_options(&self, max_items: Option<usize>) -> StacClientOptions {
        let defaults = StacClientOptions::default();
        StacClientOptions {
            request_timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            max_items: max_items.unwrap_or(defaults.max_items),
            page_size: self.page_size,
        }
    }
}

/// Candidate filtering and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    pub policy: RankingPolicy,
    pub min_coverage: f64,
    /// Boolean properties that disqualify a scene when `true`.
    pub quality_flags: Vec<String>,
    pub max_cloud_cover: Option<f64>,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            policy: RankingPolicy::default(),
            min_coverage: 0.0,
            quality_flags: vec![BANDING_FLAG.to_string()],
            max_cloud_cover: None,
        }
    }
}

impl SelectionSettings {
    pub fn selector(&self) -> Selector {
        let mut selector = self
            .quality_flags
            .iter()
            .fold(Selector::new(), |s, flag| s.with_predicate(FlagPredicate::new(flag.clone())));
        if let Some(max_cloud_cover) = self.max_cloud_cover {
            selector = selector.with_predicate(CloudCoverPredicate { max_cloud_cover });
        }
        selector
            .with_policy(self.policy)
            .with_min_coverage(self.min_coverage)
    }
}

/// The `gdalwarp` executable and its output options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpSettings {
    pub program: PathBuf,
    #[serde(flatten)]
    pub options: WarpOptions,
}

impl Default for WarpSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gdalwarp"),
            options: WarpOptions::default(),
        }
    }
}

impl WarpSettings {
    pub fn gdalwarp(&self) -> GdalWarp {
        GdalWarp::new(self.program.clone(), self.options.clone())
    }
}

/// Execution options of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Assets retrieved concurrently; 1 runs them one after another.
    pub parallel_assets: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { parallel_assets: 1 }
    }
}

/// A complete job file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub request: RequestParams,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub warp: WarpSettings,
    #[serde(default)]
    pub run: RunOptions,
}

impl JobConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: JobConfig =
            toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.request.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}
