//! Request orchestration: AOI → catalog search → selection → retrieval.

use rayon::prelude::*;
use tracing::{info, warn};

use stacchip_cloud::{AssetSigner, Catalog, CatalogQuery};
use stacchip_core::build_aoi;

use crate::config::{RequestParams, RunOptions};
use crate::error::{PipelineError, Result};
use crate::report::{AssetOutcome, RunReport, SceneSummary};
use crate::retrieve::{AssetRequest, AssetRetriever, RasterWarp};
use crate::select::{Selection, Selector};

/// Runs acquisition requests against injected collaborators.
///
/// # Example
/// ```ignore
/// let client = StacClientBlocking::new(StacCatalog::PlanetaryComputer, Default::default())?;
/// let warp = GdalWarp::default();
/// let report = Pipeline::new(&client, &client, &warp).run(&params)?;
/// ```
pub struct Pipeline<'a> {
    catalog: &'a dyn Catalog,
    retriever: AssetRetriever<'a>,
    selector: Selector,
    options: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        signer: &'a dyn AssetSigner,
        warp: &'a dyn RasterWarp,
    ) -> Self {
        Self {
            catalog,
            retriever: AssetRetriever::new(signer, warp),
            selector: Selector::default(),
            options: RunOptions::default(),
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Acquire every requested asset of the best scene for `params`.
    ///
    /// Geometry, query and catalog failures abort the request. Asset
    /// failures are recorded in the report and do not stop other assets.
    pub fn run(&self, params: &RequestParams) -> Result<RunReport> {
        params.validate()?;

        let aoi = build_aoi(params.lat, params.lon, params.radius)?;
        let bbox = aoi.bbox();

        let query = CatalogQuery::new()
            .collections(&[params.collection_id.as_str()])
            .intersects(aoi.to_geojson())
            .datetime(params.datetime())
            .query(params.query.clone())
            .max_items(params.max_items);

        let candidates = self.catalog.search(&query)?;
        info!(
            name = %params.name,
            candidates = candidates.len(),
            "catalog search complete"
        );

        let mut report = RunReport {
            name: params.name.clone(),
            aoi_bbox: bbox,
            candidates: candidates.len(),
            scene: None,
            assets: Vec::new(),
        };

        let chosen = match self.selector.select(&candidates, &aoi) {
            Selection::Chosen(chosen) => chosen,
            Selection::NoEligibleCandidate => {
                warn!(name = %params.name, "no eligible candidate, nothing to retrieve");
                return Ok(report);
            }
        };
        info!(
            scene = %chosen.item.id,
            coverage = chosen.coverage,
            policy = %self.selector.policy(),
            "selected scene"
        );
        report.scene = Some(SceneSummary {
            id: chosen.item.id.clone(),
            collection: chosen.item.collection.clone(),
            datetime: chosen.item.properties.datetime.clone(),
            coverage: chosen.coverage,
            score: chosen.score,
        });

        let requests: Vec<AssetRequest<'_>> = params
            .target_asset_keys
            .iter()
            .map(|key| AssetRequest {
                scene: chosen.item,
                asset_key: key.clone(),
                bbox,
                output: params.output_path(key),
            })
            .collect();

        report.assets = self.retrieve_all(&requests)?;
        info!(
            written = report.written().count(),
            failed = report.failures().count(),
            "retrieval finished"
        );
        Ok(report)
    }

    /// One outcome per request, in request order.
    fn retrieve_all(&self, requests: &[AssetRequest<'_>]) -> Result<Vec<AssetOutcome>> {
        let fetch = |request: &AssetRequest<'_>| AssetOutcome {
            asset_key: request.asset_key.clone(),
            output_path: request.output.clone(),
            error: self.retriever.fetch(request).err(),
        };

        let threads = self.options.parallel_assets.min(requests.len());
        if threads <= 1 {
            return Ok(requests.iter().map(fetch).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build thread pool: {e}")))?;
        Ok(pool.install(|| requests.par_iter().map(fetch).collect()))
    }
}
