//! # stacchip pipeline
//!
//! Acquires one clipped image chip per requested asset for a point of
//! interest:
//!
//! 1. build a circular area of interest around the point
//! 2. search the catalog for scenes intersecting it in a time window
//! 3. filter candidates by quality flags and rank them ([`select`])
//! 4. warp each requested asset of the chosen scene to the AOI bounding box
//!    ([`retrieve`])
//!
//! The catalog, signer and warp engine are injected as trait objects so the
//! whole pipeline runs against fakes in tests.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod retrieve;
pub mod select;

pub use config::{JobConfig, RequestParams, RunOptions};
pub use error::{AssetError, PipelineError, Result};
pub use pipeline::Pipeline;
pub use report::{AssetOutcome, RunReport, SceneSummary};
pub use retrieve::{AssetRequest, AssetRetriever, GdalWarp, RasterWarp, WarpOptions};
pub use select::{
    CloudCoverPredicate, FlagPredicate, QualityPredicate, RankingPolicy, ScoredCandidate,
    Selection, Selector,
};
