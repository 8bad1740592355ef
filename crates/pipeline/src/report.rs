//! Per-request outcome report.

use std::path::PathBuf;

use serde::{Serialize, Serializer};

use stacchip_core::BBox;

use crate::error::AssetError;

/// The scene chosen for a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub id: String,
    pub collection: Option<String>,
    pub datetime: Option<String>,
    pub coverage: f64,
    pub score: f64,
}

/// Result of retrieving one asset key.
#[derive(Debug, Serialize)]
pub struct AssetOutcome {
    pub asset_key: String,
    pub output_path: PathBuf,
    #[serde(serialize_with = "error_message", skip_serializing_if = "Option::is_none")]
    pub error: Option<AssetError>,
}

impl AssetOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn error_message<S: Serializer>(error: &Option<AssetError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_str(&e.to_string()),
        None => s.serialize_none(),
    }
}

/// What a pipeline run did: the AOI, the chosen scene (if any) and one
/// outcome per requested asset key, in request order.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub name: String,
    pub aoi_bbox: BBox,
    /// Number of candidates returned by the catalog.
    pub candidates: usize,
    pub scene: Option<SceneSummary>,
    pub assets: Vec<AssetOutcome>,
}

impl RunReport {
    /// A scene was selected and every asset was written.
    pub fn is_complete(&self) -> bool {
        self.scene.is_some() && self.assets.iter().all(AssetOutcome::is_ok)
    }

    /// Some but not all assets were written.
    pub fn is_partial(&self) -> bool {
        let ok = self.written().count();
        ok > 0 && ok < self.assets.len()
    }

    pub fn written(&self) -> impl Iterator<Item = &AssetOutcome> {
        self.assets.iter().filter(|a| a.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssetOutcome> {
        self.assets.iter().filter(|a| !a.is_ok())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
