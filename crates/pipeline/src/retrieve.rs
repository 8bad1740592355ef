//! Asset retrieval: resolve a scene asset to a fetchable URL and warp it to
//! the AOI bounding box.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stacchip_cloud::{AssetSigner, StacItem};
use stacchip_core::BBox;

use crate::error::AssetError;

/// Reprojects and clips a (possibly remote) raster into a local file.
pub trait RasterWarp: Send + Sync {
    /// Warp `source` to geographic coordinates, clipped to `bbox`
    /// `[minX, minY, maxX, maxY]`, writing `output`.
    fn warp(&self, source: &str, bbox: &BBox, output: &Path) -> Result<(), AssetError>;
}

/// Options for the warp output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpOptions {
    /// Target CRS passed to `-t_srs`.
    pub target_crs: String,
    /// GeoTIFF compression: "DEFLATE", "LZW", "ZSTD"; `None` leaves the driver default.
    pub compression: Option<String>,
    /// Extra arguments inserted before the source path.
    pub extra_args: Vec<String>,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            target_crs: "EPSG:4326".to_string(),
            compression: Some("DEFLATE".to_string()),
            extra_args: Vec::new(),
        }
    }
}

/// [`RasterWarp`] backed by the `gdalwarp` executable.
///
/// Remote sources are read through `/vsicurl/`, so only the blocks
/// intersecting the bounding box are fetched.
#[derive(Debug, Clone)]
pub struct GdalWarp {
    program: PathBuf,
    options: WarpOptions,
}

impl Default for GdalWarp {
    fn default() -> Self {
        Self::new("gdalwarp", WarpOptions::default())
    }
}

impl GdalWarp {
    pub fn new(program: impl Into<PathBuf>, options: WarpOptions) -> Self {
        Self {
            program: program.into(),
            options,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn options(&self) -> &WarpOptions {
        &self.options
    }

    /// Full argument list for one invocation.
    pub fn command_args(&self, source: &str, bbox: &BBox, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-overwrite".into(), "-te".into()];
        args.extend(bbox.to_array().iter().map(|v| OsString::from(v.to_string())));
        args.push("-t_srs".into());
        args.push(self.options.target_crs.clone().into());
        if let Some(compression) = &self.options.compression {
            args.push("-co".into());
            args.push(format!("COMPRESS={compression}").into());
        }
        args.extend(self.options.extra_args.iter().map(OsString::from));
        args.push(vsi_source(source).into());
        args.push(output.as_os_str().to_owned());
        args
    }
}

/// Prefix http(s) URLs with GDAL's `/vsicurl/` handler; local paths and
/// already-prefixed sources pass through.
pub fn vsi_source(source: &str) -> String {
    if source.starts_with("http://") || source.starts_with("https://") {
        format!("/vsicurl/{source}")
    } else {
        source.to_string()
    }
}

impl RasterWarp for GdalWarp {
    fn warp(&self, source: &str, bbox: &BBox, output: &Path) -> Result<(), AssetError> {
        let args = self.command_args(source, bbox, output);
        debug!(program = %self.program.display(), ?args, "running warp");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| AssetError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if result.status.success() {
            Ok(())
        } else {
            Err(AssetError::Retrieval {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            })
        }
    }
}

/// One asset of the chosen scene to write to `output`.
#[derive(Debug, Clone)]
pub struct AssetRequest<'a> {
    pub scene: &'a StacItem,
    pub asset_key: String,
    pub bbox: BBox,
    pub output: PathBuf,
}

/// Resolves asset hrefs through a signer and hands them to a warp engine.
#[derive(Clone, Copy)]
pub struct AssetRetriever<'a> {
    signer: &'a dyn AssetSigner,
    warp: &'a dyn RasterWarp,
}

impl<'a> AssetRetriever<'a> {
    pub fn new(signer: &'a dyn AssetSigner, warp: &'a dyn RasterWarp) -> Self {
        Self { signer, warp }
    }

    /// Fetch `asset_key` of `scene`, clipped to `bbox`, into `output`.
    ///
    /// Creates the parent directory if needed and overwrites an existing
    /// file. Returns the written path.
    pub fn fetch_and_clip(
        &self,
        scene: &StacItem,
        asset_key: &str,
        bbox: &BBox,
        output: &Path,
    ) -> Result<PathBuf, AssetError> {
        let asset = scene
            .asset(asset_key)
            .ok_or_else(|| AssetError::AssetNotFound {
                scene: scene.id.clone(),
                key: asset_key.to_string(),
            })?;

        let href = self
            .signer
            .sign(&asset.href)
            .map_err(|source| AssetError::Authorization {
                key: asset_key.to_string(),
                source,
            })?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AssetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!(scene = %scene.id, asset = asset_key, output = %output.display(), "retrieving asset");
        self.warp.warp(&href, bbox, output).map_err(|e| {
            warn!(scene = %scene.id, asset = asset_key, error = %e, "asset retrieval failed");
            e
        })?;

        Ok(output.to_path_buf())
    }

    pub fn fetch(&self, request: &AssetRequest<'_>) -> Result<PathBuf, AssetError> {
        self.fetch_and_clip(request.scene, &request.asset_key, &request.bbox, &request.output)
    }
}
