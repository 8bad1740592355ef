//! End-to-end pipeline runs against in-memory collaborators.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use stacchip_cloud::{
    Catalog, CatalogQuery, CloudError, NoSigning, StacAsset, StacItem,
};
use stacchip_core::{build_aoi, BBox};
use stacchip_pipeline::{
    AssetError, Pipeline, PipelineError, RankingPolicy, RasterWarp, RequestParams, RunOptions,
    Selector,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeCatalog {
    items: Vec<StacItem>,
    queries: Mutex<Vec<CatalogQuery>>,
}

impl FakeCatalog {
    fn new(items: Vec<StacItem>) -> Self {
        Self {
            items,
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl Catalog for FakeCatalog {
    fn search(&self, query: &CatalogQuery) -> stacchip_cloud::Result<Vec<StacItem>> {
        query.validate()?;
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.items.clone())
    }
}

struct DownCatalog;

impl Catalog for DownCatalog {
    fn search(&self, _query: &CatalogQuery) -> stacchip_cloud::Result<Vec<StacItem>> {
        Err(CloudError::Network("connection refused".into()))
    }
}

/// Writes the source and bbox into the output file.
#[derive(Default)]
struct FileWarp {
    calls: Mutex<Vec<(String, BBox, PathBuf)>>,
}

impl RasterWarp for FileWarp {
    fn warp(&self, source: &str, bbox: &BBox, output: &Path) -> Result<(), AssetError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_string(), *bbox, output.to_path_buf()));
        std::fs::write(output, format!("{source} {:?}", bbox.to_array())).map_err(|source| {
            AssetError::Io {
                path: output.to_path_buf(),
                source,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn scene(id: &str, keys: &[&str], props: serde_json::Value) -> StacItem {
    let mut item: StacItem = serde_json::from_value(serde_json::json!({
        "id": id,
        "collection": "test-collection",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-106.0, 39.0], [-104.0, 39.0], [-104.0, 41.0], [-106.0, 41.0], [-106.0, 39.0]]]
        },
        "properties": props,
    }))
    .unwrap();
    for key in keys {
        item.assets.insert(
            key.to_string(),
            StacAsset::from_href(format!("https://example.com/{id}/{key}.tif")),
        );
    }
    item
}

fn params(out_dir: &Path, keys: &[&str]) -> RequestParams {
    RequestParams {
        name: "site".into(),
        lat: 40.0,
        lon: -105.0,
        radius: 500.0,
        collection_id: "test-collection".into(),
        query: None,
        target_asset_keys: keys.iter().map(|k| k.to_string()).collect(),
        start_query: "2023-06-01".into(),
        end_query: "2023-08-31".into(),
        out_dir: out_dir.to_path_buf(),
        max_items: None,
        prefix: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn writes_one_clipped_file_per_asset() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![scene("s1", &["red", "nir"], serde_json::json!({}))]);
    let warp = FileWarp::default();
    let params = params(dir.path(), &["red", "nir"]);

    let report = Pipeline::new(&catalog, &NoSigning, &warp).run(&params).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.scene.as_ref().unwrap().id, "s1");

    let red = dir.path().join("site_40.0_-105.0_500m_red.tif");
    let nir = dir.path().join("site_40.0_-105.0_500m_nir.tif");
    assert!(red.is_file());
    assert!(nir.is_file());
    assert_eq!(report.assets[0].output_path, red);
    assert_eq!(report.assets[1].output_path, nir);

    let aoi_bbox = build_aoi(40.0, -105.0, 500.0).unwrap().bbox();
    assert_eq!(report.aoi_bbox, aoi_bbox);
    let calls = warp.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, bbox, _)| *bbox == aoi_bbox));
    assert_eq!(calls[0].0, "https://example.com/s1/red.tif");
}

#[test]
fn catalog_query_carries_request_filters() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![]);
    let warp = FileWarp::default();
    let mut params = params(dir.path(), &["red"]);
    params.query = Some(serde_json::json!({"eo:cloud_cover": {"lt": 20}}));
    params.max_items = Some(10);

    Pipeline::new(&catalog, &NoSigning, &warp).run(&params).unwrap();

    let queries = catalog.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    let q = &queries[0];
    assert_eq!(q.collections.as_deref(), Some(&["test-collection".to_string()][..]));
    assert_eq!(q.datetime.as_deref(), Some("2023-06-01/2023-08-31"));
    assert_eq!(q.intersects.as_ref().unwrap()["type"], "Polygon");
    assert_eq!(q.query, params.query);
    assert_eq!(q.max_items, Some(10));
}

#[test]
fn missing_asset_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![scene("s1", &["red", "nir"], serde_json::json!({}))]);
    let warp = FileWarp::default();
    let params = params(dir.path(), &["red", "swir", "nir"]);

    let report = Pipeline::new(&catalog, &NoSigning, &warp).run(&params).unwrap();

    assert!(report.is_partial());
    let keys: Vec<&str> = report.assets.iter().map(|a| a.asset_key.as_str()).collect();
    assert_eq!(keys, ["red", "swir", "nir"]);
    assert!(matches!(
        report.assets[1].error,
        Some(AssetError::AssetNotFound { ref key, .. }) if key == "swir"
    ));
    assert!(report.assets[0].is_ok());
    assert!(report.assets[2].is_ok());
    assert_eq!(warp.calls.lock().unwrap().len(), 2);
    assert!(!params.output_path("swir").exists());
}

#[test]
fn empty_candidate_set_retrieves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![]);
    let warp = FileWarp::default();

    let report = Pipeline::new(&catalog, &NoSigning, &warp)
        .run(&params(dir.path(), &["red"]))
        .unwrap();

    assert!(report.scene.is_none());
    assert!(report.assets.is_empty());
    assert_eq!(report.candidates, 0);
    assert!(warp.calls.lock().unwrap().is_empty());
}

#[test]
fn flagged_scene_is_passed_over() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![
        scene("banded", &["red"], serde_json::json!({"banding_issues": true})),
        scene("clean", &["red"], serde_json::json!({"banding_issues": false})),
    ]);
    let warp = FileWarp::default();

    let report = Pipeline::new(&catalog, &NoSigning, &warp)
        .run(&params(dir.path(), &["red"]))
        .unwrap();

    assert_eq!(report.candidates, 2);
    assert_eq!(report.scene.unwrap().id, "clean");
    assert_eq!(warp.calls.lock().unwrap()[0].0, "https://example.com/clean/red.tif");
}

#[test]
fn all_flagged_scenes_select_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![scene(
        "banded",
        &["red"],
        serde_json::json!({"banding_issues": true}),
    )]);
    let warp = FileWarp::default();

    let report = Pipeline::new(&catalog, &NoSigning, &warp)
        .run(&params(dir.path(), &["red"]))
        .unwrap();

    assert!(report.scene.is_none());
    assert!(!report.is_complete());
    assert!(warp.calls.lock().unwrap().is_empty());
}

#[test]
fn catalog_failure_aborts_request() {
    let dir = tempfile::tempdir().unwrap();
    let warp = FileWarp::default();

    let err = Pipeline::new(&DownCatalog, &NoSigning, &warp)
        .run(&params(dir.path(), &["red"]))
        .unwrap_err();

    assert!(matches!(err, PipelineError::CatalogUnavailable(_)));
    assert!(warp.calls.lock().unwrap().is_empty());
}

#[test]
fn invalid_geometry_aborts_before_search() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![]);
    let warp = FileWarp::default();

    let mut bad_radius = params(dir.path(), &["red"]);
    bad_radius.radius = -5.0;
    let err = Pipeline::new(&catalog, &NoSigning, &warp)
        .run(&bad_radius)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Geometry(_)));

    let mut polar = params(dir.path(), &["red"]);
    polar.lat = 89.0;
    let err = Pipeline::new(&catalog, &NoSigning, &warp).run(&polar).unwrap_err();
    assert!(matches!(err, PipelineError::Geometry(_)));

    assert!(catalog.queries.lock().unwrap().is_empty());
}

#[test]
fn signer_is_applied_to_every_asset() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![scene("s1", &["red", "nir"], serde_json::json!({}))]);
    let warp = FileWarp::default();
    let signer =
        |href: &str| -> stacchip_cloud::Result<String> { Ok(format!("{href}?token=abc")) };

    Pipeline::new(&catalog, &signer, &warp)
        .run(&params(dir.path(), &["red", "nir"]))
        .unwrap();

    let calls = warp.calls.lock().unwrap();
    assert!(calls.iter().all(|(src, _, _)| src.ends_with("?token=abc")));
}

#[test]
fn parallel_retrieval_keeps_request_order() {
    let dir = tempfile::tempdir().unwrap();
    let keys = ["b1", "b2", "b3", "missing", "b4", "b5"];
    let catalog = FakeCatalog::new(vec![scene(
        "s1",
        &["b1", "b2", "b3", "b4", "b5"],
        serde_json::json!({}),
    )]);
    let warp = FileWarp::default();

    let report = Pipeline::new(&catalog, &NoSigning, &warp)
        .with_options(RunOptions { parallel_assets: 3 })
        .run(&params(dir.path(), &keys))
        .unwrap();

    let reported: Vec<&str> = report.assets.iter().map(|a| a.asset_key.as_str()).collect();
    assert_eq!(reported, keys);
    assert_eq!(report.written().count(), 5);
    assert_eq!(report.failures().next().unwrap().asset_key, "missing");
    assert_eq!(warp.calls.lock().unwrap().len(), 5);
}

#[test]
fn custom_selector_ranks_by_coverage() {
    let dir = tempfile::tempdir().unwrap();
    let mut edge = scene("edge", &["red"], serde_json::json!({}));
    // Footprint ends at the AOI centre meridian.
    edge.geometry = Some(serde_json::json!({
        "type": "Polygon",
        "coordinates": [[[-106.0, 39.0], [-105.0, 39.0], [-105.0, 41.0], [-106.0, 41.0], [-106.0, 39.0]]]
    }));
    let catalog = FakeCatalog::new(vec![edge, scene("full", &["red"], serde_json::json!({}))]);
    let warp = FileWarp::default();

    let report = Pipeline::new(&catalog, &NoSigning, &warp)
        .with_selector(Selector::default().with_policy(RankingPolicy::MaxCoverage))
        .run(&params(dir.path(), &["red"]))
        .unwrap();

    let scene = report.scene.unwrap();
    assert_eq!(scene.id, "full");
    assert!((scene.coverage - 1.0).abs() < 1e-9);
}

#[test]
fn empty_asset_list_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::new(vec![]);
    let warp = FileWarp::default();

    let err = Pipeline::new(&catalog, &NoSigning, &warp)
        .run(&params(dir.path(), &[]))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
