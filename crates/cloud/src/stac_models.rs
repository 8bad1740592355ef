//! STAC (SpatioTemporal Asset Catalog) data types.
//!
//! Lightweight serde models for STAC Item Search (POST /search) requests and
//! responses: spatial/temporal/attribute filters, pagination via `links`,
//! item footprints, quality properties and asset access.

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use stacchip_core::geometry::geojson::geometry_from_geojson;

// ---------------------------------------------------------------------------
// Search request
// ---------------------------------------------------------------------------

/// Body for `POST /search` (STAC API – Item Search).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StacSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,

    /// GeoJSON geometry the items must intersect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intersects: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Query extension filter, forwarded untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Pagination token (next page).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Any other body field, such as the `next` token stac-server puts in
    /// its next-page links. Kept so pagination bodies round-trip intact.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StacSearchParams {
    /// Create empty search params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set collection filter.
    pub fn collections<S: AsRef<str>>(mut self, cols: &[S]) -> Self {
        self.collections = Some(cols.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// Set the GeoJSON geometry filter.
    pub fn intersects(mut self, geometry: serde_json::Value) -> Self {
        self.intersects = Some(geometry);
        self
    }

    /// Set datetime or datetime range (e.g. `"2024-06-01/2024-06-30"`).
    pub fn datetime(mut self, dt: &str) -> Self {
        self.datetime = Some(dt.to_string());
        self
    }

    /// Set the query-extension filter, e.g. `{"eo:cloud_cover": {"lt": 10}}`.
    pub fn query(mut self, query: serde_json::Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Set maximum items per page.
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<StacItem>,

    #[serde(default)]
    pub links: Vec<StacLink>,

    #[serde(rename = "numberMatched", skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,

    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,

    /// Earth Search / some catalogs use `context` instead of numberMatched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl StacItemCollection {
    /// Find the `"next"` pagination link, if any.
    pub fn next_link(&self) -> Option<&StacLink> {
        self.links.iter().find(|l| l.rel == "next")
    }

    pub fn has_next(&self) -> bool {
        self.next_link().is_some()
    }

    /// Number of items in this page.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single STAC Item (GeoJSON Feature), i.e. one candidate scene.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type", default = "feature_type")]
    pub type_: String,

    /// Unique item identifier.
    pub id: String,

    /// Footprint as raw GeoJSON; parse with [`StacItem::footprint`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,

    /// Bounding box `[west, south, east, north]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: StacItemProperties,

    #[serde(default)]
    pub assets: HashMap<String, StacAsset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub links: Vec<StacLink>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl StacItem {
    /// Get an asset by key.
    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.get(key)
    }

    /// Parsed footprint geometry.
    ///
    /// `None` when the item has no geometry (allowed by STAC for
    /// non-spatial items); `Some(Err(_))` when it is not a supported GeoJSON
    /// geometry.
    pub fn footprint(&self) -> Option<stacchip_core::Result<Geometry<f64>>> {
        self.geometry.as_ref().map(geometry_from_geojson)
    }

    /// Raw property value by key, looking at modelled fields first.
    pub fn property(&self, key: &str) -> Option<serde_json::Value> {
        let p = &self.properties;
        match key {
            "datetime" => p.datetime.clone().map(serde_json::Value::from),
            "eo:cloud_cover" => p.eo_cloud_cover.map(serde_json::Value::from),
            "platform" => p.platform.clone().map(serde_json::Value::from),
            "constellation" => p.constellation.clone().map(serde_json::Value::from),
            "gsd" => p.gsd.map(serde_json::Value::from),
            _ => p.extra.get(key).cloned(),
        }
    }

    /// Whether a boolean flag property is explicitly set to `true`.
    ///
    /// Absent flags and non-boolean values read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.property(key), Some(serde_json::Value::Bool(true)))
    }

    /// Cloud cover percentage (EO extension), if reported.
    pub fn cloud_cover(&self) -> Option<f64> {
        self.properties.eo_cloud_cover
    }

    /// Get the EPSG code from the `proj:epsg` property, if available.
    pub fn epsg(&self) -> Option<u32> {
        self.properties
            .extra
            .get("proj:epsg")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
    }
}

/// STAC Item properties.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// ISO 8601 datetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Cloud cover percentage (EO extension).
    #[serde(
        rename = "eo:cloud_cover",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub eo_cloud_cover: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constellation: Option<String>,

    /// GSD (ground sample distance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsd: Option<f64>,

    /// All other properties, including quality flags such as
    /// `banding_issues`.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A single STAC Asset (file reference).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    /// URL to the asset file; may need signing before use.
    pub href: String,

    /// Media type (e.g., `"image/tiff; application=geotiff; profile=cloud-optimized"`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Roles: `["data"]`, `["thumbnail"]`, `["overview"]`, etc.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl StacAsset {
    /// Asset with only an href, handy for tests and synthetic items.
    pub fn from_href(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            type_: None,
            title: None,
            roles: None,
            extra: HashMap::new(),
        }
    }
}

/// A STAC Link (used for pagination and related resources).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacLink {
    /// Relationship: `"self"`, `"root"`, `"next"`, `"prev"`, etc.
    pub rel: String,

    pub href: String,

    /// HTTP method for the link (default GET, but `"next"` often uses POST).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Request body for POST-based pagination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// Merge mode: if true, merge body with previous request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<bool>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "LC09_L2SP_034032_20230702_02_T1",
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-106.2, 39.1], [-103.9, 39.1], [-103.9, 41.0], [-106.2, 41.0], [-106.2, 39.1]]]
      },
      "bbox": [-106.2, 39.1, -103.9, 41.0],
      "properties": {
        "datetime": "2023-07-02T17:41:20Z",
        "eo:cloud_cover": 5.2,
        "platform": "landsat-9",
        "gsd": 30.0,
        "proj:epsg": 32613,
        "banding_issues": true
      },
      "assets": {
        "red": {
          "href": "https://example.com/B4.tif",
          "type": "image/tiff; application=geotiff; profile=cloud-optimized",
          "title": "Red Band",
          "roles": ["data"]
        },
        "nir08": {
          "href": "https://example.com/B5.tif",
          "type": "image/tiff; application=geotiff; profile=cloud-optimized",
          "roles": ["data"]
        }
      },
      "collection": "landsat-c2-l2",
      "links": []
    }
  ],
  "links": [
    {
      "rel": "next",
      "href": "https://planetarycomputer.microsoft.com/api/stac/v1/search",
      "method": "POST",
      "body": {"token": "next:abc123"},
      "merge": true
    },
    {
      "rel": "self",
      "href": "https://planetarycomputer.microsoft.com/api/stac/v1/search"
    }
  ],
  "numberMatched": 42,
  "numberReturned": 1
}"#;

    fn item() -> StacItem {
        let col: StacItemCollection = serde_json::from_str(FIXTURE).unwrap();
        col.features.into_iter().next().unwrap()
    }

    #[test]
    fn parse_item_collection() {
        let col: StacItemCollection = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(col.type_, "FeatureCollection");
        assert_eq!(col.len(), 1);
        assert_eq!(col.number_matched, Some(42));
        assert_eq!(col.number_returned, Some(1));
    }

    #[test]
    fn parse_item() {
        let item = item();
        assert_eq!(item.id, "LC09_L2SP_034032_20230702_02_T1");
        assert_eq!(item.collection.as_deref(), Some("landsat-c2-l2"));
        assert_eq!(item.epsg(), Some(32613));
        assert_eq!(item.cloud_cover(), Some(5.2));
    }

    #[test]
    fn footprint_parses_polygon() {
        let geom = item().footprint().unwrap().unwrap();
        assert!(matches!(geom, Geometry::Polygon(_)));
    }

    #[test]
    fn footprint_absent() {
        let mut item = item();
        item.geometry = None;
        assert!(item.footprint().is_none());
    }

    #[test]
    fn flags_read_only_explicit_true() {
        let mut item = item();
        assert!(item.flag("banding_issues"));
        assert!(!item.flag("missing_flag"));

        item.properties
            .extra
            .insert("banding_issues".into(), serde_json::json!("true"));
        assert!(!item.flag("banding_issues"));

        item.properties
            .extra
            .insert("banding_issues".into(), serde_json::json!(false));
        assert!(!item.flag("banding_issues"));
    }

    #[test]
    fn property_lookup_covers_modelled_fields() {
        let item = item();
        assert_eq!(item.property("platform"), Some(serde_json::json!("landsat-9")));
        assert_eq!(item.property("eo:cloud_cover"), Some(serde_json::json!(5.2)));
        assert_eq!(item.property("proj:epsg"), Some(serde_json::json!(32613)));
        assert_eq!(item.property("nope"), None);
    }

    #[test]
    fn asset_lookup() {
        let item = item();
        let red = item.asset("red").unwrap();
        assert_eq!(red.href, "https://example.com/B4.tif");
        assert_eq!(red.roles.as_ref().unwrap(), &["data"]);
        assert!(item.asset("swir16").is_none());
    }

    #[test]
    fn minimal_item_parses() {
        let item: StacItem = serde_json::from_str(
            r#"{"id": "x", "properties": {}, "assets": {"red": {"href": "a.tif"}}}"#,
        )
        .unwrap();
        assert_eq!(item.type_, "Feature");
        assert!(item.footprint().is_none());
        assert_eq!(item.asset("red").unwrap().href, "a.tif");
    }

    #[test]
    fn pagination_links() {
        let col: StacItemCollection = serde_json::from_str(FIXTURE).unwrap();
        assert!(col.has_next());
        let next = col.next_link().unwrap();
        assert_eq!(next.method.as_deref(), Some("POST"));
        assert_eq!(next.merge, Some(true));
    }

    #[test]
    fn builder_serializes_correctly() {
        let params = StacSearchParams::new()
            .collections(&["landsat-c2-l2"])
            .intersects(serde_json::json!({"type": "Point", "coordinates": [-105.0, 40.0]}))
            .datetime("2023-06-01/2023-08-31")
            .query(serde_json::json!({"eo:cloud_cover": {"lt": 10}}))
            .limit(5);

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["collections"], serde_json::json!(["landsat-c2-l2"]));
        assert_eq!(json["intersects"]["type"], "Point");
        assert_eq!(json["datetime"], "2023-06-01/2023-08-31");
        assert_eq!(json["query"]["eo:cloud_cover"]["lt"], 10);
        assert_eq!(json["limit"], 5);
        assert!(json.get("token").is_none());
        assert!(json.get("bbox").is_none());
    }

    #[test]
    fn unknown_body_fields_survive_round_trip() {
        let body = serde_json::json!({"collections": ["c"], "limit": 4, "next": "tok2"});
        let params: StacSearchParams = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(params.limit, Some(4));
        assert_eq!(params.extra.get("next"), Some(&serde_json::json!("tok2")));
        assert_eq!(serde_json::to_value(&params).unwrap(), body);
    }

    #[test]
    fn empty_params_has_no_fields() {
        let json = serde_json::to_value(StacSearchParams::new()).unwrap();
        assert!(json.as_object().unwrap().is_empty());
    }
}
