//! stacchip CLI - acquire clipped imagery chips from STAC catalogs

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use stacchip_cloud::blocking::StacClientBlocking;
use stacchip_cloud::{Catalog, CatalogQuery, StacCatalog, StacClientOptions};
use stacchip_core::build_aoi;
use stacchip_pipeline::config::{out_dir_from_outputs, CatalogSettings, SelectionSettings};
use stacchip_pipeline::{JobConfig, Pipeline, RankingPolicy, RequestParams, RunReport};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stacchip")]
#[command(author, version, about = "Imagery chip acquisition from STAC catalogs", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the area of interest around a point
    Aoi {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Radius in metres
        #[arg(short, long)]
        radius: f64,
        /// Print the polygon as GeoJSON
        #[arg(long)]
        geojson: bool,
    },
    /// List and rank candidate scenes without downloading
    Search {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(short, long)]
        radius: f64,
        /// Collection identifier, e.g. landsat-c2-l2
        #[arg(short, long)]
        collection: String,
        /// Start of the time window (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End of the time window (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Attribute filter as JSON, e.g. '{"eo:cloud_cover": {"lt": 20}}'
        #[arg(short, long)]
        query: Option<String>,
        /// Catalog: pc, es, or a STAC API URL
        #[arg(long, default_value = "pc")]
        catalog: String,
        /// Maximum number of candidates to fetch
        #[arg(long)]
        max_items: Option<usize>,
        /// Ranking policy: first-eligible, max-coverage, combined[:weight]
        #[arg(short, long, default_value = "first-eligible")]
        policy: RankingPolicy,
    },
    /// Select a scene and write one clipped raster per asset
    Fetch(FetchArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Job file (TOML); flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
    #[arg(short, long)]
    radius: Option<f64>,
    #[arg(short, long)]
    collection: Option<String>,
    /// Asset keys to retrieve, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    assets: Vec<String>,
    #[arg(long)]
    start: Option<String>,
    #[arg(long)]
    end: Option<String>,
    /// Attribute filter as JSON
    #[arg(short, long)]
    query: Option<String>,
    /// Output directory
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
    /// Expected output files; the directory of the first one is used
    #[arg(long, value_delimiter = ',', conflicts_with = "out_dir")]
    outputs: Vec<PathBuf>,
    #[arg(long)]
    max_items: Option<usize>,
    /// Catalog: pc, es, or a STAC API URL
    #[arg(long)]
    catalog: Option<String>,
    /// Ranking policy: first-eligible, max-coverage, combined[:weight]
    #[arg(short, long)]
    policy: Option<RankingPolicy>,
    /// Assets retrieved concurrently
    #[arg(long)]
    parallel: Option<usize>,
    /// Path to the gdalwarp executable
    #[arg(long)]
    gdalwarp: Option<PathBuf>,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_query(query: Option<&str>) -> Result<Option<serde_json::Value>> {
    query
        .map(|q| serde_json::from_str(q).context("query is not valid JSON"))
        .transpose()
}

fn open_client(settings: &CatalogSettings, max_items: Option<usize>) -> Result<StacClientBlocking> {
    StacClientBlocking::new(settings.catalog(), settings.client_options(max_items))
        .context("failed to create STAC client")
}

/// Start from the job file (if any) and apply command-line overrides.
fn job_from_args(args: &FetchArgs) -> Result<JobConfig> {
    let mut job = match &args.config {
        Some(path) => JobConfig::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let missing = |flag: &str| anyhow::anyhow!("--{flag} is required without --config");
            let out_dir = match (&args.out_dir, out_dir_from_outputs(&args.outputs)) {
                (Some(dir), _) => dir.clone(),
                (None, Some(dir)) => dir,
                (None, None) => return Err(missing("out-dir")),
            };
            let request = RequestParams {
                name: args.name.clone().ok_or_else(|| missing("name"))?,
                lat: args.lat.ok_or_else(|| missing("lat"))?,
                lon: args.lon.ok_or_else(|| missing("lon"))?,
                radius: args.radius.ok_or_else(|| missing("radius"))?,
                collection_id: args.collection.clone().ok_or_else(|| missing("collection"))?,
                query: None,
                target_asset_keys: args.assets.clone(),
                start_query: args.start.clone().ok_or_else(|| missing("start"))?,
                end_query: args.end.clone().ok_or_else(|| missing("end"))?,
                out_dir,
                max_items: None,
                prefix: None,
            };
            JobConfig {
                request,
                catalog: CatalogSettings::default(),
                selection: SelectionSettings::default(),
                warp: Default::default(),
                run: Default::default(),
            }
        }
    };

    let req = &mut job.request;
    if let Some(v) = &args.name {
        req.name = v.clone();
    }
    if let Some(v) = args.lat {
        req.lat = v;
    }
    if let Some(v) = args.lon {
        req.lon = v;
    }
    if let Some(v) = args.radius {
        req.radius = v;
    }
    if let Some(v) = &args.collection {
        req.collection_id = v.clone();
    }
    if !args.assets.is_empty() {
        req.target_asset_keys = args.assets.clone();
    }
    if let Some(v) = &args.start {
        req.start_query = v.clone();
    }
    if let Some(v) = &args.end {
        req.end_query = v.clone();
    }
    if let Some(q) = parse_query(args.query.as_deref())? {
        req.query = Some(q);
    }
    if let Some(v) = &args.out_dir {
        req.out_dir = v.clone();
    } else if let Some(dir) = out_dir_from_outputs(&args.outputs) {
        req.out_dir = dir;
    }
    if args.max_items.is_some() {
        req.max_items = args.max_items;
    }
    if let Some(v) = &args.catalog {
        job.catalog.endpoint = v.clone();
    }
    if let Some(v) = args.policy {
        job.selection.policy = v;
    }
    if let Some(v) = args.parallel {
        job.run.parallel_assets = v.max(1);
    }
    if let Some(v) = &args.gdalwarp {
        job.warp.program = v.clone();
    }

    job.request.validate()?;
    Ok(job)
}

fn print_report(report: &RunReport, elapsed: std::time::Duration) {
    match &report.scene {
        Some(scene) => println!(
            "Scene: {} (coverage {:.1}%)",
            scene.id,
            scene.coverage * 100.0
        ),
        None => println!("No eligible scene among {} candidates", report.candidates),
    }
    for asset in &report.assets {
        match &asset.error {
            None => println!("  {} saved to: {}", asset.asset_key, asset.output_path.display()),
            Some(e) => println!("  {} FAILED: {}", asset.asset_key, e),
        }
    }
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Aoi {
            lat,
            lon,
            radius,
            geojson,
        } => {
            let aoi = build_aoi(lat, lon, radius)?;
            if geojson {
                println!("{}", serde_json::to_string_pretty(&aoi.to_geojson())?);
            } else {
                let [min_x, min_y, max_x, max_y] = aoi.bbox().to_array();
                println!("Centre: ({lat}, {lon}), radius {radius} m");
                println!("Local CRS: {}", aoi.local_crs());
                println!(
                    "BBox: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    min_x, min_y, max_x, max_y
                );
            }
        }

        Commands::Search {
            lat,
            lon,
            radius,
            collection,
            start,
            end,
            query,
            catalog,
            max_items,
            policy,
        } => {
            let aoi = build_aoi(lat, lon, radius)?;
            let client = StacClientBlocking::new(
                StacCatalog::from_str_or_url(&catalog),
                StacClientOptions::default(),
            )
            .context("failed to create STAC client")?;

            let request = CatalogQuery::new()
                .collections(&[collection.as_str()])
                .intersects(aoi.to_geojson())
                .datetime(stacchip_cloud::datetime_range(&start, &end))
                .query(parse_query(query.as_deref())?)
                .max_items(max_items);

            let pb = spinner("Searching catalog...");
            let items = client.search(&request);
            pb.finish_and_clear();
            let items = items.context("catalog search failed")?;

            let selector = SelectionSettings {
                policy,
                ..SelectionSettings::default()
            }
            .selector();
            let ranked = selector.rank(&items, &aoi);

            println!(
                "{} candidates, {} eligible (policy: {})",
                items.len(),
                ranked.len(),
                policy
            );
            for c in &ranked {
                println!(
                    "  #{:<3} {}  {}  epsg {:>5}  cloud {:>5}  coverage {:>5.1}%  score {:.3}",
                    c.index,
                    c.item.id,
                    c.item.properties.datetime.as_deref().unwrap_or("-"),
                    c.item
                        .epsg()
                        .map_or_else(|| "-".to_string(), |code| code.to_string()),
                    c.item
                        .cloud_cover()
                        .map_or_else(|| "-".to_string(), |cc| format!("{cc:.1}")),
                    c.coverage * 100.0,
                    c.score
                );
            }
        }

        Commands::Fetch(args) => {
            let job = job_from_args(&args)?;
            let client = open_client(&job.catalog, job.request.max_items)?;
            let warp = job.warp.gdalwarp();

            info!(
                name = %job.request.name,
                catalog = %client.catalog().search_url(),
                assets = ?job.request.target_asset_keys,
                "starting acquisition"
            );

            let start = Instant::now();
            let pipeline = Pipeline::new(&client, &client, &warp)
                .with_selector(job.selection.selector())
                .with_options(job.run);
            let pb = spinner("Acquiring imagery...");
            let report = pipeline.run(&job.request);
            pb.finish_and_clear();
            let report = report.context("acquisition failed")?;
            let elapsed = start.elapsed();

            print_report(&report, elapsed);

            if let Some(path) = &args.report {
                std::fs::write(path, report.to_json_pretty()?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }

            if report.scene.is_none() {
                bail!("no eligible scene found");
            }
            let failed = report.failures().count();
            if failed > 0 {
                bail!("{failed} of {} assets failed", report.assets.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_args(args: &[&str]) -> FetchArgs {
        let cli = Cli::try_parse_from(["stacchip", "fetch"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Fetch(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn fetch_from_flags() {
        let args = fetch_args(&[
            "--name", "site", "--lat", "40.0", "--lon", "-105.0", "--radius", "500",
            "--collection", "landsat-c2-l2", "--assets", "red,nir08", "--start", "2023-06-01",
            "--end", "2023-08-31", "--outputs", "out/site/a.tif,out/site/b.tif",
            "--policy", "max-coverage", "--parallel", "2",
        ]);
        let job = job_from_args(&args).unwrap();
        assert_eq!(job.request.lon, -105.0);
        assert_eq!(job.request.target_asset_keys, ["red", "nir08"]);
        assert_eq!(job.request.out_dir, PathBuf::from("out/site"));
        assert_eq!(job.selection.policy, RankingPolicy::MaxCoverage);
        assert_eq!(job.run.parallel_assets, 2);
        assert_eq!(job.request.prefix(), "site_40.0_-105.0_500m_");
    }

    #[test]
    fn fetch_without_config_needs_request_flags() {
        let args = fetch_args(&["--name", "site", "--assets", "red"]);
        let err = job_from_args(&args).unwrap_err();
        assert!(err.to_string().contains("required without --config"));
    }

    #[test]
    fn flags_override_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(
            &path,
            r#"
[request]
name = "site"
lat = 40.0
lon = -105.0
radius = 500
collection_id = "landsat-c2-l2"
target_asset_keys = ["red"]
start_query = "2023-06-01"
end_query = "2023-08-31"
out_dir = "out"
"#,
        )
        .unwrap();

        let path_arg = path.to_string_lossy().into_owned();
        let args = fetch_args(&[
            "--config", &path_arg, "--radius", "250", "--catalog", "es",
            "--query", r#"{"eo:cloud_cover": {"lt": 10}}"#,
        ]);
        let job = job_from_args(&args).unwrap();
        assert_eq!(job.request.radius, 250.0);
        assert_eq!(job.request.target_asset_keys, ["red"]);
        assert_eq!(job.catalog.catalog(), StacCatalog::EarthSearch);
        assert_eq!(job.request.query.unwrap()["eo:cloud_cover"]["lt"], 10);
    }

    #[test]
    fn invalid_query_json_is_rejected() {
        assert!(parse_query(Some("{not json")).is_err());
        assert!(parse_query(None).unwrap().is_none());
    }
}
