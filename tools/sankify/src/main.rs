//! Sankey tool: samples local class rasters described by a JSON request and
//! writes a Plotly sankey figure (and optionally the filtered sample table).
//!
//! Images carry one or more bands, each either an inline raster grid or a
//! single-band integer GeoTIFF with explicit bounds.
mod geotiff;
mod request;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sankee_core::sampling::LocalPixelService;
use sankee_core::{sankify, sankify_dataset, ClassCode, Dataset, LabelType, SankeyPlot};

use request::Request;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sankify",
    about = "Sample classified rasters and reshape land-cover transitions into a Sankey figure"
)]
struct Args {
    /// Request file (JSON): images, region, labels/palette or dataset, config
    #[arg(long)]
    request: PathBuf,

    /// Figure output path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the filtered sample table as JSON
    #[arg(long)]
    table: Option<PathBuf>,

    /// Number of random sample points
    #[arg(long)]
    samples: Option<usize>,

    /// Seed for point generation
    #[arg(long)]
    seed: Option<u64>,

    /// Sampling scale in degrees
    #[arg(long)]
    scale: Option<f64>,

    /// Keep only classes at least as large as the k-th largest
    #[arg(long)]
    max_classes: Option<usize>,

    #[arg(long)]
    title: Option<String>,

    /// Built-in theme: default, d3, simple
    #[arg(long)]
    theme: Option<String>,

    /// Node labels: class, percent, count, none
    #[arg(long)]
    label_type: Option<LabelType>,

    /// Hide a class code (repeatable)
    #[arg(long = "hide", value_name = "CODE")]
    hide: Vec<ClassCode>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). SANKEE_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// CLI flags override the request's config.
    fn apply_overrides(&self, req: &mut Request) {
        let cfg = &mut req.config;
        if let Some(n) = self.samples {
            cfg.samples = n;
        }
        if let Some(s) = self.seed {
            cfg.seed = s;
        }
        if let Some(s) = self.scale {
            cfg.scale = Some(s);
        }
        if let Some(k) = self.max_classes {
            cfg.max_classes = Some(k);
        }
        if let Some(t) = &self.title {
            cfg.title = Some(t.clone());
        }
        if let Some(t) = &self.theme {
            cfg.theme = t.clone();
        }
        if let Some(l) = self.label_type {
            cfg.label_type = l;
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("SANKEE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// Build the plot for a parsed request. TIFF paths resolve against `base_dir`.
fn build_plot(req: &Request, base_dir: &Path) -> Result<SankeyPlot> {
    let images = req.images(base_dir)?;
    info!(images = images.len(), "loaded images");

    let plot = match &req.dataset {
        Some(name) => {
            let dataset = Dataset::find(name)?;
            let years = req
                .years
                .as_deref()
                .context("`years` is required when `dataset` is given")?;
            sankify_dataset(dataset, years, &images[..], &LocalPixelService, req.region.as_ref(), &req.config)?
        }
        None => {
            let band = req.band.as_deref().context("`band` is required without `dataset`")?;
            let catalog = req.catalog()?;
            let labels = req.period_labels()?;
            sankify(
                &LocalPixelService,
                &images,
                labels.as_deref(),
                band,
                &catalog,
                req.region.as_ref(),
                &req.config,
            )?
        }
    };
    Ok(plot)
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    fs::write(path, text).with_context(|| format!("Write failed: {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut req = Request::load(&args.request)?;
    args.apply_overrides(&mut req);
    let base_dir = args.request.parent().unwrap_or_else(|| Path::new("."));

    let mut plot = build_plot(&req, base_dir)?;
    for code in &args.hide {
        plot.hide(*code).with_context(|| format!("Cannot hide class {code}"))?;
    }

    let figure = plot.to_figure();
    match &args.output {
        Some(path) => {
            write_json(path, &figure)?;
            info!(path = %path.display(), "wrote figure");
        }
        None => {
            let text = serde_json::to_string_pretty(&figure).context("JSON serialization failed")?;
            println!("{text}");
        }
    }
    if let Some(path) = &args.table {
        write_json(path, plot.filtered_table())?;
        info!(path = %path.display(), rows = plot.filtered_table().n_rows(), "wrote table");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sankee_core::datasets::NLCD;
    use sankee_core::SampleTable;

    fn inline_request() -> Request {
        serde_json::from_str(
            r##"{
            "band": "lc",
            "images": [
                {"id": "a", "bands": {"lc": {"raster": {
                    "data": [1, 2], "width": 2, "height": 1,
                    "min_lon": 0.0, "max_lon": 2.0, "min_lat": 0.0, "max_lat": 1.0}}}},
                {"id": "b", "bands": {"lc": {"raster": {
                    "data": [1, 1], "width": 2, "height": 1,
                    "min_lon": 0.0, "max_lon": 2.0, "min_lat": 0.0, "max_lat": 1.0}}}}
            ],
            "labels": {"1": "Forest", "2": "Water"},
            "palette": {"1": "#1b9d0c", "2": "#4780f3"},
            "config": {"samples": 40}
        }"##,
        )
        .unwrap()
    }

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from(["sankify", "--request", "r.json", "--samples", "7", "--label-type", "percent", "-vv"]);
        let mut req = inline_request();
        args.apply_overrides(&mut req);
        assert_eq!(req.config.samples, 7);
        assert_eq!(req.config.label_type, LabelType::Percent);
        assert_eq!(req.config.theme, "default");
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn inline_request_builds_plot() {
        let plot = build_plot(&inline_request(), Path::new(".")).unwrap();
        assert_eq!(plot.base_table().n_rows(), 40);
        let hover = plot.parameters().link_hover;
        assert!(hover.contains(&"100% of Water became Forest".to_string()));
    }

    #[test]
    fn tiff_dataset_request_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        for (year, pixels) in [(2001, [42u8, 82]), (2016, [42u8, 21])] {
            let file = fs::File::create(dir.path().join(format!("{year}.tif"))).unwrap();
            let mut enc = tiff::encoder::TiffEncoder::new(file).unwrap();
            enc.write_image::<tiff::encoder::colortype::Gray8>(2, 1, &pixels).unwrap();
        }
        let request = format!(
            r#"{{
                "dataset": "NLCD",
                "years": [2016, 2001],
                "images": [
                    {{"id": "{a}", "bands": {{"landcover": {{"tiff": "2001.tif",
                        "bbox": {{"min_lat": 0.0, "max_lat": 1.0, "min_lon": 0.0, "max_lon": 2.0}}}}}}}},
                    {{"id": "{b}", "bands": {{"landcover": {{"tiff": "2016.tif",
                        "bbox": {{"min_lat": 0.0, "max_lat": 1.0, "min_lon": 0.0, "max_lon": 2.0}}}}}}}}
                ],
                "config": {{"samples": 30}}
            }}"#,
            a = NLCD.image_id(2001),
            b = NLCD.image_id(2016),
        );
        let path = dir.path().join("request.json");
        fs::write(&path, request).unwrap();

        let req = Request::load(&path).unwrap();
        let plot = build_plot(&req, dir.path()).unwrap();
        assert_eq!(plot.base_table().periods(), ["2001", "2016"]);

        let table_path = dir.path().join("table.json");
        write_json(&table_path, plot.filtered_table()).unwrap();
        let text = fs::read_to_string(&table_path).unwrap();
        let table: SampleTable = serde_json::from_str(&text).unwrap();
        assert_eq!(table.n_rows(), 30);
    }

    #[test]
    fn dataset_without_years_is_an_error() {
        let mut req = inline_request();
        req.dataset = Some("NLCD".into());
        let err = build_plot(&req, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("years"));
    }
}
