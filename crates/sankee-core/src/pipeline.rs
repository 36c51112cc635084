//! End-to-end entry points: validate, sample, check, merge and plot.

use tracing::{info, warn};

use crate::catalog::ClassCatalog;
use crate::config::SankifyConfig;
use crate::coords::Region;
use crate::datasets::{Dataset, DatasetImages};
use crate::error::{ConfigurationError, SamplingError, SankeeError, SankeeResult};
use crate::plot::SankeyPlot;
use crate::sampling::{period_labels, PixelService, SampleRequest, Sampler};
use crate::table::{ClassCode, MissingPolicy};
use crate::theme::Theme;

/// Sample `band` from each image and build an interactive Sankey plot.
///
/// Period labels default to `"0", "1", ...`. Without a region, the first
/// image's footprint is sampled. All configuration is validated before the
/// pixel service is called.
pub fn sankify<S: PixelService>(
    service: &S,
    images: &[S::Image],
    labels: Option<&[String]>,
    band: &str,
    catalog: &ClassCatalog,
    region: Option<&Region>,
    config: &SankifyConfig,
) -> SankeeResult<SankeyPlot> {
    run(service, images, labels, band, catalog, region, config, None)
}

/// Build a Sankey plot from a premade dataset for the given years.
///
/// Years are sorted before use and become the period labels. Nodata samples
/// are treated as missing.
pub fn sankify_dataset<S, R>(
    dataset: &Dataset,
    years: &[i32],
    resolver: &R,
    service: &S,
    region: Option<&Region>,
    config: &SankifyConfig,
) -> SankeeResult<SankeyPlot>
where
    S: PixelService,
    R: DatasetImages<S::Image> + ?Sized,
{
    let years = dataset.validate_years(years)?;
    let missing = dataset.missing_years(&years);

    let mut images = Vec::with_capacity(years.len());
    let mut unresolved = Vec::new();
    for &year in &years {
        match resolver.resolve(dataset, year) {
            Some(img) => images.push(img),
            None => unresolved.push(year),
        }
    }
    if !unresolved.is_empty() {
        return Err(dataset.unknown_years_error(unresolved).into());
    }

    let labels: Vec<String> = years.iter().map(i32::to_string).collect();
    let catalog = dataset.catalog()?;
    info!(dataset = dataset.key, years = ?years, "sampling premade dataset");

    let result = run(
        service,
        &images,
        Some(&labels[..]),
        dataset.band,
        &catalog,
        region,
        config,
        dataset.nodata,
    );
    match result {
        // A year outside the dataset is the likelier cause of a sampling failure.
        Err(SankeeError::Sampling(err)) if !missing.is_empty() => {
            warn!(%err, missing = ?missing, "sampling failed for years outside the dataset");
            Err(dataset.unknown_years_error(missing).into())
        }
        other => other,
    }
}

#[allow(clippy::too_many_arguments)]
fn run<S: PixelService>(
    service: &S,
    images: &[S::Image],
    labels: Option<&[String]>,
    band: &str,
    catalog: &ClassCatalog,
    region: Option<&Region>,
    config: &SankifyConfig,
    nodata: Option<ClassCode>,
) -> SankeeResult<SankeyPlot> {
    config.validate()?;
    let periods = period_labels(labels, images.len())?;
    Theme::load(&config.theme)?;

    let region = match region {
        Some(r) => r.clone(),
        None => images
            .first()
            .and_then(|img| service.footprint(img))
            .ok_or(ConfigurationError::MissingRegion)?,
    };

    let request = SampleRequest {
        band: band.to_string(),
        region,
        count: config.samples,
        scale: config.scale,
        seed: config.seed,
        // Nodata is masked first so the missing policy sees it.
        missing: if nodata.is_some() { MissingPolicy::Retain } else { config.missing },
        timeout: config.timeout(),
    };
    let mut table = Sampler::new(service).sample(images, &periods, &request)?;

    if let Some(code) = nodata {
        let masked = table.mask_class(code);
        let empty: Vec<String> = masked
            .valid_counts()
            .iter()
            .zip(masked.periods())
            .filter(|(n, _)| **n == 0)
            .map(|(_, p)| p.clone())
            .collect();
        if !empty.is_empty() {
            return Err(SamplingError::NoSamples { periods: empty }.into());
        }
        table = masked.with_policy(config.missing);
    }

    SankeyPlot::new(table, catalog, config)
}
