//! Per-point, per-image class extraction.
//!
//! The pixel lookup itself is delegated to a [`PixelService`]; this module
//! generates the sample points, validates inputs before any request is made,
//! and classifies service failures into [`SamplingError`]s.

pub mod local;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::coords::{random_points, LatLon, Region};
use crate::error::{ConfigurationError, SamplingError, SankeeResult};
use crate::table::{validate_periods, ClassCode, MissingPolicy, SampleTable};

pub use local::{LocalImage, LocalPixelService};

/// Failure reported by the pixel service itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("band `{band}` not found in image `{image}`")]
    MissingBand { band: String, image: String },

    #[error("region must not be empty")]
    EmptyRegion,
}

/// One batched extraction request: every point against every image.
#[derive(Debug)]
pub struct ExtractRequest<'a, I> {
    pub images: &'a [I],
    pub points: &'a [LatLon],
    pub band: &'a str,
    pub scale: Option<f64>,
    pub timeout: Duration,
}

/// A remote (or local) service able to read class values from images.
pub trait PixelService {
    /// Opaque image handle.
    type Image;

    /// Extract `band` from every image at every point in a single round-trip.
    ///
    /// The result has one row per point and one value per image, in request
    /// order; `None` means the image had no valid class at that point.
    fn extract(&self, request: &ExtractRequest<'_, Self::Image>) -> Result<Vec<Vec<Option<ClassCode>>>, ServiceError>;

    /// Band names of an image, used for diagnostics.
    fn band_names(&self, image: &Self::Image) -> Result<Vec<String>, ServiceError>;

    /// The image's footprint, used when the caller supplies no region.
    fn footprint(&self, _image: &Self::Image) -> Option<Region> {
        None
    }
}

/// Sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRequest {
    pub band: String,
    pub region: Region,
    pub count: usize,
    pub scale: Option<f64>,
    pub seed: u64,
    pub missing: MissingPolicy,
    pub timeout: Duration,
}

/// Generate default period labels `"0", "1", ...`, or stringify and validate
/// the supplied ones against the image count.
pub fn period_labels<S: ToString>(labels: Option<&[S]>, n_images: usize) -> Result<Vec<String>, ConfigurationError> {
    let labels: Vec<String> = match labels {
        Some(l) => l.iter().map(ToString::to_string).collect(),
        None => (0..n_images).map(|i| i.to_string()).collect(),
    };
    if labels.len() != n_images {
        return Err(ConfigurationError::LabelCountMismatch {
            labels: labels.len(),
            images: n_images,
        });
    }
    if labels.len() < 2 {
        return Err(ConfigurationError::TooFewPeriods(labels.len()));
    }
    validate_periods(&labels)?;
    Ok(labels)
}

/// Samples images through a [`PixelService`] into a [`SampleTable`].
pub struct Sampler<'s, S: PixelService> {
    service: &'s S,
}

impl<'s, S: PixelService> Sampler<'s, S> {
    pub fn new(service: &'s S) -> Self {
        Self { service }
    }

    /// Sample `request.count` random points in the region from each image.
    /// Columns of the result follow `periods`, which must match `images` 1:1.
    pub fn sample(&self, images: &[S::Image], periods: &[String], request: &SampleRequest) -> SankeeResult<SampleTable> {
        let periods = period_labels(Some(periods), images.len())?;
        if request.count == 0 {
            return Err(ConfigurationError::InvalidSetting {
                field: "samples",
                reason: "must be positive".into(),
            }
            .into());
        }

        let points = random_points(&request.region, request.count, request.seed)?;
        debug!(points = points.len(), seed = request.seed, "generated sample points");

        let extract = ExtractRequest {
            images,
            points: &points,
            band: &request.band,
            scale: request.scale,
            timeout: request.timeout,
        };
        let rows = self
            .service
            .extract(&extract)
            .map_err(|e| self.classify(e, images, &request.band))?;

        let raw = SampleTable::new(periods, rows)?;
        let empty: Vec<String> = raw
            .valid_counts()
            .iter()
            .zip(raw.periods())
            .filter(|(n, _)| **n == 0)
            .map(|(_, p)| p.clone())
            .collect();
        if !empty.is_empty() {
            return Err(SamplingError::NoSamples { periods: empty }.into());
        }

        let table = raw.with_policy(request.missing);
        if table.n_rows() < raw.n_rows() {
            warn!(
                dropped = raw.n_rows() - table.n_rows(),
                "discarded sample rows with missing values"
            );
        }
        info!(
            sampled = raw.n_rows(),
            kept = table.n_rows(),
            periods = table.n_periods(),
            "sampling complete"
        );
        Ok(table)
    }

    fn classify(&self, err: ServiceError, images: &[S::Image], band: &str) -> SamplingError {
        match err {
            ServiceError::MissingBand { .. } => SamplingError::InvalidBand {
                band: band.to_string(),
                shared_bands: self.shared_bands(images),
            },
            ServiceError::EmptyRegion => SamplingError::EmptyRegion,
            other => SamplingError::Service(other),
        }
    }

    /// Bands present in every image, in the first image's order. Empty if
    /// band names cannot be fetched.
    pub fn shared_bands(&self, images: &[S::Image]) -> Vec<String> {
        let mut lists = Vec::with_capacity(images.len());
        for img in images {
            match self.service.band_names(img) {
                Ok(names) => lists.push(names),
                Err(_) => return Vec::new(),
            }
        }
        let Some((first, rest)) = lists.split_first() else {
            return Vec::new();
        };
        first
            .iter()
            .filter(|b| rest.iter().all(|l| l.contains(b)))
            .cloned()
            .collect()
    }
}
