//! Error taxonomy for the sankee core library.
//!
//! Configuration problems are raised before any sampling happens, sampling
//! problems after the remote round-trip, and compatibility problems after
//! sampling but before anything is rendered.

use crate::sampling::ServiceError;
use crate::table::ClassCode;

/// Malformed caller input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("the number of period labels ({labels}) must match the number of images ({images})")]
    LabelCountMismatch { labels: usize, images: usize },

    #[error("all period labels must be unique; duplicated: {0:?}")]
    DuplicatePeriods(Vec<String>),

    #[error("at least two periods are required, got {0}")]
    TooFewPeriods(usize),

    #[error("duplicate years found: {0:?}. Make sure all years are unique")]
    DuplicateYears(Vec<i32>),

    #[error("dataset `{dataset}` does not include the year(s) {missing:?}; choose from {available:?}")]
    UnknownYears {
        dataset: String,
        missing: Vec<i32>,
        available: Vec<i32>,
    },

    #[error("dataset `{0}` not found; choose from {1:?}")]
    UnknownDataset(String, Vec<String>),

    #[error("row {row} has {found} values but the table has {expected} periods")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("invalid color `{color}` for class {code}; expected #RRGGBB")]
    InvalidColor { code: ClassCode, color: String },

    #[error("theme `{0}` not found; choose from {1:?}")]
    UnknownTheme(String, Vec<String>),

    #[error("no region was provided and the first image has no footprint to sample within")]
    MissingRegion,

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("found {found} values for a {width}×{height} raster")]
    RasterSize { width: usize, height: usize, found: usize },
}

/// Remote extraction failed or returned nothing usable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("the band `{band}` was not found in all images; choose from {shared_bands:?}")]
    InvalidBand {
        band: String,
        shared_bands: Vec<String>,
    },

    #[error("the sample region is empty; pass a valid polygon with a non-zero area")]
    EmptyRegion,

    #[error("the sample region spans lat {min_lat}..{max_lat}, lon {min_lon}..{max_lon}; coordinates must lie within ±90° latitude and ±180° longitude")]
    RegionOutOfBounds {
        min_lat: f64,
        max_lat: f64,
        min_lon: f64,
        max_lon: f64,
    },

    #[error("valid samples were not found for period(s) {periods:?}; check that the images overlap the sampling region")]
    NoSamples { periods: Vec<String> },

    #[error("pixel service failed: {0}")]
    Service(ServiceError),
}

/// Sampled class codes that the label/color catalog does not cover.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("class codes {missing:?} are present in the sampled data but are missing a label ({missing_labels:?}) or a color ({missing_colors:?})")]
pub struct CompatibilityError {
    /// Sorted union of `missing_labels` and `missing_colors`.
    pub missing: Vec<ClassCode>,
    pub missing_labels: Vec<ClassCode>,
    pub missing_colors: Vec<ClassCode>,
}

impl CompatibilityError {
    pub fn new(mut missing_labels: Vec<ClassCode>, mut missing_colors: Vec<ClassCode>) -> Self {
        missing_labels.sort_unstable();
        missing_labels.dedup();
        missing_colors.sort_unstable();
        missing_colors.dedup();
        let mut missing: Vec<ClassCode> = missing_labels.iter().chain(&missing_colors).copied().collect();
        missing.sort_unstable();
        missing.dedup();
        Self {
            missing,
            missing_labels,
            missing_colors,
        }
    }
}

/// Top-level error enum for the sankee core library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SankeeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("sampling error: {0}")]
    Sampling(#[from] SamplingError),

    #[error("compatibility error: {0}")]
    Compatibility(#[from] CompatibilityError),
}

pub type SankeeResult<T> = Result<T, SankeeError>;
