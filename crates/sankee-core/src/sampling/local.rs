//! In-memory pixel service over [`ClassRaster`] bands.

use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ExtractRequest, PixelService, ServiceError};
use crate::coords::{Bbox, Region};
use crate::raster::ClassRaster;
use crate::table::ClassCode;

/// A classified image held in memory: named bands of class rasters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalImage {
    pub id: String,
    pub bands: IndexMap<String, ClassRaster>,
}

impl LocalImage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bands: IndexMap::new(),
        }
    }

    pub fn with_band(mut self, name: impl Into<String>, raster: ClassRaster) -> Self {
        self.bands.insert(name.into(), raster);
        self
    }

    /// Union of all band bounds.
    pub fn bounds(&self) -> Option<Bbox> {
        self.bands
            .values()
            .map(ClassRaster::bbox)
            .reduce(|a, b| a.union(&b))
    }
}

/// Pixel service that reads directly from [`LocalImage`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPixelService;

impl PixelService for LocalPixelService {
    type Image = LocalImage;

    fn extract(&self, request: &ExtractRequest<'_, LocalImage>) -> Result<Vec<Vec<Option<ClassCode>>>, ServiceError> {
        let started = Instant::now();

        let rasters = request
            .images
            .iter()
            .map(|img| {
                img.bands.get(request.band).ok_or_else(|| ServiceError::MissingBand {
                    band: request.band.to_string(),
                    image: img.id.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(request.points.len());
        for p in request.points {
            if started.elapsed() > request.timeout {
                return Err(ServiceError::Timeout(request.timeout));
            }
            rows.push(rasters.iter().map(|r| r.sample_at_scale(*p, request.scale)).collect());
        }
        Ok(rows)
    }

    fn band_names(&self, image: &LocalImage) -> Result<Vec<String>, ServiceError> {
        Ok(image.bands.keys().cloned().collect())
    }

    fn footprint(&self, image: &LocalImage) -> Option<Region> {
        image.bounds().map(|b| b.to_region())
    }
}
