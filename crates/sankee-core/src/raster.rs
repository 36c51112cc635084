use serde::{Deserialize, Serialize};

use crate::coords::{Bbox, LatLon};
use crate::error::ConfigurationError;
use crate::table::ClassCode;

/// A 2D grid of class codes, row-major, with geographic bounds.
/// Row 0 is the southernmost row (min_lat). `None` marks masked / nodata cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClassRaster")]
pub struct ClassRaster {
    /// Row-major class values.
    pub data: Vec<Option<ClassCode>>,
    pub width: usize,
    pub height: usize,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

#[derive(Deserialize)]
struct RawClassRaster {
    data: Vec<Option<ClassCode>>,
    width: usize,
    height: usize,
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
}

impl TryFrom<RawClassRaster> for ClassRaster {
    type Error = ConfigurationError;

    fn try_from(raw: RawClassRaster) -> Result<Self, Self::Error> {
        if raw.width.checked_mul(raw.height) != Some(raw.data.len()) {
            return Err(ConfigurationError::RasterSize {
                width: raw.width,
                height: raw.height,
                found: raw.data.len(),
            });
        }
        Ok(Self {
            data: raw.data,
            width: raw.width,
            height: raw.height,
            min_lon: raw.min_lon,
            max_lon: raw.max_lon,
            min_lat: raw.min_lat,
            max_lat: raw.max_lat,
        })
    }
}

impl ClassRaster {
    /// Create a raster filled with the given value.
    pub fn new(width: usize, height: usize, bbox: Bbox, fill: Option<ClassCode>) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            min_lon: bbox.min_lon,
            max_lon: bbox.max_lon,
            min_lat: bbox.min_lat,
            max_lat: bbox.max_lat,
        }
    }

    pub fn bbox(&self) -> Bbox {
        Bbox {
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lon: self.min_lon,
            max_lon: self.max_lon,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<ClassCode> {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: Option<ClassCode>) {
        self.data[row * self.width + col] = val;
    }

    /// Native cell size in degrees as (lat, lon).
    pub fn cell_size(&self) -> (f64, f64) {
        (
            (self.max_lat - self.min_lat) / self.height.max(1) as f64,
            (self.max_lon - self.min_lon) / self.width.max(1) as f64,
        )
    }

    /// Nearest-neighbour lookup at native resolution.
    /// Returns None outside the bounds or on a masked cell.
    pub fn sample(&self, p: LatLon) -> Option<ClassCode> {
        if self.width == 0 || self.height == 0 || !self.bbox().contains(p) {
            return None;
        }
        let (dlat, dlon) = self.cell_size();
        let col = (((p.lon - self.min_lon) / dlon).floor() as usize).min(self.width - 1);
        let row = (((p.lat - self.min_lat) / dlat).floor() as usize).min(self.height - 1);
        self.get(row, col)
    }

    /// Lookup at a fixed `scale` (degrees): the point is snapped to the centre
    /// of its `scale`-sized cell, anchored at the raster's south-west corner,
    /// before the native lookup.
    pub fn sample_at_scale(&self, p: LatLon, scale: Option<f64>) -> Option<ClassCode> {
        match scale {
            None => self.sample(p),
            Some(s) => {
                if !self.bbox().contains(p) {
                    return None;
                }
                let snap = |v: f64, origin: f64| origin + ((v - origin) / s).floor() * s + s / 2.0;
                let snapped = LatLon::new(snap(p.lat, self.min_lat), snap(p.lon, self.min_lon));
                let clamped = LatLon::new(
                    snapped.lat.clamp(self.min_lat, self.max_lat),
                    snapped.lon.clamp(self.min_lon, self.max_lon),
                );
                self.sample(clamped)
            }
        }
    }
}
