//! Geographic coordinate and sampling-region types.
//! All coordinate math uses f64 for precision.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::SamplingError;

/// Rejection sampling gives up after `count * MAX_ATTEMPTS_PER_POINT` draws.
const MAX_ATTEMPTS_PER_POINT: usize = 10_000;

/// A point on the sphere in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bbox {
    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lon >= self.min_lon && p.lon <= self.max_lon
    }

    /// Finite and within ±90° latitude, ±180° longitude.
    pub fn is_geographic(&self) -> bool {
        let lat_ok = |v: f64| v.is_finite() && (-90.0..=90.0).contains(&v);
        let lon_ok = |v: f64| v.is_finite() && (-180.0..=180.0).contains(&v);
        lat_ok(self.min_lat) && lat_ok(self.max_lat) && lon_ok(self.min_lon) && lon_ok(self.max_lon)
    }

    fn out_of_bounds(&self) -> SamplingError {
        SamplingError::RegionOutOfBounds {
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lon: self.min_lon,
            max_lon: self.max_lon,
        }
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn to_region(&self) -> Region {
        Region::Polygon {
            coordinates: vec![vec![
                [self.min_lon, self.min_lat],
                [self.max_lon, self.min_lat],
                [self.max_lon, self.max_lat],
                [self.min_lon, self.max_lat],
                [self.min_lon, self.min_lat],
            ]],
        }
    }
}

/// A sampling region in GeoJSON geometry form. Positions are `[lon, lat]`.
///
/// For polygons the first ring is the exterior and any further rings are
/// holes; containment uses the even-odd rule across all rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Region {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Region {
    /// Planar area in square degrees (exterior minus holes). Points have zero area.
    pub fn area(&self) -> f64 {
        match self {
            Region::Point { .. } => 0.0,
            Region::Polygon { coordinates } => {
                let mut rings = coordinates.iter().map(|r| ring_area(r));
                let exterior = rings.next().unwrap_or(0.0);
                (exterior - rings.sum::<f64>()).max(0.0)
            }
        }
    }

    pub fn bbox(&self) -> Option<Bbox> {
        let positions: Vec<[f64; 2]> = match self {
            Region::Point { coordinates } => vec![*coordinates],
            Region::Polygon { coordinates } => coordinates.first().cloned().unwrap_or_default(),
        };
        let first = positions.first()?;
        let init = Bbox {
            min_lat: first[1],
            max_lat: first[1],
            min_lon: first[0],
            max_lon: first[0],
        };
        Some(positions.iter().fold(init, |b, p| Bbox {
            min_lat: b.min_lat.min(p[1]),
            max_lat: b.max_lat.max(p[1]),
            min_lon: b.min_lon.min(p[0]),
            max_lon: b.max_lon.max(p[0]),
        }))
    }

    /// Even-odd containment test.
    pub fn contains(&self, p: LatLon) -> bool {
        match self {
            Region::Point { .. } => false,
            Region::Polygon { coordinates } => {
                coordinates.iter().filter(|ring| ring_contains(ring, p)).count() % 2 == 1
            }
        }
    }
}

/// Generate `count` uniformly distributed random points inside `region`.
///
/// The same region, count and seed always yield the same points.
pub fn random_points(region: &Region, count: usize, seed: u64) -> Result<Vec<LatLon>, SamplingError> {
    let bbox = match region.bbox() {
        Some(b) if region.area() > 0.0 => b,
        _ => return Err(SamplingError::EmptyRegion),
    };
    if !bbox.is_geographic() {
        return Err(bbox.out_of_bounds());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(count);
    let max_attempts = count.saturating_mul(MAX_ATTEMPTS_PER_POINT);
    let mut attempts = 0usize;

    while points.len() < count {
        if attempts >= max_attempts {
            return Err(SamplingError::EmptyRegion);
        }
        attempts += 1;
        let p = LatLon::new(
            rng.gen_range(bbox.min_lat..=bbox.max_lat),
            rng.gen_range(bbox.min_lon..=bbox.max_lon),
        );
        if region.contains(p) {
            points.push(p);
        }
    }
    Ok(points)
}

/// Shoelace area of one ring (absolute value).
fn ring_area(ring: &[[f64; 2]]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        twice += a[0] * b[1] - b[0] * a[1];
    }
    (twice / 2.0).abs()
}

/// Ray-casting point-in-ring test.
fn ring_contains(ring: &[[f64; 2]], p: LatLon) -> bool {
    let (x, y) = (p.lon, p.lat);
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
