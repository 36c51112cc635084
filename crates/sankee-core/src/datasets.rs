//! Registry of premade classified land-cover datasets.
//!
//! Each dataset is immutable: class labels and colors, the band holding class
//! values, the available years, and an optional nodata class. Resolving a year
//! to an image id is a pure function of the dataset and the year.

use std::collections::BTreeSet;

use crate::catalog::ClassCatalog;
use crate::error::ConfigurationError;
use crate::sampling::LocalImage;
use crate::table::ClassCode;

/// Years a dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Years {
    /// Every year from start to end, inclusive.
    Range(i32, i32),
    List(&'static [i32]),
}

impl Years {
    pub fn contains(&self, year: i32) -> bool {
        match self {
            Years::Range(a, b) => (*a..=*b).contains(&year),
            Years::List(l) => l.contains(&year),
        }
    }

    pub fn to_vec(&self) -> Vec<i32> {
        match self {
            Years::Range(a, b) => (*a..=*b).collect(),
            Years::List(l) => l.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dataset {
    /// Short lookup key, e.g. `"NLCD"`.
    pub key: &'static str,
    pub name: &'static str,
    /// Collection id; per-year images are `{id}/{year}`.
    pub id: &'static str,
    pub band: &'static str,
    /// `(code, label, color)` in display order.
    pub classes: &'static [(ClassCode, &'static str, &'static str)],
    pub years: Years,
    pub nodata: Option<ClassCode>,
}

/// Resolves a dataset year to an image handle.
pub trait DatasetImages<I> {
    fn resolve(&self, dataset: &Dataset, year: i32) -> Option<I>;
}

impl DatasetImages<LocalImage> for [LocalImage] {
    fn resolve(&self, dataset: &Dataset, year: i32) -> Option<LocalImage> {
        let id = dataset.image_id(year);
        self.iter().find(|img| img.id == id).cloned()
    }
}

impl Dataset {
    /// Look up a registered dataset by key (case-insensitive).
    pub fn find(key: &str) -> Result<&'static Dataset, ConfigurationError> {
        DATASETS
            .iter()
            .copied()
            .find(|d| d.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| {
                ConfigurationError::UnknownDataset(
                    key.to_string(),
                    DATASETS.iter().map(|d| d.key.to_string()).collect(),
                )
            })
    }

    pub fn image_id(&self, year: i32) -> String {
        format!("{}/{}", self.id, year)
    }

    /// The class catalog without the nodata class.
    pub fn catalog(&self) -> Result<ClassCatalog, ConfigurationError> {
        let full = ClassCatalog::from_classes(self.classes.iter().copied())?;
        Ok(match self.nodata {
            Some(code) => full.without(code),
            None => full,
        })
    }

    /// At least two unique years, returned sorted ascending.
    pub fn validate_years(&self, years: &[i32]) -> Result<Vec<i32>, ConfigurationError> {
        if years.len() < 2 {
            return Err(ConfigurationError::TooFewPeriods(years.len()));
        }
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for y in years {
            if !seen.insert(*y) {
                duplicates.insert(*y);
            }
        }
        if !duplicates.is_empty() {
            return Err(ConfigurationError::DuplicateYears(duplicates.into_iter().collect()));
        }
        Ok(seen.into_iter().collect())
    }

    /// Requested years absent from the dataset's year list.
    pub fn missing_years(&self, years: &[i32]) -> Vec<i32> {
        let mut missing: Vec<i32> = years.iter().copied().filter(|y| !self.years.contains(*y)).collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    pub fn unknown_years_error(&self, missing: Vec<i32>) -> ConfigurationError {
        ConfigurationError::UnknownYears {
            dataset: self.name.to_string(),
            missing,
            available: self.years.to_vec(),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

pub static LCMS_LU: Dataset = Dataset {
    key: "LCMS_LU",
    name: "LCMS LU - Land Change Monitoring System Land Use",
    id: "USFS/GTAC/LCMS/v2024-10",
    band: "Land_Use",
    classes: &[
        (1, "Agriculture", "#efff6b"),
        (2, "Developed", "#ff2ff8"),
        (3, "Forest", "#1b9d0c"),
        (4, "Other", "#a1a1a1"),
        (5, "Rangeland or Pasture", "#c2b34a"),
        (6, "No Data", "#1B1716"),
    ],
    years: Years::Range(1985, 2024),
    nodata: Some(6),
};

pub static LCMS_LC: Dataset = Dataset {
    key: "LCMS_LC",
    name: "LCMS LC - Land Change Monitoring System Land Cover",
    id: "USFS/GTAC/LCMS/v2024-10",
    band: "Land_Cover",
    classes: &[
        (1, "Trees", "#005e00"),
        (2, "Tall Shrubs & Trees Mix", "#008000"),
        (3, "Shrubs & Trees Mix", "#00cc00"),
        (4, "Grass/Forb/Herb & Trees Mix", "#b3ff1a"),
        (5, "Barren & Trees Mix", "#99ff99"),
        (6, "Tall Shrubs", "#b30088"),
        (7, "Shrubs", "#e68a00"),
        (8, "Grass/Forb/Herb & Shrubs Mix", "#ffad33"),
        (9, "Barren & Shrubs Mix", "#ffe0b3"),
        (10, "Grass/Forb/Herb", "#ffff00"),
        (11, "Barren & Grass/Forb/Herb Mix", "#AA7700"),
        (12, "Barren or Impervious", "#d3bf9b"),
        (13, "Snow or Ice", "#ffffff"),
        (14, "Water", "#4780f3"),
        (15, "No Data", "#1B1716"),
    ],
    years: Years::Range(1985, 2024),
    nodata: Some(15),
};

pub static NLCD: Dataset = Dataset {
    key: "NLCD",
    name: "NLCD - National Land Cover Database",
    id: "USGS/NLCD_RELEASES/2019_REL/NLCD",
    band: "landcover",
    classes: &[
        (1, "No data", "#000000"),
        (11, "Open water", "#466b9f"),
        (12, "Perennial ice/snow", "#d1def8"),
        (21, "Developed, open space", "#dec5c5"),
        (22, "Developed, low intensity", "#d99282"),
        (23, "Developed, medium intensity", "#eb0000"),
        (24, "Developed, high intensity", "#ab0000"),
        (31, "Barren land (rock/sand/clay)", "#b3ac9f"),
        (41, "Deciduous forest", "#68ab5f"),
        (42, "Evergreen forest", "#1c5f2c"),
        (43, "Mixed forest", "#b5c58f"),
        (51, "Dwarf scrub", "#af963c"),
        (52, "Shrub/scrub", "#ccb879"),
        (71, "Grassland/herbaceous", "#dfdfc2"),
        (72, "Sedge/herbaceous", "#d1d182"),
        (73, "Lichens", "#a3cc51"),
        (74, "Moss", "#82ba9e"),
        (81, "Pasture/hay", "#dcd939"),
        (82, "Cultivated crops", "#ab6c28"),
        (90, "Woody wetlands", "#b8d9eb"),
        (95, "Emergent herbaceous wetlands", "#6c9fb8"),
    ],
    years: Years::List(&[2001, 2004, 2006, 2008, 2011, 2013, 2016, 2019]),
    nodata: Some(1),
};

pub static MODIS_LC_TYPE1: Dataset = Dataset {
    key: "MODIS_LC_TYPE1",
    name: "MCD12Q1 - MODIS Global Land Cover Type 1",
    id: "MODIS/061/MCD12Q1",
    band: "LC_Type1",
    classes: &[
        (1, "Evergreen conifer forest", "#086a10"),
        (2, "Evergreen broadleaf forest", "#dcd159"),
        (3, "Deciduous conifer forest", "#54a708"),
        (4, "Deciduous broadleaf forest", "#78d203"),
        (5, "Mixed forest", "#009900"),
        (6, "Closed shrubland", "#c6b044"),
        (7, "Open shrubland", "#dcd159"),
        (8, "Woody savanna", "#dade48"),
        (9, "Savanna", "#fbff13"),
        (10, "Grassland", "#b6ff05"),
        (11, "Permanent wetland", "#27ff87"),
        (12, "Cropland", "#c24f44"),
        (13, "Urban", "#a5a5a5"),
        (14, "Cropland and natural vegetation", "#ff6d4c"),
        (15, "Permanent snow and ice", "#69fff8"),
        (16, "Barren", "#f9ffa4"),
        (17, "Water", "#1c0dff"),
    ],
    years: Years::Range(2001, 2023),
    nodata: None,
};

pub static MODIS_LC_TYPE3: Dataset = Dataset {
    key: "MODIS_LC_TYPE3",
    name: "MCD12Q1 - MODIS Global Land Cover Type 3",
    id: "MODIS/061/MCD12Q1",
    band: "LC_Type3",
    classes: &[
        (0, "Water", "#1c0dff"),
        (1, "Grassland", "#b6ff05"),
        (2, "Shrubland", "#dcd159"),
        (3, "Crops", "#c24f44"),
        (4, "Savannas", "#fbff13"),
        (5, "Evergreen broadleaf", "#086a10"),
        (6, "Deciduous broadleaf", "#78d203"),
        (7, "Evergreen conifer", "#05450a"),
        (8, "Deciduous conifer", "#54a708"),
        (9, "Barren", "#f9ffa4"),
        (10, "Urban", "#a5a5a5"),
    ],
    years: Years::Range(2001, 2023),
    nodata: None,
};

pub static CGLS_LC100: Dataset = Dataset {
    key: "CGLS_LC100",
    name: "CGLS - Copernicus Global Land Cover",
    id: "COPERNICUS/Landcover/100m/Proba-V-C3/Global",
    band: "discrete_classification",
    classes: &[
        (0, "Unknown", "#282828"),
        (20, "Shrubs", "#FFBB22"),
        (30, "Herbaceous vegetation", "#FFFF4C"),
        (40, "Cultivated", "#F096FF"),
        (50, "Urban", "#FA0000"),
        (60, "Bare", "#B4B4B4"),
        (70, "Snow and ice", "#F0F0F0"),
        (80, "Water body", "#0032C8"),
        (90, "Herbaceous wetland", "#0096A0"),
        (100, "Moss and lichen", "#FAE6A0"),
        (111, "Closed forest, evergreen conifer", "#58481F"),
        (112, "Closed forest, evergreen broad leaf", "#009900"),
        (113, "Closed forest, deciduous conifer", "#70663E"),
        (114, "Closed forest, deciduous broad leaf", "#00CC00"),
        (115, "Closed forest, mixed", "#4E751F"),
        (116, "Closed forest, other", "#007800"),
        (121, "Open forest, evergreen conifer", "#666000"),
        (122, "Open forest, evergreen broad leaf", "#8DB400"),
        (123, "Open forest, deciduous conifer", "#8D7400"),
        (124, "Open forest, deciduous broad leaf", "#A0DC00"),
        (125, "Open forest, mixed", "#929900"),
        (126, "Open forest, other", "#648C00"),
        (200, "Ocean", "#000080"),
    ],
    years: Years::Range(2015, 2019),
    nodata: Some(0),
};

pub static LCMAP: Dataset = Dataset {
    key: "LCMAP",
    name: "LCMAP - Landscape Change Monitoring, Assessment, and Projection",
    id: "projects/sat-io/open-datasets/LCMAP/LCPRI",
    band: "b1",
    classes: &[
        (1, "Developed", "#E60000"),
        (2, "Cropland", "#A87000"),
        (3, "Grass/Shrub", "#E3E3C2"),
        (4, "Tree Cover", "#1D6330"),
        (5, "Water", "#476BA1"),
        (6, "Wetland", "#BAD9EB"),
        (7, "Ice/Snow", "#FFFFFF"),
        (8, "Barren", "#B3B0A3"),
    ],
    years: Years::Range(1985, 2021),
    nodata: None,
};

pub static DATASETS: &[&Dataset] = &[
    &LCMS_LC,
    &LCMS_LU,
    &NLCD,
    &MODIS_LC_TYPE1,
    &MODIS_LC_TYPE3,
    &CGLS_LC100,
    &LCMAP,
];
