//! JSON request schema: images, region, catalog or dataset, config.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use sankee_core::coords::Bbox;
use sankee_core::raster::ClassRaster;
use sankee_core::sampling::LocalImage;
use sankee_core::{ClassCatalog, ClassCode, Region, SankifyConfig};

use crate::geotiff::read_class_tiff;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    /// Required unless `dataset` is given.
    #[serde(default)]
    pub band: Option<String>,
    pub images: Vec<ImageDef>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub labels: Option<IndexMap<ClassCode, String>>,
    #[serde(default)]
    pub palette: Option<IndexMap<ClassCode, String>>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub years: Option<Vec<i32>>,
    #[serde(default)]
    pub config: SankifyConfig,
}

#[derive(Debug, Deserialize)]
pub struct ImageDef {
    pub id: String,
    /// Period label; all images carry one or none do.
    #[serde(default)]
    pub label: Option<String>,
    pub bands: IndexMap<String, BandDef>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BandDef {
    Raster {
        raster: ClassRaster,
    },
    Tiff {
        tiff: PathBuf,
        bbox: Bbox,
        #[serde(default)]
        nodata: Option<ClassCode>,
    },
}

impl Request {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse request {}", path.display()))
    }

    /// Materialize every image. TIFF paths resolve relative to `base_dir`.
    pub fn images(&self, base_dir: &Path) -> Result<Vec<LocalImage>> {
        let mut out = Vec::with_capacity(self.images.len());
        for def in &self.images {
            let mut image = LocalImage::new(&def.id);
            for (name, band) in &def.bands {
                let raster = match band {
                    BandDef::Raster { raster } => raster.clone(),
                    BandDef::Tiff { tiff, bbox, nodata } => {
                        let path = base_dir.join(tiff);
                        read_class_tiff(&path, *bbox, *nodata)
                            .with_context(|| format!("image `{}` band `{name}`", def.id))?
                    }
                };
                image = image.with_band(name.clone(), raster);
            }
            out.push(image);
        }
        Ok(out)
    }

    /// Period labels from the images, if every image has one.
    pub fn period_labels(&self) -> Result<Option<Vec<String>>> {
        let labels: Vec<&String> = self.images.iter().filter_map(|i| i.label.as_ref()).collect();
        match labels.len() {
            0 => Ok(None),
            n if n == self.images.len() => Ok(Some(labels.into_iter().cloned().collect())),
            n => bail!("{n} of {} images have a label; label all images or none", self.images.len()),
        }
    }

    pub fn catalog(&self) -> Result<ClassCatalog> {
        let (Some(labels), Some(palette)) = (&self.labels, &self.palette) else {
            bail!("request needs either `dataset` or both `labels` and `palette`");
        };
        Ok(ClassCatalog::new(labels.clone(), palette.clone())?)
    }
}
