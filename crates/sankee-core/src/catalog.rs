//! Class labels and colors, compatibility checking, and merging of classes
//! that share a label and color.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::{CompatibilityError, ConfigurationError};
use crate::table::{ClassCode, SampleTable};

/// Label and color lookup for class codes. Insertion order is kept; it decides
/// which code survives when classes are merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassCatalog {
    labels: IndexMap<ClassCode, String>,
    palette: IndexMap<ClassCode, String>,
}

impl ClassCatalog {
    /// Build a catalog. Every color must be a `#RRGGBB` hex string.
    pub fn new(
        labels: IndexMap<ClassCode, String>,
        palette: IndexMap<ClassCode, String>,
    ) -> Result<Self, ConfigurationError> {
        for (code, color) in &palette {
            if !is_hex_color(color) {
                return Err(ConfigurationError::InvalidColor {
                    code: *code,
                    color: color.clone(),
                });
            }
        }
        Ok(Self { labels, palette })
    }

    /// Build a catalog from `(code, label, color)` triples.
    pub fn from_classes<L, C>(classes: impl IntoIterator<Item = (ClassCode, L, C)>) -> Result<Self, ConfigurationError>
    where
        L: Into<String>,
        C: Into<String>,
    {
        let mut labels = IndexMap::new();
        let mut palette = IndexMap::new();
        for (code, label, color) in classes {
            labels.insert(code, label.into());
            palette.insert(code, color.into());
        }
        Self::new(labels, palette)
    }

    pub fn label(&self, code: ClassCode) -> Option<&str> {
        self.labels.get(&code).map(String::as_str)
    }

    pub fn color(&self, code: ClassCode) -> Option<&str> {
        self.palette.get(&code).map(String::as_str)
    }

    pub fn labels(&self) -> &IndexMap<ClassCode, String> {
        &self.labels
    }

    pub fn palette(&self) -> &IndexMap<ClassCode, String> {
        &self.palette
    }

    /// Remove a class from both maps, keeping the order of the rest.
    pub fn without(&self, code: ClassCode) -> Self {
        let mut out = self.clone();
        out.labels.shift_remove(&code);
        out.palette.shift_remove(&code);
        out
    }

    /// Build the canonical remapping for classes with identical (label, color).
    ///
    /// The first code carrying a pair wins; later codes with the same pair are
    /// remapped to it. Codes lacking either a label or a color are never merged.
    pub fn merge_plan(&self) -> ClassMerge {
        let mut first_by_pair: HashMap<(&str, &str), ClassCode> = HashMap::new();
        let mut remap = HashMap::new();
        let mut labels = IndexMap::new();
        let mut palette = IndexMap::new();

        for (code, label) in &self.labels {
            let Some(color) = self.palette.get(code) else {
                labels.insert(*code, label.clone());
                continue;
            };
            match first_by_pair.get(&(label.as_str(), color.as_str())) {
                Some(&canonical) => {
                    remap.insert(*code, canonical);
                }
                None => {
                    first_by_pair.insert((label.as_str(), color.as_str()), *code);
                    labels.insert(*code, label.clone());
                    palette.insert(*code, color.clone());
                }
            }
        }
        for (code, color) in &self.palette {
            if !self.labels.contains_key(code) {
                palette.insert(*code, color.clone());
            }
        }

        if !remap.is_empty() {
            debug!(merged = remap.len(), "merging classes with identical label and color");
        }
        ClassMerge {
            remap,
            catalog: ClassCatalog { labels, palette },
        }
    }
}

/// Canonical remapping produced by [`ClassCatalog::merge_plan`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassMerge {
    remap: HashMap<ClassCode, ClassCode>,
    catalog: ClassCatalog,
}

impl ClassMerge {
    /// Merged code → surviving code. Surviving codes are absent.
    pub fn remap(&self) -> &HashMap<ClassCode, ClassCode> {
        &self.remap
    }

    /// The deduplicated catalog.
    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    /// Resolve any code to the class it was merged into.
    pub fn canonical(&self, code: ClassCode) -> ClassCode {
        self.remap.get(&code).copied().unwrap_or(code)
    }

    /// Rewrite a table so merged codes use their surviving code.
    pub fn apply(&self, table: &SampleTable) -> SampleTable {
        table.remap(&self.remap)
    }
}

/// Every class observed in `table` must have both a label and a color.
/// Reports all missing codes, sorted.
pub fn check_compatible(table: &SampleTable, catalog: &ClassCatalog) -> Result<(), CompatibilityError> {
    let classes = table.classes();
    let missing_labels: Vec<ClassCode> = classes.iter().filter(|c| catalog.label(**c).is_none()).copied().collect();
    let missing_colors: Vec<ClassCode> = classes.iter().filter(|c| catalog.color(**c).is_none()).copied().collect();
    if missing_labels.is_empty() && missing_colors.is_empty() {
        Ok(())
    } else {
        Err(CompatibilityError::new(missing_labels, missing_colors))
    }
}

/// `#RRGGBB`, case-insensitive.
pub fn is_hex_color(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}
