//! Label and palette resolution for nodes and links.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::ClassCatalog;
use crate::error::CompatibilityError;
use crate::nodes::NodeKey;
use crate::table::{ClassCode, SampleTable};
use crate::transition::TransitionEdge;

/// What each node displays as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    /// The class label from the catalog.
    #[default]
    Class,
    /// Share of the period's samples in this class, e.g. `"42%"`.
    Percent,
    /// Number of samples in this class and period.
    Count,
    /// No label.
    None,
}

impl std::str::FromStr for LabelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(Self::Class),
            "percent" => Ok(Self::Percent),
            "count" => Ok(Self::Count),
            "none" => Ok(Self::None),
            other => Err(format!(
                "invalid label type `{other}`; choose from class, percent, count, none"
            )),
        }
    }
}

/// A fully resolved Sankey node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeEntry {
    pub id: usize,
    pub period: String,
    pub class_code: ClassCode,
    /// Display label, per [`LabelType`].
    pub label: String,
    pub color: String,
    /// Sample rows with this class in this period.
    pub size: usize,
}

/// Format a proportion as a whole percentage, e.g. `0.5` → `"50%"`.
///
/// Rounds `proportion * 100` to the nearest integer with ties to even, which
/// is what Rust's `{:.0}` float formatting does.
pub fn format_percent(proportion: f64) -> String {
    format!("{:.0}%", proportion * 100.0)
}

/// Describe a transition, e.g. `"80% of Cropland became Developed"`.
pub fn describe(edge: &TransitionEdge, catalog: &ClassCatalog) -> Result<String, CompatibilityError> {
    let source = catalog
        .label(edge.source_class)
        .ok_or_else(|| CompatibilityError::new(vec![edge.source_class], vec![]))?;
    let target = catalog
        .label(edge.target_class)
        .ok_or_else(|| CompatibilityError::new(vec![edge.target_class], vec![]))?;
    let verb = if edge.is_persistence() { "remained" } else { "became" };
    Ok(format!("{} of {source} {verb} {target}", format_percent(edge.proportion)))
}

/// Attach labels and colors to indexed nodes.
///
/// Percentages are relative to the valid samples of the node's period in `table`.
pub fn resolve_nodes(
    keys: &[NodeKey],
    table: &SampleTable,
    catalog: &ClassCatalog,
    label_type: LabelType,
) -> Result<Vec<NodeEntry>, CompatibilityError> {
    let period_totals: HashMap<&str, usize> = table
        .periods()
        .iter()
        .map(String::as_str)
        .zip(table.valid_counts())
        .collect();

    let mut missing_labels = Vec::new();
    let mut missing_colors = Vec::new();
    let mut nodes = Vec::with_capacity(keys.len());

    for key in keys {
        let class_label = catalog.label(key.class_code);
        let color = catalog.color(key.class_code);
        if class_label.is_none() {
            missing_labels.push(key.class_code);
        }
        if color.is_none() {
            missing_colors.push(key.class_code);
        }
        let (Some(class_label), Some(color)) = (class_label, color) else {
            continue;
        };

        let label = match label_type {
            LabelType::Class => class_label.to_string(),
            LabelType::Percent => {
                let total = period_totals.get(key.period.as_str()).copied().unwrap_or(0);
                if total == 0 {
                    format_percent(0.0)
                } else {
                    format_percent(key.size as f64 / total as f64)
                }
            }
            LabelType::Count => key.size.to_string(),
            LabelType::None => String::new(),
        };

        nodes.push(NodeEntry {
            id: key.id,
            period: key.period.clone(),
            class_code: key.class_code,
            label,
            color: color.to_string(),
            size: key.size,
        });
    }

    if missing_labels.is_empty() && missing_colors.is_empty() {
        Ok(nodes)
    } else {
        Err(CompatibilityError::new(missing_labels, missing_colors))
    }
}
