//! Per-point, per-period class observations.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Raw integer pixel value identifying a land-cover class.
pub type ClassCode = i64;

/// What to do with sample rows that are missing a value in some period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Drop every row with at least one missing value.
    #[default]
    Drop,
    /// Keep partial rows; each transition only uses rows valid in both of its periods.
    Retain,
}

/// A rectangular table of class observations: one row per sample point, one
/// column per period. Column order is chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleTable")]
pub struct SampleTable {
    periods: Vec<String>,
    rows: Vec<Vec<Option<ClassCode>>>,
}

#[derive(Deserialize)]
struct RawSampleTable {
    periods: Vec<String>,
    rows: Vec<Vec<Option<ClassCode>>>,
}

impl TryFrom<RawSampleTable> for SampleTable {
    type Error = ConfigurationError;

    fn try_from(raw: RawSampleTable) -> Result<Self, Self::Error> {
        Self::new(raw.periods, raw.rows)
    }
}

impl SampleTable {
    /// Build a table, checking that period labels are unique and every row has
    /// one value per period.
    pub fn new(periods: Vec<String>, rows: Vec<Vec<Option<ClassCode>>>) -> Result<Self, ConfigurationError> {
        validate_periods(&periods)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != periods.len() {
                return Err(ConfigurationError::RowWidth {
                    row: i,
                    found: row.len(),
                    expected: periods.len(),
                });
            }
        }
        Ok(Self { periods, rows })
    }

    /// Build a table from fully-populated columns, e.g. `[("start", vec![1, 2]), ("end", vec![1, 3])]`.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<ClassCode>)>) -> Result<Self, ConfigurationError> {
        let n_rows = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let mut periods = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (name, col) in columns {
            periods.push(name.into());
            values.push(col);
        }
        let rows = (0..n_rows)
            .map(|r| values.iter().map(|col| col.get(r).copied()).collect())
            .collect();
        Self::new(periods, rows)
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn rows(&self) -> &[Vec<Option<ClassCode>>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one period column, in row order.
    pub fn column(&self, period: usize) -> impl Iterator<Item = Option<ClassCode>> + '_ {
        self.rows.iter().map(move |row| row[period])
    }

    /// Every distinct class code observed anywhere in the table.
    pub fn classes(&self) -> BTreeSet<ClassCode> {
        self.rows.iter().flatten().flatten().copied().collect()
    }

    /// Number of observations of each class across all periods, in order of
    /// first appearance (row-major).
    pub fn class_counts(&self) -> IndexMap<ClassCode, usize> {
        let mut counts = IndexMap::new();
        for code in self.rows.iter().flatten().flatten() {
            *counts.entry(*code).or_insert(0) += 1;
        }
        counts
    }

    /// Number of rows exhibiting each class in each period, keyed by
    /// `(period index, class)`.
    pub fn period_class_counts(&self) -> HashMap<(usize, ClassCode), usize> {
        let mut counts = HashMap::new();
        for row in &self.rows {
            for (p, value) in row.iter().enumerate() {
                if let Some(code) = value {
                    *counts.entry((p, *code)).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Number of non-missing values in each period column.
    pub fn valid_counts(&self) -> Vec<usize> {
        (0..self.periods.len())
            .map(|p| self.column(p).filter(Option::is_some).count())
            .collect()
    }

    /// Keep only the rows matching `keep`.
    pub fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&[Option<ClassCode>]) -> bool,
    {
        Self {
            periods: self.periods.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Drop every row that contains any of `classes` in any period.
    pub fn exclude_classes(&self, classes: &HashSet<ClassCode>) -> Self {
        if classes.is_empty() {
            return self.clone();
        }
        self.retain_rows(|row| !row.iter().flatten().any(|code| classes.contains(code)))
    }

    /// Drop every row with a missing value in any period.
    pub fn drop_missing(&self) -> Self {
        self.retain_rows(|row| row.iter().all(Option::is_some))
    }

    /// Apply a missing-value policy.
    pub fn with_policy(&self, policy: MissingPolicy) -> Self {
        match policy {
            MissingPolicy::Drop => self.drop_missing(),
            MissingPolicy::Retain => self.clone(),
        }
    }

    /// Replace class codes according to `remap`; unmapped codes are unchanged.
    pub fn remap(&self, remap: &HashMap<ClassCode, ClassCode>) -> Self {
        if remap.is_empty() {
            return self.clone();
        }
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.map(|c| remap.get(&c).copied().unwrap_or(c))).collect())
            .collect();
        Self {
            periods: self.periods.clone(),
            rows,
        }
    }

    /// Turn every occurrence of `code` into a missing value.
    pub fn mask_class(&self, code: ClassCode) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.filter(|c| *c != code)).collect())
            .collect();
        Self {
            periods: self.periods.clone(),
            rows,
        }
    }
}

/// Period labels must be unique. At least two periods are needed to form a
/// transition, but a table itself may hold any number.
pub(crate) fn validate_periods(periods: &[String]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    let mut duplicated: Vec<String> = Vec::new();
    for p in periods {
        if !seen.insert(p.as_str()) && !duplicated.contains(p) {
            duplicated.push(p.clone());
        }
    }
    if duplicated.is_empty() {
        Ok(())
    } else {
        Err(ConfigurationError::DuplicatePeriods(duplicated))
    }
}
