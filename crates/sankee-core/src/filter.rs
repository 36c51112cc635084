//! Interactive filter state: hidden classes and a class-size threshold.
//!
//! The state only decides which sample rows are retained; re-deriving edges
//! and nodes from the retained rows is the plot's job.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::table::{ClassCode, SampleTable};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    hidden: BTreeSet<ClassCode>,
    /// Keep only classes at least as large as the k-th largest class; 0 disables.
    min_class_size: usize,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden(&self) -> &BTreeSet<ClassCode> {
        &self.hidden
    }

    pub fn min_class_size(&self) -> usize {
        self.min_class_size
    }

    pub fn is_hidden(&self, code: ClassCode) -> bool {
        self.hidden.contains(&code)
    }

    /// Returns false if the class was already hidden.
    pub fn hide(&mut self, code: ClassCode) -> bool {
        self.hidden.insert(code)
    }

    /// Returns false if the class was not hidden.
    pub fn show(&mut self, code: ClassCode) -> bool {
        self.hidden.remove(&code)
    }

    pub fn set_min_size(&mut self, k: usize) {
        self.min_class_size = k;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        self.hidden.is_empty() && self.min_class_size == 0
    }

    /// Classes removed by the size threshold, given per-class totals over the
    /// whole table.
    pub fn undersized_classes(&self, table: &SampleTable) -> HashSet<ClassCode> {
        let k = self.min_class_size;
        if k == 0 {
            return HashSet::new();
        }
        let counts = table.class_counts();
        if k >= counts.len() {
            return HashSet::new();
        }
        let mut sizes: Vec<usize> = counts.values().copied().collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        let threshold = sizes[k - 1];
        counts
            .iter()
            .filter(|(_, n)| **n < threshold)
            .map(|(code, _)| *code)
            .collect()
    }

    /// Rows of `table` containing no hidden or undersized class in any period.
    pub fn apply(&self, table: &SampleTable) -> SampleTable {
        if self.is_default() {
            return table.clone();
        }
        let mut excluded = self.undersized_classes(table);
        excluded.extend(self.hidden.iter().copied());
        table.exclude_classes(&excluded)
    }
}
