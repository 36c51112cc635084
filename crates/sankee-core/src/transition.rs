//! Transition aggregation: count the (source class, target class)
//! combinations between every pair of adjacent periods.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::table::{ClassCode, SampleTable};

/// One flow between a class in one period and a class in the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionEdge {
    pub source_period: String,
    pub target_period: String,
    pub source_class: ClassCode,
    pub target_class: ClassCode,
    /// Sample points making this transition.
    pub count: usize,
    /// Sample points with `source_class` in `source_period` and a valid target value.
    pub total: usize,
    /// `count / total`.
    pub proportion: f64,
}

impl TransitionEdge {
    pub fn is_persistence(&self) -> bool {
        self.source_class == self.target_class
    }
}

/// Aggregate every adjacent column pair of `table`, concatenated in
/// chronological order. Within a pair, edges are ordered by source class then
/// target class.
///
/// Rows missing a value in either column of a pair are skipped for that pair.
pub fn aggregate(table: &SampleTable) -> Vec<TransitionEdge> {
    let n_pairs = table.n_periods().saturating_sub(1);

    #[cfg(feature = "threading")]
    let per_pair: Vec<Vec<TransitionEdge>> = {
        use rayon::prelude::*;
        (0..n_pairs).into_par_iter().map(|i| aggregate_pair(table, i)).collect()
    };
    #[cfg(not(feature = "threading"))]
    let per_pair: Vec<Vec<TransitionEdge>> = (0..n_pairs).map(|i| aggregate_pair(table, i)).collect();

    let edges: Vec<TransitionEdge> = per_pair.into_iter().flatten().collect();
    debug!(pairs = n_pairs, edges = edges.len(), "aggregated transitions");
    edges
}

/// Aggregate columns `i` and `i + 1`.
pub fn aggregate_pair(table: &SampleTable, i: usize) -> Vec<TransitionEdge> {
    let mut counts: BTreeMap<(ClassCode, ClassCode), usize> = BTreeMap::new();
    let mut totals: BTreeMap<ClassCode, usize> = BTreeMap::new();

    for row in table.rows() {
        if let (Some(src), Some(dst)) = (row[i], row[i + 1]) {
            *counts.entry((src, dst)).or_insert(0) += 1;
            *totals.entry(src).or_insert(0) += 1;
        }
    }

    let source_period = &table.periods()[i];
    let target_period = &table.periods()[i + 1];
    counts
        .into_iter()
        .map(|((src, dst), count)| {
            // Every source in `counts` was observed at least once, so total > 0.
            let total = totals[&src];
            TransitionEdge {
                source_period: source_period.clone(),
                target_period: target_period.clone(),
                source_class: src,
                target_class: dst,
                count,
                total,
                proportion: count as f64 / total as f64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use approx::assert_relative_eq;

    fn two_period_table() -> SampleTable {
        SampleTable::from_columns(vec![
            ("start", vec![1, 1, 1, 2, 2, 4]),
            ("end", vec![1, 1, 1, 2, 3, 4]),
        ])
        .unwrap()
    }

    fn summary(edges: &[TransitionEdge]) -> Vec<(ClassCode, ClassCode, usize, f64)> {
        edges
            .iter()
            .map(|e| (e.source_class, e.target_class, e.count, e.proportion))
            .collect()
    }

    #[test]
    fn two_period_counts_and_proportions() {
        let edges = aggregate(&two_period_table());
        assert_eq!(
            summary(&edges),
            vec![(1, 1, 3, 1.0), (2, 2, 1, 0.5), (2, 3, 1, 0.5), (4, 4, 1, 1.0)]
        );
        assert!(edges.iter().all(|e| e.source_period == "start" && e.target_period == "end"));
        assert_eq!(edges[1].total, 2);
    }

    #[test]
    fn proportions_sum_to_one_per_source() {
        let table = SampleTable::from_columns(vec![
            ("a", vec![1, 1, 2, 2, 2, 3, 3, 3, 3]),
            ("b", vec![1, 2, 2, 3, 1, 3, 3, 1, 2]),
            ("c", vec![3, 3, 3, 1, 1, 2, 2, 2, 1]),
        ])
        .unwrap();
        let edges = aggregate(&table);
        let mut sums: HashMap<(String, ClassCode), f64> = HashMap::new();
        for e in &edges {
            *sums.entry((e.source_period.clone(), e.source_class)).or_insert(0.0) += e.proportion;
        }
        for sum in sums.values() {
            assert_relative_eq!(*sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn pairs_do_not_leak_across_periods() {
        let table = SampleTable::from_columns(vec![
            ("start", vec![1, 2]),
            ("mid", vec![2, 2]),
            ("end", vec![3, 3]),
        ])
        .unwrap();
        let edges = aggregate(&table);
        assert_eq!(edges.len(), 3);
        assert_eq!((edges[0].source_period.as_str(), edges[0].target_period.as_str()), ("start", "mid"));
        assert_eq!((edges[2].source_period.as_str(), edges[2].target_period.as_str()), ("mid", "end"));
        assert_eq!(edges[2].count, 2);
    }

    #[test]
    fn missing_values_skip_only_their_pair() {
        let table = SampleTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![Some(1), None, Some(1)], vec![Some(1), Some(1), Some(1)]],
        )
        .unwrap();
        let edges = aggregate(&table);
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.count == 1 && e.total == 1));
    }

    #[test]
    fn empty_table_yields_no_edges() {
        let table = two_period_table().retain_rows(|_| false);
        assert!(aggregate(&table).is_empty());
    }

    #[cfg(feature = "threading")]
    #[test]
    fn parallel_aggregation_matches_pairwise() {
        let table = SampleTable::from_columns(vec![
            ("a", vec![1, 2, 3, 3, 1, 2]),
            ("b", vec![2, 2, 3, 1, 1, 1]),
            ("c", vec![5, 2, 3, 1, 2, 2]),
            ("d", vec![5, 5, 3, 1, 2, 1]),
        ])
        .unwrap();
        let pairwise: Vec<TransitionEdge> = (0..table.n_periods() - 1)
            .flat_map(|i| aggregate_pair(&table, i))
            .collect();
        assert_eq!(aggregate(&table), pairwise);
        assert_eq!(aggregate(&table).first().map(|e| e.source_period.as_str()), Some("a"));
        assert_eq!(aggregate(&table).last().map(|e| e.source_period.as_str()), Some("c"));
    }
}
