//! Node indexing: give every (period, class) pair a sequential id, largest
//! classes first.
//!
//! Sankey renderers order nodes purely by array position, so ids are handed
//! out in descending order of the number of sample rows showing that class in
//! that period. Ties keep first-appearance order: every edge source in edge
//! order, then every edge target, then any remaining (period, class) values of
//! the table column by column.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::Serialize;

use crate::table::{ClassCode, SampleTable};
use crate::transition::TransitionEdge;

/// A (period, class) node before labels and colors are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeKey {
    pub id: usize,
    pub period: String,
    pub class_code: ClassCode,
    /// Sample rows with this class in this period.
    pub size: usize,
}

/// A transition with its source and target node ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedEdge {
    pub source: usize,
    pub target: usize,
    pub edge: TransitionEdge,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeIndex {
    /// Ordered by id.
    pub nodes: Vec<NodeKey>,
    /// Same order as the input edges.
    pub edges: Vec<IndexedEdge>,
}

impl NodeIndex {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Index the nodes referenced by `edges`, sized by row counts in `table`.
pub fn index(edges: &[TransitionEdge], table: &SampleTable) -> NodeIndex {
    let period_pos: HashMap<&str, usize> = table
        .periods()
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    let sizes = table.period_class_counts();

    let mut seen: IndexSet<(&str, ClassCode)> = IndexSet::new();
    for e in edges {
        seen.insert((e.source_period.as_str(), e.source_class));
    }
    for e in edges {
        seen.insert((e.target_period.as_str(), e.target_class));
    }
    // Values with no valid neighbour in their row (possible when missing
    // values are retained) still get a node.
    for (p, period) in table.periods().iter().enumerate() {
        for code in table.column(p).flatten() {
            seen.insert((period.as_str(), code));
        }
    }

    let size_of = |period: &str, class: ClassCode| -> usize {
        period_pos
            .get(period)
            .and_then(|p| sizes.get(&(*p, class)))
            .copied()
            .unwrap_or(0)
    };

    let mut ordered: Vec<(&str, ClassCode, usize)> =
        seen.iter().map(|&(p, c)| (p, c, size_of(p, c))).collect();
    // Stable: equal sizes keep first-appearance order.
    ordered.sort_by(|a, b| b.2.cmp(&a.2));

    let ids: HashMap<(&str, ClassCode), usize> = ordered
        .iter()
        .enumerate()
        .map(|(id, &(p, c, _))| ((p, c), id))
        .collect();

    let nodes = ordered
        .iter()
        .enumerate()
        .map(|(id, &(p, c, size))| NodeKey {
            id,
            period: p.to_string(),
            class_code: c,
            size,
        })
        .collect();

    let edges = edges
        .iter()
        .map(|e| IndexedEdge {
            source: ids[&(e.source_period.as_str(), e.source_class)],
            target: ids[&(e.target_period.as_str(), e.target_class)],
            edge: e.clone(),
        })
        .collect();

    NodeIndex { nodes, edges }
}
