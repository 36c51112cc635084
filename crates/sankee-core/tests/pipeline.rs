use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use approx::assert_relative_eq;
use sankee_core::sampling::ExtractRequest;
use sankee_core::{
    aggregate, index, ClassCatalog, ClassCode, CompatibilityError, ConfigurationError, PixelService, Region,
    SampleTable, SankeeError, SankeyPlot, SankifyConfig, ServiceError,
};

fn catalog() -> ClassCatalog {
    ClassCatalog::from_classes([
        (1, "A", "#efff6b"),
        (2, "B", "#ff2ff8"),
        (3, "C", "#1b9d0c"),
        (4, "D", "#a1a1a1"),
    ])
    .unwrap()
}

fn two_period_table() -> SampleTable {
    SampleTable::from_columns(vec![
        ("start", vec![1, 1, 1, 2, 2, 4]),
        ("end", vec![1, 1, 1, 2, 3, 4]),
    ])
    .unwrap()
}

fn edge_set(plot: &SankeyPlot) -> Vec<(String, String, ClassCode, ClassCode, usize)> {
    plot.diagram()
        .links
        .iter()
        .map(|l| {
            let e = &l.edge;
            (e.source_period.clone(), e.target_period.clone(), e.source_class, e.target_class, e.count)
        })
        .collect()
}

#[test]
fn two_period_edges_and_link_labels() {
    let edges = aggregate(&two_period_table());
    let got: Vec<(ClassCode, ClassCode, usize)> =
        edges.iter().map(|e| (e.source_class, e.target_class, e.count)).collect();
    assert_eq!(got, vec![(1, 1, 3), (2, 2, 1), (2, 3, 1), (4, 4, 1)]);
    let props: Vec<f64> = edges.iter().map(|e| e.proportion).collect();
    for (p, want) in props.iter().zip([1.0, 0.5, 0.5, 1.0]) {
        assert_relative_eq!(*p, want);
    }

    let plot = SankeyPlot::new(two_period_table(), &catalog(), &SankifyConfig::default()).unwrap();
    assert_eq!(
        plot.parameters().link_hover,
        vec![
            "100% of A remained A",
            "50% of B remained B",
            "50% of B became C",
            "100% of D remained D",
        ]
    );
}

#[test]
fn three_period_nodes_chain_without_leakage() {
    let table = SampleTable::from_columns(vec![
        ("start", vec![1, 1, 2, 2]),
        ("mid", vec![1, 2, 2, 2]),
        ("end", vec![2, 2, 2, 1]),
    ])
    .unwrap();
    let edges = aggregate(&table);
    let idx = index(&edges, &table);

    let ids: HashMap<(&str, ClassCode), usize> =
        idx.nodes.iter().map(|n| ((n.period.as_str(), n.class_code), n.id)).collect();
    assert_eq!(ids.len(), 6);
    assert_ne!(ids[&("start", 1)], ids[&("mid", 1)]);
    assert_ne!(ids[&("start", 2)], ids[&("mid", 2)]);

    for e in &idx.edges {
        let pair = (e.edge.source_period.as_str(), e.edge.target_period.as_str());
        assert!(pair == ("start", "mid") || pair == ("mid", "end"), "{pair:?}");
        assert_eq!(idx.nodes[e.source].period, e.edge.source_period);
        assert_eq!(idx.nodes[e.target].period, e.edge.target_period);
    }

    // Largest node first: mid/2 has three rows.
    assert_eq!((idx.nodes[0].period.as_str(), idx.nodes[0].class_code), ("mid", 2));
}

#[test]
fn proportions_sum_to_one() {
    let table = SampleTable::from_columns(vec![
        ("a", vec![1, 1, 2, 2, 2, 3, 3]),
        ("b", vec![1, 2, 2, 3, 1, 3, 3]),
        ("c", vec![3, 3, 1, 1, 2, 2, 1]),
    ])
    .unwrap();
    let mut sums: HashMap<(String, ClassCode), f64> = HashMap::new();
    for e in aggregate(&table) {
        *sums.entry((e.source_period.clone(), e.source_class)).or_insert(0.0) += e.proportion;
    }
    for total in sums.values() {
        assert_relative_eq!(*total, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn node_count_matches_distinct_pairs() {
    let table = two_period_table();
    let plot = SankeyPlot::new(table.clone(), &catalog(), &SankifyConfig::default()).unwrap();
    let mut pairs = BTreeSet::new();
    for row in table.rows() {
        for (p, v) in row.iter().enumerate() {
            if let Some(c) = v {
                pairs.insert((p, *c));
            }
        }
    }
    assert_eq!(plot.diagram().nodes.len(), pairs.len());
}

#[test]
fn unlabeled_class_is_incompatible() {
    let table = SampleTable::from_columns(vec![("start", vec![1, 9, 2]), ("end", vec![1, 1, 4])]).unwrap();
    let err = SankeyPlot::new(table, &catalog(), &SankifyConfig::default()).unwrap_err();
    assert_eq!(
        err,
        SankeeError::Compatibility(CompatibilityError::new(vec![9], vec![9]))
    );
    assert!(err.to_string().contains('9'));
}

/// Counts calls; panics if extraction is ever attempted.
struct NeverCalled {
    calls: Cell<usize>,
}

impl PixelService for NeverCalled {
    type Image = ();

    fn extract(&self, _request: &ExtractRequest<'_, ()>) -> Result<Vec<Vec<Option<ClassCode>>>, ServiceError> {
        self.calls.set(self.calls.get() + 1);
        Err(ServiceError::Transport("should not be reached".into()))
    }

    fn band_names(&self, _image: &()) -> Result<Vec<String>, ServiceError> {
        Ok(vec![])
    }
}

#[test]
fn duplicate_periods_rejected_before_sampling() {
    let service = NeverCalled { calls: Cell::new(0) };
    let region = Region::Polygon {
        coordinates: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
    };
    let labels = vec!["2001".to_string(), "2001".to_string()];
    let err = sankee_core::sankify(
        &service,
        &[(), ()],
        Some(&labels[..]),
        "lc",
        &catalog(),
        Some(&region),
        &SankifyConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SankeeError::Configuration(ConfigurationError::DuplicatePeriods(_))));
    assert_eq!(service.calls.get(), 0);
}

#[test]
fn hide_show_reset_restores_edges() {
    let mut plot = SankeyPlot::new(two_period_table(), &catalog(), &SankifyConfig::default()).unwrap();
    let full = edge_set(&plot);

    plot.hide(2).unwrap();
    let hidden: Vec<(ClassCode, ClassCode, usize)> =
        edge_set(&plot).into_iter().map(|(_, _, s, t, c)| (s, t, c)).collect();
    assert_eq!(hidden, vec![(1, 1, 3), (4, 4, 1)]);

    plot.show(2).unwrap();
    plot.reset().unwrap();
    assert_eq!(edge_set(&plot), full);
}

#[test]
fn reset_is_identity_after_any_sequence() {
    let mut plot = SankeyPlot::new(two_period_table(), &catalog(), &SankifyConfig::default()).unwrap();
    let nodes = plot.diagram().nodes.clone();
    let full = edge_set(&plot);

    plot.set_min_size(2).unwrap();
    plot.hide(1).unwrap();
    plot.hide(3).unwrap();
    plot.show(1).unwrap();
    plot.set_min_size(1).unwrap();
    plot.reset().unwrap();

    assert_eq!(plot.diagram().nodes, nodes);
    assert_eq!(edge_set(&plot), full);
    assert_eq!(plot.filtered_table(), plot.base_table());
}

#[test]
fn merging_matches_pre_merged_table() {
    // 5 shares a label and color with 2.
    let catalog = ClassCatalog::from_classes([
        (1, "A", "#efff6b"),
        (2, "B", "#ff2ff8"),
        (3, "C", "#1b9d0c"),
        (4, "D", "#a1a1a1"),
        (5, "B", "#ff2ff8"),
    ])
    .unwrap();
    let raw = SampleTable::from_columns(vec![
        ("start", vec![1, 5, 1, 2, 5, 4]),
        ("end", vec![1, 1, 1, 2, 3, 5]),
    ])
    .unwrap();
    let pre_merged = SampleTable::from_columns(vec![
        ("start", vec![1, 2, 1, 2, 2, 4]),
        ("end", vec![1, 1, 1, 2, 3, 2]),
    ])
    .unwrap();

    let merged = SankeyPlot::new(raw, &catalog, &SankifyConfig::default()).unwrap();
    let reference = SankeyPlot::new(pre_merged, &catalog, &SankifyConfig::default()).unwrap();
    assert_eq!(edge_set(&merged), edge_set(&reference));
    assert_eq!(merged.parameters(), reference.parameters());
}

#[test]
fn retained_partial_rows_keep_every_node() {
    let table = SampleTable::new(
        vec!["start".into(), "mid".into(), "end".into()],
        vec![vec![Some(1), Some(1), Some(1)], vec![None, Some(3), None]],
    )
    .unwrap();
    let plot = SankeyPlot::new(table.clone(), &catalog(), &SankifyConfig::default()).unwrap();
    assert_eq!(plot.diagram().nodes.len(), table.period_class_counts().len());
    assert_eq!(plot.diagram().links.len(), 2);
}
