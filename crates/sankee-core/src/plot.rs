//! The interactive Sankey plot: a merged sample table, a filter state, and the
//! diagram derived from the rows the filter retains.
//!
//! Every filter transition derives a complete new [`Diagram`] before touching
//! `self`, then swaps it in with one assignment. Subscribers never see a mix of
//! old links and new nodes.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::catalog::{check_compatible, ClassCatalog, ClassMerge};
use crate::config::SankifyConfig;
use crate::error::{CompatibilityError, SankeeResult};
use crate::filter::FilterState;
use crate::labels::{describe, resolve_nodes, LabelType, NodeEntry};
use crate::nodes::index;
use crate::table::{ClassCode, SampleTable};
use crate::theme::Theme;
use crate::transition::{aggregate, TransitionEdge};

/// A flow between two indexed nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    /// Number of sample points making the transition.
    pub value: usize,
    /// Color of the source class.
    pub color: String,
    /// Hover text, e.g. `"50% of B became C"`.
    pub label: String,
    pub edge: TransitionEdge,
}

/// Nodes and links derived from one table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Diagram {
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<Link>,
}

impl Diagram {
    /// Aggregate, index and label `table`. An empty table gives an empty diagram.
    pub fn build(table: &SampleTable, catalog: &ClassCatalog, label_type: LabelType) -> Result<Self, CompatibilityError> {
        let edges = aggregate(table);
        let idx = index(&edges, table);
        let nodes = resolve_nodes(&idx.nodes, table, catalog, label_type)?;

        let mut links = Vec::with_capacity(idx.edges.len());
        for e in idx.edges {
            let color = catalog
                .color(e.edge.source_class)
                .ok_or_else(|| CompatibilityError::new(vec![], vec![e.edge.source_class]))?
                .to_string();
            links.push(Link {
                source: e.source,
                target: e.target,
                value: e.edge.count,
                color,
                label: describe(&e.edge, catalog)?,
                edge: e.edge,
            });
        }
        debug!(nodes = nodes.len(), links = links.len(), "built diagram");
        Ok(Self { nodes, links })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

/// Parallel vectors in the shape sankey renderers consume.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SankeyParameters {
    pub node_labels: Vec<String>,
    pub node_colors: Vec<String>,
    pub node_hover: Vec<String>,
    pub link_sources: Vec<usize>,
    pub link_targets: Vec<usize>,
    pub link_values: Vec<usize>,
    pub link_colors: Vec<String>,
    pub link_hover: Vec<String>,
}

impl From<&Diagram> for SankeyParameters {
    fn from(d: &Diagram) -> Self {
        Self {
            node_labels: d.nodes.iter().map(|n| n.label.clone()).collect(),
            node_colors: d.nodes.iter().map(|n| n.color.clone()).collect(),
            node_hover: d.nodes.iter().map(|n| n.period.clone()).collect(),
            link_sources: d.links.iter().map(|l| l.source).collect(),
            link_targets: d.links.iter().map(|l| l.target).collect(),
            link_values: d.links.iter().map(|l| l.value).collect(),
            link_colors: d.links.iter().map(|l| l.color.clone()).collect(),
            link_hover: d.links.iter().map(|l| l.label.clone()).collect(),
        }
    }
}

pub type Subscriber = Box<dyn FnMut(&Diagram)>;

pub struct SankeyPlot {
    base: SampleTable,
    merge: ClassMerge,
    filter: FilterState,
    filtered: SampleTable,
    diagram: Diagram,
    title: Option<String>,
    theme: Theme,
    label_type: LabelType,
    layout: Map<String, Value>,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for SankeyPlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SankeyPlot")
            .field("periods", &self.base.periods())
            .field("rows", &self.base.n_rows())
            .field("filter", &self.filter)
            .field("nodes", &self.diagram.nodes.len())
            .field("links", &self.diagram.links.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SankeyPlot {
    /// Check `table` against `catalog`, merge classes sharing a label and
    /// color, and derive the initial diagram.
    ///
    /// The initial size threshold is `config.max_classes`.
    pub fn new(table: SampleTable, catalog: &ClassCatalog, config: &SankifyConfig) -> SankeeResult<Self> {
        check_compatible(&table, catalog)?;
        let theme = Theme::load(&config.theme)?;
        let merge = catalog.merge_plan();
        let base = merge.apply(&table);

        let mut filter = FilterState::new();
        filter.set_min_size(config.max_classes.unwrap_or(0));
        let filtered = filter.apply(&base);
        let diagram = Diagram::build(&filtered, merge.catalog(), config.label_type)?;

        info!(
            rows = base.n_rows(),
            kept = filtered.n_rows(),
            nodes = diagram.nodes.len(),
            links = diagram.links.len(),
            "sankey plot ready"
        );
        Ok(Self {
            base,
            merge,
            filter,
            filtered,
            diagram,
            title: config.title.clone(),
            theme,
            label_type: config.label_type,
            layout: Map::new(),
            subscribers: Vec::new(),
        })
    }

    // ── Filter transitions ─────────────────────────────────────────────────

    /// Hide every row containing `code` (or the class it was merged into).
    /// Returns whether the filter changed.
    pub fn hide(&mut self, code: ClassCode) -> SankeeResult<bool> {
        let code = self.merge.canonical(code);
        if !self.base.classes().contains(&code) {
            warn!(code, "hiding a class that was not sampled");
        }
        let mut next = self.filter.clone();
        let changed = next.hide(code);
        self.transition(next, changed)
    }

    pub fn show(&mut self, code: ClassCode) -> SankeeResult<bool> {
        let code = self.merge.canonical(code);
        let mut next = self.filter.clone();
        let changed = next.show(code);
        self.transition(next, changed)
    }

    /// Keep only classes at least as large as the k-th largest; 0 disables.
    pub fn set_min_size(&mut self, k: usize) -> SankeeResult<bool> {
        let mut next = self.filter.clone();
        let changed = next.min_class_size() != k;
        next.set_min_size(k);
        self.transition(next, changed)
    }

    /// Clear hidden classes and the size threshold.
    pub fn reset(&mut self) -> SankeeResult<bool> {
        let changed = !self.filter.is_default();
        self.transition(FilterState::new(), changed)
    }

    fn transition(&mut self, next: FilterState, changed: bool) -> SankeeResult<bool> {
        if !changed {
            return Ok(false);
        }
        let filtered = next.apply(&self.base);
        let diagram = Diagram::build(&filtered, self.merge.catalog(), self.label_type)?;
        debug!(
            hidden = ?next.hidden(),
            min_class_size = next.min_class_size(),
            rows = filtered.n_rows(),
            "filter updated"
        );

        self.filter = next;
        self.filtered = filtered;
        self.diagram = diagram;

        for notify in &mut self.subscribers {
            notify(&self.diagram);
        }
        Ok(true)
    }

    /// Register a callback invoked with the new diagram after every change.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Diagram) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn parameters(&self) -> SankeyParameters {
        SankeyParameters::from(&self.diagram)
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Rows currently retained by the filter.
    pub fn filtered_table(&self) -> &SampleTable {
        &self.filtered
    }

    /// All sampled rows, after class merging.
    pub fn base_table(&self) -> &SampleTable {
        &self.base
    }

    pub fn catalog(&self) -> &ClassCatalog {
        self.merge.catalog()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Classes by total sample count, largest first. Ties by first appearance.
    pub fn sorted_classes(&self) -> Vec<ClassCode> {
        let mut counts: Vec<(ClassCode, usize)> = self.base.class_counts().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().map(|(c, _)| c).collect()
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    /// Merge cosmetic overrides into the figure layout. Nested objects are
    /// merged key by key; anything else replaces the existing value. Non-object
    /// updates are ignored.
    pub fn update_layout(&mut self, update: Value) -> &mut Self {
        if let Value::Object(map) = update {
            merge_objects(&mut self.layout, map);
        }
        self
    }

    /// Plotly figure JSON for the current diagram.
    pub fn to_figure(&self) -> Value {
        let trace = if self.diagram.is_empty() {
            json!({"type": "sankey"})
        } else {
            let p = self.parameters();
            let mut node = Map::new();
            node.insert("customdata".into(), json!(p.node_hover));
            node.insert("hovertemplate".into(), json!("<b>%{customdata}</b><extra></extra>"));
            node.insert(
                "label".into(),
                json!(p.node_labels.iter().map(|l| self.theme.style_label(l)).collect::<Vec<_>>()),
            );
            node.insert("color".into(), json!(p.node_colors));
            if let Value::Object(extra) = &self.theme.node {
                merge_objects(&mut node, extra.clone());
            }

            let mut link = Map::new();
            link.insert("source".into(), json!(p.link_sources));
            link.insert("target".into(), json!(p.link_targets));
            link.insert("value".into(), json!(p.link_values));
            link.insert("color".into(), json!(p.link_colors));
            link.insert("customdata".into(), json!(p.link_hover));
            link.insert("hovertemplate".into(), json!("%{customdata} <extra></extra>"));
            if let Value::Object(extra) = &self.theme.link {
                merge_objects(&mut link, extra.clone());
            }

            json!({"type": "sankey", "arrangement": "snap", "node": node, "link": link})
        };

        let mut layout = Map::new();
        layout.insert(
            "title".into(),
            json!({"text": self.title.as_deref().map(|t| self.theme.style_title(t)), "x": 0.5}),
        );
        layout.insert("font".into(), json!({"size": 16}));
        layout.insert("paper_bgcolor".into(), json!("rgba(0, 0, 0, 0)"));
        merge_objects(&mut layout, self.layout.clone());

        json!({"data": [trace], "layout": layout})
    }
}

fn merge_objects(target: &mut Map<String, Value>, update: Map<String, Value>) {
    for (key, value) in update {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge_objects(existing, incoming),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

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

    fn plot() -> SankeyPlot {
        SankeyPlot::new(two_period_table(), &catalog(), &SankifyConfig::default()).unwrap()
    }

    #[test]
    fn parameters_follow_node_order() {
        let p = plot().parameters();
        assert_eq!(p.node_labels, vec!["A", "A", "B", "D", "B", "C", "D"]);
        assert_eq!(p.node_hover, vec!["start", "end", "start", "start", "end", "end", "end"]);
        assert_eq!(p.link_sources, vec![0, 2, 2, 3]);
        assert_eq!(p.link_targets, vec![1, 4, 5, 6]);
        assert_eq!(p.link_values, vec![3, 1, 1, 1]);
        assert_eq!(p.link_colors[1], "#ff2ff8");
        assert_eq!(p.link_hover[2], "50% of B became C");
    }

    #[test]
    fn hide_and_show_rederive() {
        let mut plot = plot();
        assert!(plot.hide(2).unwrap());
        assert!(!plot.hide(2).unwrap());
        let values: Vec<usize> = plot.diagram().links.iter().map(|l| l.value).collect();
        assert_eq!(values, vec![3, 1]);
        assert_eq!(plot.filtered_table().n_rows(), 4);
        assert_eq!(plot.base_table().n_rows(), 6);

        assert!(plot.show(2).unwrap());
        assert_eq!(plot.diagram().links.len(), 4);
    }

    #[test]
    fn subscribers_see_complete_diagrams() {
        let mut plot = plot();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        plot.subscribe(move |d| {
            // Every link must reference an existing node.
            let n = d.nodes.len();
            assert!(d.links.iter().all(|l| l.source < n && l.target < n));
            sink.borrow_mut().push((d.nodes.len(), d.links.len()));
        });
        plot.hide(1).unwrap();
        plot.set_min_size(1).unwrap();
        plot.reset().unwrap();
        plot.reset().unwrap();
        // The threshold of 1 keeps only class 1, which is hidden, so nothing remains.
        assert_eq!(*seen.borrow(), vec![(5, 3), (0, 0), (7, 4)]);
    }

    #[test]
    fn empty_after_hiding_everything() {
        let mut plot = plot();
        for c in [1, 2, 3, 4] {
            plot.hide(c).unwrap();
        }
        assert!(plot.diagram().is_empty());
        let fig = plot.to_figure();
        assert_eq!(fig["data"][0], json!({"type": "sankey"}));
    }

    #[test]
    fn merged_codes_hide_their_survivor() {
        let catalog = ClassCatalog::from_classes([
            (1, "A", "#efff6b"),
            (2, "B", "#ff2ff8"),
            (3, "C", "#1b9d0c"),
            (4, "A", "#efff6b"),
        ])
        .unwrap();
        let mut plot = SankeyPlot::new(two_period_table(), &catalog, &SankifyConfig::default()).unwrap();
        assert!(!plot.base_table().classes().contains(&4));
        plot.hide(4).unwrap();
        assert!(plot.filter().is_hidden(1));
        assert!(!plot.filtered_table().classes().contains(&1));
    }

    #[test]
    fn max_classes_sets_initial_threshold() {
        let config = SankifyConfig {
            max_classes: Some(2),
            ..Default::default()
        };
        let plot = SankeyPlot::new(two_period_table(), &catalog(), &config).unwrap();
        assert_eq!(plot.filter().min_class_size(), 2);
        assert_eq!(plot.filtered_table().classes().len(), 2);
    }

    #[test]
    fn sorted_classes_by_total() {
        assert_eq!(plot().sorted_classes(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn incompatible_catalog_rejected() {
        let catalog = ClassCatalog::from_classes([(1, "A", "#efff6b"), (2, "B", "#ff2ff8")]).unwrap();
        let err = SankeyPlot::new(two_period_table(), &catalog, &SankifyConfig::default()).unwrap_err();
        assert!(matches!(err, crate::SankeeError::Compatibility(ref e) if e.missing == vec![3, 4]));
    }

    #[test]
    fn figure_applies_theme_and_layout() {
        let config = SankifyConfig {
            title: Some("Land cover".into()),
            theme: "d3".into(),
            ..Default::default()
        };
        let mut plot = SankeyPlot::new(two_period_table(), &catalog(), &config).unwrap();
        plot.update_layout(json!({"width": 800, "font": {"family": "serif"}}));
        let fig = plot.to_figure();

        assert_eq!(fig["data"][0]["node"]["pad"], json!(20));
        assert_eq!(fig["data"][0]["node"]["label"][0], json!("A"));
        assert_eq!(fig["data"][0]["link"]["color"], json!("rgba(120, 120, 120, 0.25)"));
        assert_eq!(fig["layout"]["title"]["text"], json!("Land cover"));
        assert_eq!(fig["layout"]["width"], json!(800));
        assert_eq!(fig["layout"]["font"], json!({"size": 16, "family": "serif"}));
    }
}
