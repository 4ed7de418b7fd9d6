//! Relationship graph construction.
//!
//! Builds the undirected weighted term graph from glossary references: one
//! node per term in glossary order (isolated terms included), one edge per
//! related pair. Self-references, repeats and unknown targets never become
//! edges; they are counted on the run context.

use std::collections::HashMap;

use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::{Graph, Undirected};
use serde::{Deserialize, Serialize};

use crate::core::config::EdgeWeighting;
use crate::core::errors::{GlossaError, Result};
use crate::core::glossary::Glossary;
use crate::core::partition::Partition;
use crate::core::run_context::RunContext;

/// Undirected term graph with f64 edge weights
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    /// Node weights are term identifiers
    graph: Graph<String, f64, Undirected>,

    /// Map from term identifier to node index
    term_to_node: HashMap<String, NodeIndex>,

    /// Policy the weights were built with
    weighting: EdgeWeighting,
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub total_weight: f64,
    pub isolated_nodes: usize,
    pub edge_weighting: EdgeWeighting,
    pub unresolved_references: usize,
    pub self_references: usize,
    pub duplicate_references: usize,
}

impl RelationshipGraph {
    /// Build the graph for a glossary.
    ///
    /// With `strict_references`, a reference to an unknown term is an input
    /// error; otherwise it is dropped and counted.
    pub fn build(
        glossary: &Glossary,
        weighting: EdgeWeighting,
        strict_references: bool,
        ctx: &mut RunContext,
    ) -> Result<Self> {
        let resolution = glossary.resolve_references(strict_references)?;

        let mut graph = Graph::with_capacity(glossary.len(), glossary.len());
        let mut term_to_node = HashMap::with_capacity(glossary.len());
        for id in glossary.ids() {
            let node = graph.add_node(id.to_string());
            term_to_node.insert(id.to_string(), node);
        }

        let mut built = Self {
            graph,
            term_to_node,
            weighting,
        };

        for (source, targets) in &resolution.resolved {
            for target in targets {
                built.add_reference(source, target)?;
            }
        }

        for unresolved in &resolution.unresolved {
            tracing::warn!(
                "Dropping reference from '{}' to unknown term '{}'",
                unresolved.from,
                unresolved.target
            );
        }

        let isolated = built.isolated_nodes();
        if isolated > 0 {
            tracing::warn!("{} terms have no relations and form singleton clusters", isolated);
        }

        ctx.record_reference_issues(
            resolution.unresolved.len(),
            resolution.self_references,
            resolution.duplicate_references,
        );
        ctx.record_isolated_terms(isolated);

        ctx.log_param("graph.edge_weighting", weighting.as_str());
        ctx.log_metric("graph.nodes", built.node_count() as f64);
        ctx.log_metric("graph.edges", built.edge_count() as f64);

        tracing::info!(
            "Built relationship graph with {} nodes and {} edges ({} weighting)",
            built.node_count(),
            built.edge_count(),
            weighting
        );

        Ok(built)
    }

    /// Add one resolved directed reference as undirected weight
    fn add_reference(&mut self, source: &str, target: &str) -> Result<()> {
        let source_node = self.node_or_err(source)?;
        let target_node = self.node_or_err(target)?;
        if source_node == target_node {
            return Ok(());
        }

        match self.graph.find_edge(source_node, target_node) {
            Some(edge) => {
                if self.weighting == EdgeWeighting::ReferenceCount {
                    let weight = self
                        .graph
                        .edge_weight_mut(edge)
                        .ok_or_else(|| GlossaError::graph("Failed to get edge weight"))?;
                    *weight += 1.0;
                }
            }
            None => {
                self.graph.add_edge(source_node, target_node, 1.0);
            }
        }
        Ok(())
    }

    fn node_or_err(&self, id: &str) -> Result<NodeIndex> {
        self.term_to_node.get(id).copied().ok_or_else(|| GlossaError::Graph {
            message: "reference endpoint is not a node".to_string(),
            element: Some(id.to_string()),
        })
    }

    /// Get the underlying petgraph
    pub fn graph(&self) -> &Graph<String, f64, Undirected> {
        &self.graph
    }

    pub fn weighting(&self) -> EdgeWeighting {
        self.weighting
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Term identifiers in node order (same as glossary order)
    pub fn term_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Get term identifier for node index
    pub fn term_id(&self, node: NodeIndex) -> Option<&str> {
        self.graph.node_weight(node).map(String::as_str)
    }

    /// Get node index for term identifier
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.term_to_node.get(id).copied()
    }

    /// Get edge weight between two terms
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let a = self.node_index(a)?;
        let b = self.node_index(b)?;
        self.graph
            .find_edge(a, b)
            .and_then(|edge| self.graph.edge_weight(edge).copied())
    }

    /// Neighbours of a term with their edge weights
    pub fn neighbors(&self, id: &str) -> Vec<(&str, f64)> {
        match self.node_index(id) {
            Some(node) => self
                .graph
                .edges(node)
                .map(|edge| {
                    let other = if edge.source() == node {
                        edge.target()
                    } else {
                        edge.source()
                    };
                    (self.graph[other].as_str(), *edge.weight())
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Number of nodes without edges
    pub fn isolated_nodes(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&node| self.graph.edges(node).next().is_none())
            .count()
    }

    /// Sum of all edge weights
    pub fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// Whether any edge connects a node to itself
    pub fn has_self_loops(&self) -> bool {
        self.graph
            .edge_references()
            .any(|edge| edge.source() == edge.target())
    }

    /// Summary statistics, including the diagnostics recorded at build time
    pub fn stats(&self, ctx: &RunContext) -> GraphStats {
        let diagnostics = ctx.diagnostics();
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            total_weight: self.total_weight(),
            isolated_nodes: self.isolated_nodes(),
            edge_weighting: self.weighting,
            unresolved_references: diagnostics.unresolved_references,
            self_references: diagnostics.self_references,
            duplicate_references: diagnostics.duplicate_references,
        }
    }

    /// Graphviz DOT export; nodes carry their cluster as a fill colour when a
    /// partition is given
    pub fn to_dot(&self, partition: Option<&Partition>) -> String {
        let edge_attrs = |_: &Graph<String, f64, Undirected>,
                          edge: petgraph::graph::EdgeReference<'_, f64>| {
            format!("penwidth={}", edge.weight())
        };
        let node_attrs = |_: &Graph<String, f64, Undirected>, (_, id): (NodeIndex, &String)| match partition.and_then(|p| p.label_of(id)) {
            Some(label) => format!(
                "style=filled, colorscheme=set312, fillcolor={}",
                label % 12 + 1
            ),
            None => String::new(),
        };
        let dot = Dot::with_attr_getters(&self.graph, &[], &edge_attrs, &node_attrs);
        format!("{dot}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::glossary::Term;

    fn glossary(entries: &[(&str, &[&str])]) -> Glossary {
        Glossary::from_terms(entries.iter().map(|(id, refs)| {
            Term::new(*id, *id, format!("definition of {id}")).with_references(refs.iter().copied())
        }))
        .unwrap()
    }

    fn build(glossary: &Glossary, weighting: EdgeWeighting) -> (RelationshipGraph, RunContext) {
        let mut ctx = RunContext::new("graph-test");
        let graph = RelationshipGraph::build(glossary, weighting, false, &mut ctx).unwrap();
        (graph, ctx)
    }

    #[test]
    fn mutual_references_form_single_edge() {
        let g = glossary(&[("A", &["B"]), ("B", &["A"]), ("C", &[]), ("D", &[])]);
        let (graph, ctx) = build(&g, EdgeWeighting::Binary);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight("A", "B"), Some(1.0));
        assert!(graph.neighbors("C").is_empty());
        assert!(graph.neighbors("D").is_empty());
        assert_eq!(graph.isolated_nodes(), 2);
        assert_eq!(ctx.diagnostics().isolated_terms, 2);
    }

    #[test]
    fn reference_count_accumulates_weight() {
        let g = glossary(&[("A", &["B"]), ("B", &["A"]), ("C", &["A"])]);
        let (graph, _) = build(&g, EdgeWeighting::ReferenceCount);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_weight("A", "B"), Some(2.0));
        assert_eq!(graph.edge_weight("B", "A"), Some(2.0));
        assert_eq!(graph.edge_weight("A", "C"), Some(1.0));
        assert_eq!(graph.total_weight(), 3.0);
    }

    #[test]
    fn repeated_references_do_not_inflate_weight() {
        let g = glossary(&[("A", &["B", "B", "B"]), ("B", &[])]);
        let (graph, ctx) = build(&g, EdgeWeighting::ReferenceCount);

        assert_eq!(graph.edge_weight("A", "B"), Some(1.0));
        assert_eq!(ctx.diagnostics().duplicate_references, 2);
    }

    #[test]
    fn self_references_are_ignored() {
        let g = glossary(&[("A", &["A"]), ("B", &["B", "A"])]);
        let (graph, ctx) = build(&g, EdgeWeighting::Binary);

        assert!(!graph.has_self_loops());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(ctx.diagnostics().self_references, 2);
    }

    #[test]
    fn unresolved_references_are_dropped_and_counted() {
        let g = glossary(&[("A", &["ghost", "B"]), ("B", &["phantom"])]);
        let (graph, ctx) = build(&g, EdgeWeighting::Binary);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(ctx.diagnostics().unresolved_references, 2);
        assert_eq!(graph.stats(&ctx).unresolved_references, 2);
    }

    #[test]
    fn strict_mode_rejects_unresolved_references() {
        let g = glossary(&[("A", &["ghost"])]);
        let mut ctx = RunContext::new("strict");
        let err = RelationshipGraph::build(&g, EdgeWeighting::Binary, true, &mut ctx).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn nodes_follow_glossary_order() {
        let g = glossary(&[("zeta", &[]), ("alpha", &["zeta"]), ("mid", &[])]);
        let (graph, _) = build(&g, EdgeWeighting::Binary);

        let ids: Vec<_> = graph.term_ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(graph.neighbors("zeta"), vec![("alpha", 1.0)]);
    }

    #[test]
    fn stats_and_params_are_recorded() {
        let g = glossary(&[("A", &["B"]), ("B", &[]), ("C", &[])]);
        let (graph, ctx) = build(&g, EdgeWeighting::Binary);
        let stats = graph.stats(&ctx);

        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.isolated_nodes, 1);
        assert_eq!(ctx.metric("graph.nodes"), Some(3.0));
        assert_eq!(
            ctx.param("graph.edge_weighting"),
            Some(&serde_json::json!("binary"))
        );
    }

    #[test]
    fn dot_export_mentions_terms_and_clusters() {
        let g = glossary(&[("A", &["B"]), ("B", &[])]);
        let (graph, _) = build(&g, EdgeWeighting::Binary);
        let partition = Partition::from_labels(["A", "B"], &[0, 0]).unwrap();

        let dot = graph.to_dot(Some(&partition));
        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("\"A\""));
        assert!(dot.contains("fillcolor=1"));
    }
}
