// src/clustering/create_groups.rs
//
// Group formation over the pooled match edges. Edges from all passes build an
// undirected graph whose connected components become duplicate groups, so
// A-B and B-C matches discovered by different passes land A, B and C in one
// group. Components partition the batch: no record belongs to two groups.
use log::{debug, info};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;
use uuid::Uuid;

use crate::matching::MatchEdge;
use crate::models::property::{DuplicateGroup, MatchMethodType, PropertyRecord};

/// Builds duplicate groups from match edges and stamps each grouped record
/// with its group id and the strongest confidence of its incident edges.
pub fn create_groups(records: &mut [PropertyRecord], edges: &[MatchEdge]) -> Vec<DuplicateGroup> {
    if edges.is_empty() {
        return Vec::new();
    }

    let mut graph: UnGraph<usize, f64> = UnGraph::new_undirected();
    let mut index_to_node: HashMap<usize, NodeIndex> = HashMap::new();
    for edge in edges {
        let left = *index_to_node
            .entry(edge.left)
            .or_insert_with(|| graph.add_node(edge.left));
        let right = *index_to_node
            .entry(edge.right)
            .or_insert_with(|| graph.add_node(edge.right));
        graph.add_edge(left, right, edge.confidence);

        for record_idx in [edge.left, edge.right] {
            let record = &mut records[record_idx];
            record.duplicate_confidence = record.duplicate_confidence.max(edge.confidence);
        }
    }

    let component_count = connected_components(&graph);
    info!(
        "Clustering: {} match edges over {} records form {} components.",
        edges.len(),
        graph.node_count(),
        component_count
    );

    let components = extract_components(&graph);
    let mut groups = Vec::with_capacity(components.len());
    for component in components {
        let mut members: Vec<usize> = component.iter().map(|node| graph[*node]).collect();
        members.sort_unstable();

        let group_id = Uuid::new_v4();
        for member in &members {
            records[*member].duplicate_group_id = Some(group_id);
        }

        let (max_confidence, methods) = component_edge_summary(&members, edges);
        debug!(
            "Clustering: Group {} has {} members (max confidence {:.2}).",
            group_id,
            members.len(),
            max_confidence
        );
        groups.push(DuplicateGroup {
            id: group_id,
            members,
            max_confidence,
            methods,
        });
    }
    groups
}

// Depth-first walk collecting node membership per component.
fn extract_components(graph: &UnGraph<usize, f64>) -> Vec<Vec<NodeIndex>> {
    let mut visited: HashMap<NodeIndex, bool> = HashMap::new();
    let mut components = Vec::new();
    for start in graph.node_indices() {
        if visited.get(&start).copied().unwrap_or(false) {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if visited.get(&current).copied().unwrap_or(false) {
                continue;
            }
            visited.insert(current, true);
            component.push(current);
            stack.extend(graph.neighbors(current));
        }
        components.push(component);
    }
    components
}

fn component_edge_summary(
    members: &[usize],
    edges: &[MatchEdge],
) -> (f64, Vec<MatchMethodType>) {
    let mut max_confidence: f64 = 0.0;
    let mut methods: Vec<MatchMethodType> = Vec::new();
    for edge in edges {
        if members.contains(&edge.left) && members.contains(&edge.right) {
            max_confidence = max_confidence.max(edge.confidence);
            if !methods.contains(&edge.method) {
                methods.push(edge.method);
            }
        }
    }
    (max_confidence, methods)
}
