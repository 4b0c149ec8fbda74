use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};

use crate::graph::{EdgeKind, Graph, NodeId};

/// Adds [`EdgeKind::PrecedenceCandidate`] edges in both directions between
/// every pair of operations from different trains that share a resource.
///
/// Edges that already exist are not added again, so running this twice leaves
/// the graph unchanged. Returns the number of edges added. A resource used by
/// `k` operations can produce up to `k * (k - 1)` edges.
pub fn link_conflicts(graph: &mut Graph) -> usize {
    let _p = hprof::enter("link conflicts");

    let new_edges = candidate_edges(graph);
    let added = new_edges.len();
    graph.add_edges(new_edges, EdgeKind::PrecedenceCandidate);
    debug!("Linked {} precedence candidate edges", added);
    added
}

fn candidate_edges(graph: &Graph) -> Vec<(NodeId, NodeId)> {
    let mut groups: BTreeMap<&str, Vec<NodeId>> = BTreeMap::new();
    for (id, node) in graph.nodes() {
        for usage in node.operation.resources.iter() {
            let group = groups.entry(usage.name.as_str()).or_default();
            if group.last() != Some(&id) {
                group.push(id);
            }
        }
    }

    let mut seen: HashSet<(NodeId, NodeId)> = graph
        .edges(Some(EdgeKind::PrecedenceCandidate))
        .map(|e| (e.source, e.target))
        .collect();
    let mut new_edges = Vec::new();
    for (resource, group) in groups.iter() {
        let before = new_edges.len();
        for (i, &a) in group.iter().enumerate() {
            for &b in group[i + 1..].iter() {
                if graph.node(a).train == graph.node(b).train {
                    continue;
                }
                for (s, t) in [(a, b), (b, a)] {
                    if seen.insert((s, t)) {
                        new_edges.push((s, t));
                    }
                }
            }
        }
        trace!(
            "resource {} shared by {} operations, {} new candidate edges",
            resource,
            group.len(),
            new_edges.len() - before
        );
    }
    new_edges
}
