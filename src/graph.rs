//! Arena-backed directed multigraph of operation nodes.
//!
//! Nodes are stored densely by [`NodeId`]; every edge is stored once and
//! referenced from the outgoing list of its source and the incoming list of
//! its target. Neighbor queries return nodes in edge insertion order.

use std::collections::HashMap;

use derive_more::{Display, From, Into};
use serde::Serialize;
use typed_index_collections::TiVec;

use crate::error::Error;
use crate::problem::{Operation, TrainId};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Into, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, From, Into)]
pub struct EdgeId(usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum EdgeKind {
    /// Within one train: the target may not start before the source finishes.
    Dependency,
    /// Between trains sharing a resource; the order is not decided.
    PrecedenceCandidate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub train: TrainId,
    pub operation: Operation,
}

impl Node {
    pub fn index(&self) -> usize {
        self.operation.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
}

/// A weakly connected set of nodes, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub nodes: Vec<NodeId>,
}

impl Component {
    pub fn trains(&self, graph: &Graph) -> Vec<TrainId> {
        let mut trains = self.nodes.iter().map(|n| graph.node(*n).train).collect::<Vec<_>>();
        trains.sort();
        trains.dedup();
        trains
    }
}

#[derive(Debug, Default, Clone)]
pub struct Graph {
    nodes: TiVec<NodeId, Node>,
    edges: TiVec<EdgeId, Edge>,
    outgoing: TiVec<NodeId, Vec<EdgeId>>,
    incoming: TiVec<NodeId, Vec<EdgeId>>,
    by_train_and_index: HashMap<(TrainId, usize), NodeId>,
    train_nodes: TiVec<TrainId, Vec<NodeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for node in nodes {
            let key = (node.train, node.index());
            while self.train_nodes.len() <= node.train.idx() {
                self.train_nodes.push(Vec::new());
            }
            let train = node.train;
            let id = self.nodes.push_and_get_key(node);
            self.outgoing.push(Vec::new());
            self.incoming.push(Vec::new());
            self.train_nodes[train].push(id);
            self.by_train_and_index.insert(key, id);
            ids.push(id);
        }
        ids
    }

    /// Adds one edge of `kind` for every `(source, target)` pair.
    ///
    /// # Panics
    ///
    /// If either endpoint is not a node of this graph.
    pub fn add_edges(&mut self, pairs: impl IntoIterator<Item = (NodeId, NodeId)>, kind: EdgeKind) {
        let node_count = self.nodes.len();
        for (source, target) in pairs {
            for endpoint in [source, target] {
                assert!(
                    endpoint.0 < node_count,
                    "edge endpoint {} is not a node (graph has {} nodes)",
                    endpoint,
                    node_count
                );
            }
            let id = self.edges.push_and_get_key(Edge {
                source,
                target,
                kind,
            });
            self.outgoing[source].push(id);
            self.incoming[target].push(id);
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter_enumerated()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self, kind: Option<EdgeKind>) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(move |e| kind.map_or(true, |k| e.kind == k))
    }

    pub fn edge_count(&self, kind: Option<EdgeKind>) -> usize {
        self.edges(kind).count()
    }

    pub fn has_edge(&self, source: NodeId, target: NodeId, kind: EdgeKind) -> bool {
        self.outgoing[source].iter().any(|e| {
            let e = &self.edges[*e];
            e.target == target && e.kind == kind
        })
    }

    pub fn node_by_train_and_index(&self, train: TrainId, index: usize) -> Result<NodeId, Error> {
        self.by_train_and_index
            .get(&(train, index))
            .copied()
            .ok_or(Error::NotFound { train, index })
    }

    pub fn trains(&self) -> impl Iterator<Item = TrainId> + '_ {
        self.train_nodes.keys()
    }

    /// Nodes of one train in insertion order; empty for unknown trains.
    pub fn train_nodes(&self, train: TrainId) -> &[NodeId] {
        self.train_nodes.get(train).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors(
        &self,
        node: NodeId,
        direction: Direction,
        kind: Option<EdgeKind>,
    ) -> impl Iterator<Item = NodeId> + '_ {
        let list = match direction {
            Direction::Outgoing => &self.outgoing[node],
            Direction::Incoming => &self.incoming[node],
        };
        list.iter()
            .map(move |e| &self.edges[*e])
            .filter(move |e| kind.map_or(true, |k| e.kind == k))
            .map(move |e| match direction {
                Direction::Outgoing => e.target,
                Direction::Incoming => e.source,
            })
    }

    /// Components ignoring edge direction, ordered by their smallest node id.
    pub fn weakly_connected_components(&self) -> Vec<Component> {
        let mut component_of: TiVec<NodeId, Option<usize>> =
            self.nodes.iter().map(|_| None).collect();
        let mut components = Vec::new();
        let mut stack = Vec::new();

        for start in self.nodes.keys() {
            if component_of[start].is_some() {
                continue;
            }
            let c = components.len();
            let mut members = Vec::new();
            component_of[start] = Some(c);
            stack.push(start);
            while let Some(n) = stack.pop() {
                members.push(n);
                let adjacent = self
                    .neighbors(n, Direction::Outgoing, None)
                    .chain(self.neighbors(n, Direction::Incoming, None));
                for m in adjacent {
                    if component_of[m].is_none() {
                        component_of[m] = Some(c);
                        stack.push(m);
                    }
                }
            }
            members.sort();
            components.push(Component { nodes: members });
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures::op;

    fn node(train: usize, index: usize) -> Node {
        Node {
            train: TrainId::from(train),
            operation: op(index, 1, &[]),
        }
    }

    #[test]
    fn lookup_and_not_found() {
        let mut g = Graph::new();
        let ids = g.add_nodes(vec![node(0, 0), node(0, 1), node(1, 0)]);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.node_by_train_and_index(TrainId::from(0), 1), Ok(ids[1]));
        assert_eq!(g.node_by_train_and_index(TrainId::from(1), 0), Ok(ids[2]));
        assert_eq!(
            g.node_by_train_and_index(TrainId::from(1), 1),
            Err(Error::NotFound {
                train: TrainId::from(1),
                index: 1
            })
        );
        assert_eq!(g.train_nodes(TrainId::from(0)), &ids[0..2]);
        assert!(g.train_nodes(TrainId::from(7)).is_empty());
    }

    #[test]
    fn neighbors_respect_direction_kind_and_order() {
        let mut g = Graph::new();
        let n = g.add_nodes(vec![node(0, 0), node(0, 1), node(0, 2), node(1, 0)]);
        g.add_edges(vec![(n[0], n[2]), (n[0], n[1])], EdgeKind::Dependency);
        g.add_edges(vec![(n[0], n[3])], EdgeKind::PrecedenceCandidate);

        let out: Vec<_> = g.neighbors(n[0], Direction::Outgoing, None).collect();
        assert_eq!(out, vec![n[2], n[1], n[3]]);
        let deps: Vec<_> = g
            .neighbors(n[0], Direction::Outgoing, Some(EdgeKind::Dependency))
            .collect();
        assert_eq!(deps, vec![n[2], n[1]]);
        let into_3: Vec<_> = g.neighbors(n[3], Direction::Incoming, None).collect();
        assert_eq!(into_3, vec![n[0]]);
        assert_eq!(g.edge_count(Some(EdgeKind::PrecedenceCandidate)), 1);
        assert!(g.has_edge(n[0], n[3], EdgeKind::PrecedenceCandidate));
        assert!(!g.has_edge(n[3], n[0], EdgeKind::PrecedenceCandidate));
    }

    #[test]
    #[should_panic(expected = "edge endpoint 5 is not a node (graph has 2 nodes)")]
    fn edge_to_missing_node_panics() {
        let mut g = Graph::new();
        let n = g.add_nodes(vec![node(0, 0), node(0, 1)]);
        g.add_edges(vec![(n[0], NodeId::from(5))], EdgeKind::Dependency);
    }

    #[test]
    fn components_merge_across_edges() {
        let mut g = Graph::new();
        let n = g.add_nodes(vec![node(0, 0), node(0, 1), node(1, 0), node(1, 1)]);
        g.add_edges(vec![(n[0], n[1]), (n[2], n[3])], EdgeKind::Dependency);
        let components = g.weakly_connected_components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].nodes, vec![n[0], n[1]]);
        assert_eq!(components[1].trains(&g), vec![TrainId::from(1)]);

        g.add_edges(vec![(n[3], n[1])], EdgeKind::PrecedenceCandidate);
        let components = g.weakly_connected_components();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].nodes.len(), 4);
        assert_eq!(components[0].trains(&g).len(), 2);
    }
}
