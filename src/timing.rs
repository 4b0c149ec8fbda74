//! Earliest start and completion times along dependency edges.
//!
//! Propagation runs per train from the operation with index 0 and ignores
//! resource conflicts entirely, so the result is a lower bound, not a feasible
//! schedule. Nodes that cannot be reached from their train's root get no
//! timing.

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use typed_index_collections::TiVec;

use crate::graph::{Direction, EdgeKind, Graph, Node, NodeId};
use crate::problem::{TimeValue, TrainId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    pub start: TimeValue,
    pub completion: TimeValue,
}

impl Timing {
    /// In range for graphs from [`crate::builder::build`], which rejects trains
    /// whose times could overflow.
    fn after(start: TimeValue, node: &Node) -> Self {
        Timing {
            start,
            completion: start + node.operation.min_duration,
        }
    }
}

/// How the start of an operation with several predecessors is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// The start of a node is the completion of the predecessor an exhaustive
    /// depth-first walk reaches it from last. The walk visits successors by
    /// ascending operation index, whatever order they were declared in. At
    /// merge nodes this is not necessarily the latest predecessor.
    #[default]
    DepthFirst,
    /// The start of a node is the latest completion over all of its
    /// predecessors reachable from the root.
    Topological,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingOptions {
    pub propagation: Propagation,
    /// Propagate trains on scoped worker threads.
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    times: TiVec<NodeId, Option<Timing>>,
}

impl Timings {
    pub fn get(&self, node: NodeId) -> Option<Timing> {
        self.times.get(node).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Timing)> + '_ {
        self.times
            .iter_enumerated()
            .filter_map(|(id, t)| t.map(|t| (id, t)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn earliest_timings(graph: &Graph) -> Timings {
    earliest_timings_with(graph, &TimingOptions::default())
}

pub fn earliest_timings_with(graph: &Graph, options: &TimingOptions) -> Timings {
    let _p = hprof::enter("earliest timings");
    let propagation = options.propagation;
    let trains = graph.trains().collect::<Vec<_>>();

    let per_train: Vec<Vec<(NodeId, Timing)>> = if options.parallel && trains.len() > 1 {
        let workers = std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .min(trains.len());
        let chunk_size = (trains.len() + workers - 1) / workers;
        std::thread::scope(|s| {
            let handles = trains
                .chunks(chunk_size)
                .map(|chunk| {
                    s.spawn(move || {
                        chunk
                            .iter()
                            .map(|t| propagate_train(graph, *t, propagation))
                            .collect::<Vec<_>>()
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    } else {
        trains
            .iter()
            .map(|t| propagate_train(graph, *t, propagation))
            .collect()
    };

    let mut times: TiVec<NodeId, Option<Timing>> = (0..graph.node_count()).map(|_| None).collect();
    for (node, timing) in per_train.into_iter().flatten() {
        times[node] = Some(timing);
    }
    let timings = Timings { times };
    debug!(
        "Propagated {:?} timings for {} of {} nodes",
        propagation,
        timings.len(),
        graph.node_count()
    );
    timings
}

fn propagate_train(graph: &Graph, train: TrainId, propagation: Propagation) -> Vec<(NodeId, Timing)> {
    let root = match graph.node_by_train_and_index(train, 0) {
        Ok(root) => root,
        Err(_) => {
            trace!("train {} has no operations", train);
            return Vec::new();
        }
    };

    let result = match propagation {
        Propagation::DepthFirst => depth_first(graph, root),
        Propagation::Topological => topological(graph, root),
    };

    let total = graph.train_nodes(train).len();
    if result.len() < total {
        warn!(
            "train {}: {} of {} operations are unreachable from operation 0",
            train,
            total - result.len(),
            total
        );
    }
    result
}

/// The root starts at its declared lower bound, or 0 when it has none.
fn root_timing(node: &Node) -> Timing {
    Timing::after(node.operation.start_lb.unwrap_or(0), node)
}

fn dependencies(graph: &Graph, node: NodeId, direction: Direction) -> impl Iterator<Item = NodeId> + '_ {
    graph.neighbors(node, direction, Some(EdgeKind::Dependency))
}

/// An exhaustive walk that re-expands a node on every visit would overwrite
/// each node's timing with the one from the lexicographically last root path.
/// Exploring successors in reverse order with a visit-once search discovers
/// every node first along exactly that path, so a single pass suffices.
fn depth_first(graph: &Graph, root: NodeId) -> Vec<(NodeId, Timing)> {
    struct Frame {
        completion: TimeValue,
        successors: Vec<NodeId>,
    }
    let frame = |node: NodeId, completion: TimeValue| {
        // Popped from the back: the highest index is explored first.
        let mut successors = dependencies(graph, node, Direction::Outgoing).collect::<Vec<_>>();
        successors.sort_unstable();
        Frame {
            completion,
            successors,
        }
    };

    let timing = root_timing(graph.node(root));
    let mut visited = HashSet::new();
    visited.insert(root);
    let mut result = vec![(root, timing)];
    let mut stack = vec![frame(root, timing.completion)];

    while let Some(top) = stack.last_mut() {
        let Some(child) = top.successors.pop() else {
            stack.pop();
            continue;
        };
        let parent_completion = top.completion;
        if visited.insert(child) {
            let timing = Timing::after(parent_completion, graph.node(child));
            result.push((child, timing));
            stack.push(frame(child, timing.completion));
        }
    }
    result
}

fn topological(graph: &Graph, root: NodeId) -> Vec<(NodeId, Timing)> {
    let mut reachable = HashSet::new();
    reachable.insert(root);
    let mut stack = vec![root];
    while let Some(n) = stack.pop() {
        for m in dependencies(graph, n, Direction::Outgoing) {
            if reachable.insert(m) {
                stack.push(m);
            }
        }
    }

    let mut pending = reachable
        .iter()
        .map(|n| {
            let parents = dependencies(graph, *n, Direction::Incoming)
                .filter(|p| reachable.contains(p))
                .count();
            (*n, parents)
        })
        .collect::<HashMap<_, _>>();
    let mut earliest_start = HashMap::new();

    let mut result = Vec::with_capacity(reachable.len());
    let mut ready = vec![(root, root_timing(graph.node(root)))];
    while let Some((node, timing)) = ready.pop() {
        result.push((node, timing));
        for child in dependencies(graph, node, Direction::Outgoing) {
            let start = earliest_start.entry(child).or_insert(timing.completion);
            *start = (*start).max(timing.completion);
            let remaining = pending.get_mut(&child).map(|c| {
                *c -= 1;
                *c
            });
            if remaining == Some(0) {
                ready.push((child, Timing::after(*start, graph.node(child))));
            }
        }
    }
    result
}
