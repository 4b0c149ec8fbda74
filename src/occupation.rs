use log::trace;
use serde::Serialize;

use crate::graph::Graph;
use crate::problem::{TimeValue, TrainId};
use crate::timing::Timings;

/// One operation's use of one resource under a set of timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupation {
    pub start: TimeValue,
    pub end: TimeValue,
    pub resource: String,
    pub train: TrainId,
    pub operation: usize,
    pub release_time: TimeValue,
    pub min_duration: TimeValue,
    pub start_lb: Option<TimeValue>,
    pub start_ub: Option<TimeValue>,
}

impl Occupation {
    /// Earliest time another train may enter the resource.
    pub fn available_at(&self) -> TimeValue {
        self.end + self.release_time
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.available_at() <= other.start || other.available_at() <= self.start)
    }
}

/// One record per `(node, resource)` pair, in node order. Nodes without a
/// timing are skipped.
pub fn occupations(graph: &Graph, timings: &Timings) -> Vec<Occupation> {
    let mut occupations = Vec::new();
    for (id, node) in graph.nodes() {
        let Some(timing) = timings.get(id) else {
            trace!("no timing for train {} operation {}", node.train, node.index());
            continue;
        };
        let op = &node.operation;
        for usage in op.resources.iter() {
            occupations.push(Occupation {
                start: timing.start,
                end: timing.completion,
                resource: usage.name.clone(),
                train: node.train,
                operation: op.index,
                release_time: usage.release_time,
                min_duration: op.min_duration,
                start_lb: op.start_lb,
                start_ub: op.start_ub,
            });
        }
    }
    occupations
}
