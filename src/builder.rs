use log::debug;

use crate::error::Error;
use crate::graph::{EdgeKind, Graph, Node};
use crate::problem::{Instance, TimeValue, Train};

/// Builds the dependency graph: one node per operation and one
/// [`EdgeKind::Dependency`] edge per declared successor. Edges never cross
/// trains. Fails without returning a partial graph if an operation's index
/// differs from its position, any successor is out of range, any train's
/// dependencies contain a cycle, or a train's times could overflow.
pub fn build(instance: &Instance) -> Result<Graph, Error> {
    let _p = hprof::enter("build dependency graph");

    for train in instance.trains.iter() {
        check_indices(train)?;
        check_successors(train)?;
        check_acyclic(train)?;
        check_time_range(train)?;
    }

    let mut graph = Graph::new();
    let nodes = instance.trains.iter().flat_map(|train| {
        train.operations.iter().map(move |op| Node {
            train: train.id,
            operation: op.clone(),
        })
    });
    let ids = graph.add_nodes(nodes);

    let mut edges = Vec::with_capacity(instance.successor_count());
    let mut offset = 0;
    for train in instance.trains.iter() {
        let train_ids = &ids[offset..offset + train.operations.len()];
        for (op_idx, op) in train.operations.iter().enumerate() {
            for &succ in op.successors.iter() {
                edges.push((train_ids[op_idx], train_ids[succ]));
            }
        }
        offset += train.operations.len();
    }
    graph.add_edges(edges, EdgeKind::Dependency);

    debug!(
        "Built dependency graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count(Some(EdgeKind::Dependency))
    );
    Ok(graph)
}

/// Nodes are looked up by index and wired by position, so the two must agree.
fn check_indices(train: &Train) -> Result<(), Error> {
    match train
        .operations
        .iter()
        .enumerate()
        .find(|(position, op)| op.index != *position)
    {
        Some((position, op)) => Err(Error::OperationIndex {
            train: train.id,
            position,
            index: op.index,
        }),
        None => Ok(()),
    }
}

fn check_successors(train: &Train) -> Result<(), Error> {
    let operation_count = train.operations.len();
    for op in train.operations.iter() {
        if let Some(&successor) = op.successors.iter().find(|s| **s >= operation_count) {
            return Err(Error::UnknownSuccessor {
                train: train.id,
                operation: op.index,
                successor,
                operation_count,
            });
        }
    }
    Ok(())
}

/// Kahn's algorithm over the train's successor lists.
fn check_acyclic(train: &Train) -> Result<(), Error> {
    let mut in_degree = vec![0usize; train.operations.len()];
    for op in train.operations.iter() {
        for &succ in op.successors.iter() {
            in_degree[succ] += 1;
        }
    }

    let mut ready = (0..in_degree.len())
        .filter(|i| in_degree[*i] == 0)
        .collect::<Vec<_>>();
    let mut removed = 0;
    while let Some(i) = ready.pop() {
        removed += 1;
        for &succ in train.operations[i].successors.iter() {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.push(succ);
            }
        }
    }

    if removed < train.operations.len() {
        return Err(Error::CyclicDependency { train: train.id });
    }
    Ok(())
}

/// Every start, completion and release instant derived from this train lies
/// between the root start plus all negative contributions and the root start
/// plus all positive ones. Both bounds must fit in a `TimeValue`.
fn check_time_range(train: &Train) -> Result<(), Error> {
    let Some(root) = train.operations.first() else {
        return Ok(());
    };
    let root_start = root.start_lb.unwrap_or(0);
    let releases = train
        .operations
        .iter()
        .flat_map(|op| op.resources.iter().map(|r| r.release_time));
    let max_release = releases.clone().max().unwrap_or(0);
    let min_release = releases.min().unwrap_or(0);

    let bound = |clamp: fn(TimeValue) -> TimeValue, release: TimeValue| {
        train
            .operations
            .iter()
            .try_fold(root_start, |acc, op| acc.checked_add(clamp(op.min_duration)))
            .and_then(|acc| acc.checked_add(clamp(release)))
    };
    let upper = bound(|d| d.max(0), max_release);
    let lower = bound(|d| d.min(0), min_release);
    if upper.is_none() || lower.is_none() {
        return Err(Error::TimeOutOfRange { train: train.id });
    }
    Ok(())
}
