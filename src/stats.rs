//! Structural facts about an instance and its objectives.
//!
//! Values are handed to a caller-supplied `output_stats` sink rather than
//! written anywhere, so the caller decides where statistics are kept.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use crate::error::Error;
use crate::graph::{EdgeKind, Graph};
use crate::problem::{Instance, ObjectiveShape};

pub fn report_graph_statistics(graph: &Graph, mut output_stats: impl FnMut(String, Value)) {
    output_stats("nodes".to_string(), json!(graph.node_count()));
    output_stats(
        "dependency edges".to_string(),
        json!(graph.edge_count(Some(EdgeKind::Dependency))),
    );
    output_stats(
        "precedence candidate edges".to_string(),
        json!(graph.edge_count(Some(EdgeKind::PrecedenceCandidate))),
    );
    output_stats(
        "components".to_string(),
        json!(graph.weakly_connected_components().len()),
    );
}

pub fn report_objective_statistics(
    instance: &Instance,
    graph: &Graph,
    mut output_stats: impl FnMut(String, Value),
) -> Result<(), Error> {
    let mut per_train: BTreeMap<usize, usize> = BTreeMap::new();
    let mut on_last_node = vec![false; instance.trains.len()];
    let mut thresholds_are_lower_bounds = true;
    let mut no_upper_bounds = true;
    let mut step_increments: BTreeMap<i64, usize> = BTreeMap::new();
    let mut step_objectives = 0;
    let mut steps_to_ignore = 0;

    for objective in instance.objectives.iter() {
        *per_train.entry(objective.train.idx()).or_default() += 1;

        let node = graph.node(graph.node_by_train_and_index(objective.train, objective.operation)?);
        let operation_count = graph.train_nodes(objective.train).len();
        if node.index() + 1 == operation_count {
            on_last_node[objective.train.idx()] = true;
        }
        let lower_bound = node.operation.start_lb.unwrap_or(0);
        thresholds_are_lower_bounds &= lower_bound == objective.threshold;
        no_upper_bounds &= node.operation.start_ub.is_none();
        if objective.increment != 0 {
            *step_increments.entry(objective.increment).or_default() += 1;
        }
        // A step whose threshold lies before the earliest start always applies.
        if objective.shape() == ObjectiveShape::Step {
            step_objectives += 1;
            if objective.threshold < lower_bound {
                steps_to_ignore += 1;
            }
        }
    }

    output_stats("objectives per train".to_string(), json!(per_train));
    output_stats(
        "all trains have an objective".to_string(),
        json!(per_train.len() == instance.trains.len()),
    );
    output_stats(
        "one objective per train".to_string(),
        json!(per_train.values().all(|c| *c == 1)),
    );
    output_stats(
        "objective always on last node".to_string(),
        json!(on_last_node.iter().all(|x| *x)),
    );
    output_stats(
        "lb bounds == thresholds".to_string(),
        json!(thresholds_are_lower_bounds),
    );
    output_stats(
        "no ub bounds on any objective node".to_string(),
        json!(no_upper_bounds),
    );

    if let Some(shape) = combined_shape(instance) {
        output_stats("objective type".to_string(), json!(shape));
    }
    output_stats(
        "all coeffs are 1".to_string(),
        json!(instance
            .objectives
            .iter()
            .filter(|o| o.coeff != 0)
            .all(|o| o.coeff == 1)),
    );
    if !step_increments.is_empty() {
        output_stats(
            "occurrences of penalty values for steps".to_string(),
            json!(step_increments),
        );
    }

    let release_times = graph
        .nodes()
        .flat_map(|(_, node)| node.operation.resources.iter().map(|r| r.release_time))
        .collect::<BTreeSet<_>>();
    output_stats("release times".to_string(), json!(release_times));

    if step_objectives > 0 {
        output_stats(
            "number of step objectives to ignore".to_string(),
            json!(steps_to_ignore),
        );
    }
    Ok(())
}

/// `Linear` or `Step` when every objective has that shape, `Mixed` otherwise.
fn combined_shape(instance: &Instance) -> Option<ObjectiveShape> {
    let mut shapes = instance.objectives.iter().map(|o| o.shape());
    let first = shapes.next()?;
    Some(if shapes.all(|s| s == first) {
        first
    } else {
        ObjectiveShape::Mixed
    })
}
