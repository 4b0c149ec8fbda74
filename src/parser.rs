//! Reader for the DISPLIB train operations JSON format.
//!
//! A train is either a bare array of operations, or an object with an
//! optional explicit `id` and an `operations` array. Operations may carry an
//! explicit `index`. The first malformed element aborts the whole parse.

use crate::error::Error;
use crate::problem::{
    Instance, Objective, ObjectiveKind, Operation, ResourceUsage, TimeValue, Train, TrainId,
};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use typed_index_collections::TiVec;

#[derive(Deserialize)]
struct RawInstance {
    trains: Vec<Value>,
    #[serde(default)]
    objective: Vec<Value>,
}

#[derive(Deserialize)]
struct RawKeyedTrain {
    #[serde(default)]
    id: Option<usize>,
    operations: Vec<RawOperation>,
}

#[derive(Deserialize)]
struct RawOperation {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    start_lb: Option<TimeValue>,
    #[serde(default)]
    start_ub: Option<TimeValue>,
    min_duration: TimeValue,
    #[serde(default)]
    resources: Vec<RawResource>,
    successors: Vec<usize>,
}

#[derive(Deserialize)]
struct RawResource {
    resource: String,
    #[serde(default)]
    release_time: TimeValue,
}

#[derive(Deserialize)]
struct RawObjective {
    train: usize,
    operation: usize,
    #[serde(default)]
    threshold: TimeValue,
    #[serde(default)]
    increment: i64,
    #[serde(default)]
    coeff: i64,
}

pub fn parse_instance(json: &str) -> Result<Instance, Error> {
    parse_value(serde_json::from_str(json)?)
}

pub fn read_instance(reader: impl std::io::Read) -> Result<Instance, Error> {
    parse_value(serde_json::from_reader(reader)?)
}

pub fn parse_value(value: Value) -> Result<Instance, Error> {
    let raw: RawInstance = serde_json::from_value(value)?;

    let mut keyed_trains = Vec::with_capacity(raw.trains.len());
    for (train_pos, train) in raw.trains.into_iter().enumerate() {
        let (id, operations) = parse_train(train)
            .map_err(|e| Error::format(format!("train #{}: {}", train_pos, e)))?;
        keyed_trains.push((id, operations));
    }

    let trains: TiVec<TrainId, Train> = arrange_dense(keyed_trains, "train id")?
        .into_iter()
        .enumerate()
        .map(|(idx, operations)| Train {
            id: TrainId::from(idx),
            operations,
        })
        .collect();

    let mut objectives = Vec::with_capacity(raw.objective.len());
    for objective in raw.objective {
        objectives.push(parse_objective(objective, &trains)?);
    }

    let instance = Instance { trains, objectives };
    debug!(
        "Parsed instance with {} trains, {} operations, {} objectives",
        instance.trains.len(),
        instance.operation_count(),
        instance.objectives.len()
    );
    Ok(instance)
}

fn parse_train(value: Value) -> Result<(Option<usize>, Vec<Operation>), Error> {
    let (id, raw_ops) = match value {
        Value::Array(_) => (None, serde_json::from_value::<Vec<RawOperation>>(value)?),
        Value::Object(_) => {
            let keyed: RawKeyedTrain = serde_json::from_value(value)?;
            (keyed.id, keyed.operations)
        }
        other => {
            return Err(Error::format(format!(
                "expected an operation array or a train object, found {}",
                other
            )))
        }
    };

    let mut keyed_ops = Vec::with_capacity(raw_ops.len());
    for (pos, op) in raw_ops.into_iter().enumerate() {
        keyed_ops.push((op.index, check_operation(pos, op)?));
    }
    let operations = arrange_dense(keyed_ops, "operation index")?
        .into_iter()
        .enumerate()
        .map(|(index, op)| Operation { index, ..op })
        .collect();
    Ok((id, operations))
}

fn check_operation(pos: usize, op: RawOperation) -> Result<Operation, Error> {
    if op.min_duration < 0 {
        return Err(Error::format(format!(
            "operation #{} has negative min_duration {}",
            pos, op.min_duration
        )));
    }
    if let (Some(lb), Some(ub)) = (op.start_lb, op.start_ub) {
        if lb > ub {
            return Err(Error::format(format!(
                "operation #{} has start_lb {} > start_ub {}",
                pos, lb, ub
            )));
        }
    }
    let mut resources = Vec::with_capacity(op.resources.len());
    for r in op.resources {
        if r.release_time < 0 {
            return Err(Error::format(format!(
                "operation #{} resource {:?} has negative release_time {}",
                pos, r.resource, r.release_time
            )));
        }
        resources.push(ResourceUsage {
            name: r.resource,
            release_time: r.release_time,
        });
    }
    Ok(Operation {
        index: pos,
        start_lb: op.start_lb,
        start_ub: op.start_ub,
        min_duration: op.min_duration,
        resources,
        successors: op.successors,
    })
}

fn parse_objective(value: Value, trains: &TiVec<TrainId, Train>) -> Result<Objective, Error> {
    let kind = match value.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(Error::ObjectiveKind { kind: other.to_string() }),
        None => return Err(Error::format("objective is missing field `type`")),
    };
    if kind != ObjectiveKind::OPERATION_DELAY {
        return Err(Error::ObjectiveKind { kind });
    }

    let raw: RawObjective = serde_json::from_value(value)?;
    let train = TrainId::from(raw.train);
    let exists = trains
        .get(train)
        .map_or(false, |t| raw.operation < t.operations.len());
    if !exists {
        return Err(Error::format(format!(
            "objective refers to train {} operation {}, which does not exist",
            raw.train, raw.operation
        )));
    }

    Ok(Objective {
        kind: ObjectiveKind::OperationDelay,
        train,
        operation: raw.operation,
        threshold: raw.threshold,
        increment: raw.increment,
        coeff: raw.coeff,
    })
}

/// Orders items by their explicit identifiers, or keeps the given order when
/// no item has one. Identifiers must cover `0..len` exactly once.
fn arrange_dense<T>(items: Vec<(Option<usize>, T)>, what: &str) -> Result<Vec<T>, Error> {
    let explicit = items.iter().filter(|(id, _)| id.is_some()).count();
    if explicit == 0 {
        return Ok(items.into_iter().map(|(_, item)| item).collect());
    }
    if explicit != items.len() {
        return Err(Error::format(format!(
            "{} given for {} of {} entries",
            what,
            explicit,
            items.len()
        )));
    }

    let n = items.len();
    let mut slots: Vec<Option<T>> = (0..n).map(|_| None).collect();
    for (id, item) in items {
        let id = id.unwrap_or_default();
        match slots.get_mut(id) {
            None => {
                return Err(Error::format(format!(
                    "{} {} is out of range for {} entries",
                    what, id, n
                )))
            }
            Some(Some(_)) => return Err(Error::format(format!("duplicate {} {}", what, id))),
            Some(slot) => *slot = Some(item),
        }
    }
    Ok(slots.into_iter().flatten().collect())
}
