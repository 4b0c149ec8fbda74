use derive_more::{Display, From, Into};
use serde::Serialize;
use typed_index_collections::TiVec;

pub type TimeValue = i64;

#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From, Into, Serialize,
)]
#[serde(transparent)]
pub struct TrainId(usize);

impl TrainId {
    pub fn idx(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub name: String,
    /// Minimum gap after the occupation ends before another train may enter.
    pub release_time: TimeValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub index: usize,
    pub start_lb: Option<TimeValue>,
    pub start_ub: Option<TimeValue>,
    pub min_duration: TimeValue,
    pub resources: Vec<ResourceUsage>,
    /// Indices into the operation list of the same train.
    pub successors: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Train {
    pub id: TrainId,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectiveKind {
    #[serde(rename = "op_delay")]
    OperationDelay,
}

impl ObjectiveKind {
    pub const OPERATION_DELAY: &'static str = "op_delay";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveShape {
    Linear,
    Step,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub train: TrainId,
    pub operation: usize,
    pub threshold: TimeValue,
    pub increment: i64,
    pub coeff: i64,
}

impl Objective {
    pub fn shape(&self) -> ObjectiveShape {
        match (self.coeff != 0, self.increment != 0) {
            (true, true) => ObjectiveShape::Mixed,
            (true, false) => ObjectiveShape::Linear,
            (false, _) => ObjectiveShape::Step,
        }
    }
}

/// A parsed problem instance. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub trains: TiVec<TrainId, Train>,
    pub objectives: Vec<Objective>,
}

impl Instance {
    pub fn operation(&self, train: TrainId, index: usize) -> Option<&Operation> {
        self.trains.get(train)?.operations.get(index)
    }

    pub fn operation_count(&self) -> usize {
        self.trains.iter().map(|t| t.operations.len()).sum()
    }

    pub fn successor_count(&self) -> usize {
        self.trains
            .iter()
            .flat_map(|t| t.operations.iter())
            .map(|op| op.successors.len())
            .sum()
    }
}
