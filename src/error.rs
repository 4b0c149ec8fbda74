use derive_more::Display;

use crate::problem::TrainId;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required field is missing, has the wrong type, or holds an invalid value.
    #[display(fmt = "format error: {}", _0)]
    Format(String),
    #[display(fmt = "unsupported objective type {:?}", kind)]
    ObjectiveKind { kind: String },
    #[display(
        fmt = "train {} operation {} lists successor {} but the train has {} operations",
        train,
        operation,
        successor,
        operation_count
    )]
    UnknownSuccessor {
        train: TrainId,
        operation: usize,
        successor: usize,
        operation_count: usize,
    },
    #[display(fmt = "no operation {} in train {}", index, train)]
    NotFound { train: TrainId, index: usize },
    #[display(fmt = "dependency cycle in train {}", train)]
    CyclicDependency { train: TrainId },
    #[display(
        fmt = "train {} operation at position {} carries index {}",
        train,
        position,
        index
    )]
    OperationIndex {
        train: TrainId,
        position: usize,
        index: usize,
    },
    /// Some path through the train could leave the range of `TimeValue`.
    #[display(fmt = "times in train {} exceed the representable range", train)]
    TimeOutOfRange { train: TrainId },
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}
