//! Dependency graphs for DISPLIB train scheduling instances.
//!
//! Parse an instance, build its per-train dependency graph, optionally link
//! cross-train resource conflicts, and derive earliest timings and resource
//! occupations. Nothing here decides the order in which trains use a
//! resource.

pub mod builder;
pub mod error;
pub mod graph;
pub mod linker;
pub mod occupation;
pub mod parser;
pub mod pipeline;
pub mod problem;
pub mod stats;
pub mod timing;

pub use builder::build;
pub use error::Error;
pub use graph::{Direction, EdgeKind, Graph, Node, NodeId};
pub use linker::link_conflicts;
pub use occupation::{occupations, Occupation};
pub use parser::{parse_instance, parse_value, read_instance};
pub use pipeline::{analyze, Analysis, Settings};
pub use problem::{Instance, TimeValue, TrainId};
pub use timing::{earliest_timings, earliest_timings_with, Propagation, TimingOptions, Timings};
