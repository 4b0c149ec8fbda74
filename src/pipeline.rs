use log::info;
use serde::{Deserialize, Serialize};

use crate::builder::build;
use crate::error::Error;
use crate::graph::{EdgeKind, Graph};
use crate::linker::link_conflicts;
use crate::occupation::{occupations, Occupation};
use crate::problem::Instance;
use crate::timing::{earliest_timings_with, TimingOptions, Timings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Add precedence candidate edges between trains sharing resources.
    pub link_conflicts: bool,
    pub timing: TimingOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            link_conflicts: true,
            timing: TimingOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub graph: Graph,
    pub timings: Timings,
    pub occupations: Vec<Occupation>,
}

/// Builds the graph, optionally links resource conflicts, then derives
/// timings and occupations.
pub fn analyze(instance: &Instance, settings: &Settings) -> Result<Analysis, Error> {
    let _p = hprof::enter("analyze");
    let mut graph = build(instance)?;
    if settings.link_conflicts {
        link_conflicts(&mut graph);
    }
    let timings = earliest_timings_with(&graph, &settings.timing);
    let occupations = occupations(&graph, &timings);
    info!(
        "Analyzed {} trains: {} nodes, {} dependency edges, {} candidate edges, {} occupations",
        instance.trains.len(),
        graph.node_count(),
        graph.edge_count(Some(EdgeKind::Dependency)),
        graph.edge_count(Some(EdgeKind::PrecedenceCandidate)),
        occupations.len()
    );
    Ok(Analysis {
        graph,
        timings,
        occupations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::fixtures::*;
    use crate::timing::Propagation;

    #[test]
    fn settings_defaults_and_overrides() {
        let defaults: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, Settings::default());
        assert!(defaults.link_conflicts);
        assert_eq!(defaults.timing.propagation, Propagation::DepthFirst);

        let custom: Settings = serde_json::from_str(
            r#"{"link_conflicts": false, "timing": {"propagation": "topological", "parallel": true}}"#,
        )
        .unwrap();
        assert!(!custom.link_conflicts);
        assert_eq!(custom.timing.propagation, Propagation::Topological);
        assert!(custom.timing.parallel);
    }

    #[test]
    fn linking_is_optional() {
        let instance = instance(vec![
            vec![op_on(0, 1, &[], &[("R1", 0)])],
            vec![op_on(0, 1, &[], &[("R1", 0)])],
        ]);
        let linked = analyze(&instance, &Settings::default()).unwrap();
        assert_eq!(linked.graph.edge_count(Some(EdgeKind::PrecedenceCandidate)), 2);

        let settings = Settings {
            link_conflicts: false,
            ..Default::default()
        };
        let unlinked = analyze(&instance, &settings).unwrap();
        assert_eq!(unlinked.graph.edge_count(None), 0);
        assert_eq!(unlinked.occupations, linked.occupations);
    }

    #[test]
    fn build_errors_propagate() {
        let instance = instance(vec![vec![op(0, 1, &[4])]]);
        assert!(matches!(
            analyze(&instance, &Settings::default()),
            Err(Error::UnknownSuccessor { .. })
        ));
    }
}
