use trackgraph::{
    analyze, build, earliest_timings, link_conflicts, parse_instance, stats, Direction, EdgeKind,
    Error, Propagation, Settings, TimingOptions, TrainId,
};

fn init() {
    let _ = pretty_env_logger::try_init();
}

/// Two trains meeting on a single-track section with headway release times.
const HEADWAY: &str = r#"{
    "trains": [
        [
            {"start_ub": 0, "min_duration": 5, "resources": [{"resource": "L1"}], "successors": [1]},
            {"min_duration": 5, "resources": [{"resource": "L2", "release_time": 5}], "successors": [2]},
            {"min_duration": 5, "resources": [{"resource": "L3", "release_time": 5}], "successors": [3]},
            {"min_duration": 0, "resources": [{"resource": "L4"}], "successors": []}
        ],
        [
            {"start_lb": 2, "start_ub": 2, "min_duration": 5, "resources": [{"resource": "L4"}], "successors": [1]},
            {"min_duration": 5, "resources": [{"resource": "L3", "release_time": 5}], "successors": [2]},
            {"min_duration": 5, "resources": [{"resource": "L2", "release_time": 5}], "successors": [3]},
            {"min_duration": 0, "resources": [{"resource": "L1"}], "successors": []}
        ]
    ],
    "objective": [
        {"type": "op_delay", "train": 0, "operation": 3, "coeff": 1},
        {"type": "op_delay", "train": 1, "operation": 3, "increment": 100}
    ]
}"#;

/// One train with an alternative route that merges again.
const SWITCHING: &str = r#"{
    "trains": [
        [
            {"min_duration": 2, "resources": [{"resource": "A"}], "successors": [1, 2]},
            {"min_duration": 9, "resources": [{"resource": "B1"}], "successors": [3]},
            {"min_duration": 3, "resources": [{"resource": "B2"}], "successors": [3]},
            {"min_duration": 1, "resources": [{"resource": "C"}], "successors": []}
        ]
    ],
    "objective": []
}"#;

#[test]
fn headway_instance_graph() {
    init();
    let instance = parse_instance(HEADWAY).unwrap();
    let mut graph = build(&instance).unwrap();
    assert_eq!(graph.node_count(), 8);
    assert_eq!(graph.edge_count(None), 6);
    assert_eq!(graph.weakly_connected_components().len(), 2);

    let added = link_conflicts(&mut graph);
    // Four shared resources, one operation per train on each.
    assert_eq!(added, 8);
    assert_eq!(graph.weakly_connected_components().len(), 1);
    assert_eq!(link_conflicts(&mut graph), 0);

    let t0_l2 = graph.node_by_train_and_index(TrainId::from(0), 1).unwrap();
    let t1_l2 = graph.node_by_train_and_index(TrainId::from(1), 2).unwrap();
    let rivals = graph
        .neighbors(t0_l2, Direction::Outgoing, Some(EdgeKind::PrecedenceCandidate))
        .collect::<Vec<_>>();
    assert_eq!(rivals, vec![t1_l2]);
}

#[test]
fn headway_instance_analysis() {
    init();
    let instance = parse_instance(HEADWAY).unwrap();
    let analysis = analyze(&instance, &Settings::default()).unwrap();

    let spans = analysis
        .occupations
        .iter()
        .map(|o| (o.train.idx(), o.resource.as_str(), o.start, o.end, o.available_at()))
        .collect::<Vec<_>>();
    assert_eq!(
        spans,
        vec![
            (0, "L1", 0, 5, 5),
            (0, "L2", 5, 10, 15),
            (0, "L3", 10, 15, 20),
            (0, "L4", 15, 15, 15),
            (1, "L4", 2, 7, 7),
            (1, "L3", 7, 12, 17),
            (1, "L2", 12, 17, 22),
            (1, "L1", 17, 17, 17),
        ]
    );
    // Unconstrained lower bounds: both trains hold L3 at the same time.
    assert!(analysis.occupations[2].overlaps(&analysis.occupations[5]));
}

#[test]
fn alternative_routes_depend_on_propagation() {
    init();
    let instance = parse_instance(SWITCHING).unwrap();
    let graph = build(&instance).unwrap();
    let merge = graph.node_by_train_and_index(TrainId::from(0), 3).unwrap();

    let dfs = earliest_timings(&graph);
    assert_eq!(dfs.get(merge).map(|t| t.start), Some(5));

    let settings = Settings {
        link_conflicts: true,
        timing: TimingOptions {
            propagation: Propagation::Topological,
            parallel: true,
        },
    };
    let analysis = analyze(&instance, &settings).unwrap();
    assert_eq!(analysis.timings.get(merge).map(|t| t.start), Some(11));
    assert_eq!(analysis.graph.edge_count(Some(EdgeKind::PrecedenceCandidate)), 0);
}

#[test]
fn statistics_sink_receives_values() {
    init();
    let instance = parse_instance(HEADWAY).unwrap();
    let graph = build(&instance).unwrap();
    let mut keys = Vec::new();
    stats::report_objective_statistics(&instance, &graph, |k, v| keys.push((k, v))).unwrap();
    stats::report_graph_statistics(&graph, |k, v| keys.push((k, v)));

    let get = |name: &str| {
        keys.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    assert_eq!(get("objective always on last node"), Some(serde_json::json!(true)));
    assert_eq!(get("objective type"), Some(serde_json::json!("mixed")));
    assert_eq!(get("nodes"), Some(serde_json::json!(8)));
}

#[test]
fn malformed_instances_fail_whole_parse() {
    init();
    let missing = HEADWAY.replacen("\"min_duration\": 5, \"resources\": [{\"resource\": \"L2\"", "\"resources\": [{\"resource\": \"L2\"", 1);
    assert!(matches!(parse_instance(&missing), Err(Error::Format(_))));

    let bad_kind = HEADWAY.replacen("op_delay", "train_delay", 1);
    assert!(matches!(parse_instance(&bad_kind), Err(Error::ObjectiveKind { .. })));

    let bad_successor = SWITCHING.replacen("[1, 2]", "[1, 7]", 1);
    let instance = parse_instance(&bad_successor).unwrap();
    assert!(matches!(build(&instance), Err(Error::UnknownSuccessor { successor: 7, .. })));
}

#[test]
fn times_beyond_range_are_rejected_before_propagation() {
    init();
    let instance = parse_instance(
        r#"{
            "trains": [[
                {"start_lb": 9223372036854775802, "min_duration": 10, "successors": []}
            ]],
            "objective": []
        }"#,
    )
    .unwrap();
    assert_eq!(
        build(&instance).unwrap_err(),
        Error::TimeOutOfRange {
            train: TrainId::from(0)
        }
    );
    assert!(matches!(
        analyze(&instance, &Settings::default()),
        Err(Error::TimeOutOfRange { .. })
    ));
}
