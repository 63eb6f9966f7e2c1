//! Building and running the cart-pole graph end to end.

use dg_core::{DgError, Value};
use dg_entity::Factory;
use dg_signal::ValueRegistry;
use dg_sim::{
    ActionDef, ArgDef, SimError, SimOptions, build, from_yaml_str, load_yaml, run_sim, save_yaml,
    validate,
};

const CART_POLE: &str = include_str!("../../../demos/cart_pole.yaml");

fn context() -> (Factory, ValueRegistry) {
    let factory = Factory::new();
    let registry = ValueRegistry::with_builtin();
    dg_tutorial::register(&factory, &registry).unwrap();
    (factory, registry)
}

fn parse_vector(text: &str) -> Vec<f64> {
    match Value::parse(dg_core::ValueKind::Vector, text).unwrap() {
        Value::Vector(v) => v.iter().copied().collect(),
        other => panic!("not a vector: {other:?}"),
    }
}

#[test]
fn demo_graph_builds_and_stabilizes() {
    let (factory, registry) = context();
    let graph = from_yaml_str(CART_POLE).unwrap();
    assert_eq!(graph.name, "cart-pole");

    let pool = build(&graph, &factory, &registry).unwrap();
    assert_eq!(pool.names(), vec!["pendulum", "controller"]);
    assert_eq!(
        pool.execute("controller", "getGain", &[]).unwrap(),
        Some(Value::Matrix(nalgebra::DMatrix::from_row_slice(
            1,
            4,
            &[-1.0, -50.0, -2.0, -10.0]
        )))
    );

    let opts = SimOptions::from(graph.run.clone());
    let rec = run_sim(&pool, &graph, &registry, &opts).unwrap();
    assert_eq!(rec.columns, vec!["pendulum.state", "controller.force"]);
    assert_eq!(rec.len(), 101);
    assert_eq!(rec.t.last(), Some(&1000));

    let states = rec.column("pendulum.state").unwrap();
    assert_eq!(parse_vector(states[0]), vec![0.0, 0.1, 0.0, 0.0]);
    let last = parse_vector(states[states.len() - 1]);
    assert!(last[1].abs() < 0.01, "angle did not settle: {last:?}");
}

#[test]
fn demo_graph_round_trips_through_yaml_files() {
    let (factory, registry) = context();
    let graph = from_yaml_str(CART_POLE).unwrap();

    let path = std::env::temp_dir().join("dg_sim_roundtrip_cart_pole.yaml");
    save_yaml(&path, &graph).unwrap();
    let loaded = load_yaml(&path).unwrap();
    assert_eq!(graph, loaded);

    validate(&loaded, &factory).unwrap();
    let pool = build(&loaded, &factory, &registry).unwrap();
    assert_eq!(pool.len(), 2);
}

#[test]
fn recorded_force_matches_feedback_law() {
    let (factory, registry) = context();
    let graph = from_yaml_str(CART_POLE).unwrap();
    let pool = build(&graph, &factory, &registry).unwrap();
    let opts = SimOptions {
        steps: 3,
        record_every: 1,
    };
    let rec = run_sim(&pool, &graph, &registry, &opts).unwrap();

    let gain = [-1.0, -50.0, -2.0, -10.0];
    let law = |state: &[f64]| -gain.iter().zip(state).map(|(k, x)| k * x).sum::<f64>();
    let states: Vec<_> = rec.rows.iter().map(|row| parse_vector(&row[0])).collect();
    let forces: Vec<_> = rec.rows.iter().map(|row| parse_vector(&row[1])[0]).collect();

    // The force sampled at time k is the one step k pulled, computed from
    // the state before that step.
    assert!((forces[0] - law(states[0].as_slice())).abs() < 1e-9);
    for k in 1..rec.len() {
        assert!((forces[k] - law(states[k - 1].as_slice())).abs() < 1e-9);
    }
}

#[test]
fn unknown_class_fails_validation() {
    let (factory, _) = context();
    let graph = from_yaml_str("name: g\nentities: [{ class: Nope, name: n }]").unwrap();
    assert!(matches!(
        validate(&graph, &factory),
        Err(SimError::Validation { .. })
    ));
}

#[test]
fn undeclared_entities_fail_validation() {
    let (factory, _) = context();
    let yaml = r#"
name: g
entities: [{ class: InvertedPendulum, name: p }]
plugs: [{ from: c.force, to: p.forcein }]
"#;
    let graph = from_yaml_str(yaml).unwrap();
    assert!(matches!(
        validate(&graph, &factory),
        Err(SimError::Validation { .. })
    ));

    let yaml = r#"
name: g
entities:
  - { class: InvertedPendulum, name: p }
  - { class: FeedbackControl, name: p }
"#;
    let graph = from_yaml_str(yaml).unwrap();
    assert!(validate(&graph, &factory).is_err());
}

#[test]
fn bad_arguments_are_reported() {
    let (factory, registry) = context();
    let mut graph = from_yaml_str(CART_POLE).unwrap();
    graph.setup.push(ActionDef::Command {
        entity: "pendulum".into(),
        command: "setCartMass".into(),
        args: vec![ArgDef::Text("heavy".into())],
    });
    let err = build(&graph, &factory, &registry).err().unwrap();
    assert!(matches!(err, SimError::Argument { index: 0, .. }));

    graph.setup.pop();
    graph.setup.push(ActionDef::Command {
        entity: "pendulum".into(),
        command: "incr".into(),
        args: vec![],
    });
    let err = build(&graph, &factory, &registry).err().unwrap();
    assert!(matches!(
        err,
        SimError::Graph(DgError::ArityMismatch { expected: 1, found: 0, .. })
    ));
}

#[test]
fn incompatible_plug_is_a_graph_error() {
    let (factory, registry) = context();
    let yaml = r#"
name: g
entities:
  - { class: InvertedPendulum, name: a }
  - { class: InvertedPendulum, name: b }
plugs: [{ from: a.state, to: b.state }]
"#;
    let graph = from_yaml_str(yaml).unwrap();
    let err = build(&graph, &factory, &registry).err().unwrap();
    assert!(matches!(err, SimError::Graph(DgError::NotPlugable { .. })));
}
