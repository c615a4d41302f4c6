use pwa_core::errors::PwaError;
use pwa_core::ParameterSet;
use pwa_data::EventStore;
use pwa_graph::{AddAll, Complexify, Graph, LeafBinding, Value, ValueKind};

#[test]
fn type_mismatch_is_rejected_at_construction() {
    let mut graph = Graph::new();
    let err = graph
        .add_node(
            "sum",
            ValueKind::Vector,
            Box::new(AddAll::new(ValueKind::ComplexVector)),
        )
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "type-mismatch"));
}

#[test]
fn leaf_needs_a_registered_parent() {
    let mut graph = Graph::new();
    let err = graph
        .add_leaf(
            "value",
            LeafBinding::Constant(Value::Scalar(1.0)),
            "missing-parent",
        )
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "unresolved-parent"));
}

#[test]
fn dangling_links_are_reported_with_names() {
    let mut graph = Graph::new();
    graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    graph.link_child("sum", "ghost").unwrap();
    graph.set_head("sum").unwrap();
    let err = graph.resolve_links().unwrap_err();
    match err {
        PwaError::Graph(info) => {
            assert_eq!(info.code, "broken-link");
            assert!(info.context["unresolved"].contains("ghost"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn head_is_required() {
    let mut graph = Graph::new();
    graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    let err = graph.resolve_links().unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "broken-link"));
}

#[test]
fn fixed_arity_is_checked_during_resolution() {
    let mut graph = Graph::new();
    graph
        .add_node(
            "coef",
            ValueKind::ComplexScalar,
            Box::new(Complexify::new(ValueKind::ComplexScalar)),
        )
        .unwrap();
    graph
        .add_leaf("mag", LeafBinding::Constant(Value::Scalar(1.0)), "coef")
        .unwrap();
    graph.set_head("coef").unwrap();
    let err = graph.resolve_links().unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "broken-link"));
}

#[test]
fn duplicate_names_are_rejected() {
    let mut graph = Graph::new();
    graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    let err = graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "duplicate-node"));
}

#[test]
fn shared_leaves_require_identical_bindings() {
    let mut graph = Graph::new();
    graph
        .add_node("a", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    graph
        .add_node("b", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    graph
        .add_leaf("shared", LeafBinding::Parameter("mag".into()), "a")
        .unwrap();
    // same binding attaches the existing leaf to the second parent
    graph
        .add_leaf("shared", LeafBinding::Parameter("mag".into()), "b")
        .unwrap();
    let err = graph
        .add_leaf("shared", LeafBinding::Parameter("phase".into()), "b")
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "duplicate-node"));
}

#[test]
fn topology_freezes_after_resolution() {
    let mut graph = Graph::new();
    graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    graph
        .add_leaf(
            "values",
            LeafBinding::Constant(Value::Vector(vec![1.0, 2.0])),
            "sum",
        )
        .unwrap();
    graph.set_head("sum").unwrap();
    graph.resolve_links().unwrap();

    let err = graph
        .add_node("late", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "frozen-graph"));
}

#[test]
fn evaluation_requires_resolution() {
    let mut graph = Graph::new();
    graph
        .add_node("sum", ValueKind::Vector, Box::new(AddAll::new(ValueKind::Vector)))
        .unwrap();
    graph.set_head("sum").unwrap();
    let err = graph
        .evaluate(&ParameterSet::new(), &EventStore::new())
        .unwrap_err();
    assert!(matches!(err, PwaError::Graph(info) if info.code == "broken-link"));
}
