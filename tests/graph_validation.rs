//! Cycle detection over manifold sets, independent of any running engine.

use depvisor::{validate, EngineError, Manifold, Manifolds, WorkerError};

fn declaration(inputs: &[&str]) -> Manifold {
    let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
    Manifold::new(inputs, |_res| async { Err(WorkerError::Missing) })
}

#[test]
fn empty_set_is_valid() {
    assert_eq!(validate(&Manifolds::new()), Ok(()));
}

#[test]
fn chain_is_acyclic() {
    let mut set = Manifolds::new();
    set.insert("a", declaration(&[]));
    set.insert("b", declaration(&["a"]));
    set.insert("c", declaration(&["b"]));
    assert_eq!(validate(&set), Ok(()));
}

#[test]
fn diamond_is_acyclic() {
    let mut set = Manifolds::new();
    set.insert("base", declaration(&[]));
    set.insert("left", declaration(&["base"]));
    set.insert("right", declaration(&["base"]));
    set.insert("top", declaration(&["left", "right"]));
    assert_eq!(validate(&set), Ok(()));
}

#[test]
fn unknown_inputs_are_ignored() {
    // Forward references are legal: the absent manifold may be installed
    // later and cannot close a cycle now.
    let mut set = Manifolds::new();
    set.insert("a", declaration(&["ghost"]));
    assert_eq!(validate(&set), Ok(()));
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut set = Manifolds::new();
    set.insert("a", declaration(&["a"]));
    assert_eq!(
        validate(&set),
        Err(EngineError::Cycle {
            path: vec!["a".to_string(), "a".to_string()]
        })
    );
}

#[test]
fn two_node_cycle_reports_the_path() {
    let mut set = Manifolds::new();
    set.insert("a", declaration(&["b"]));
    set.insert("b", declaration(&["a"]));
    match validate(&set) {
        Err(EngineError::Cycle { path }) => {
            assert_eq!(path.first(), path.last());
            assert!(path.len() >= 3);
            assert!(path.contains(&"a".to_string()));
            assert!(path.contains(&"b".to_string()));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn cycle_buried_behind_a_chain_is_found() {
    let mut set = Manifolds::new();
    set.insert("entry", declaration(&["x"]));
    set.insert("x", declaration(&["y"]));
    set.insert("y", declaration(&["z"]));
    set.insert("z", declaration(&["x"]));
    match validate(&set) {
        Err(EngineError::Cycle { path }) => {
            assert_eq!(path.first(), path.last());
            assert!(!path.contains(&"entry".to_string()));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}
