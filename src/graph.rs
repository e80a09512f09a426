//! # Cycle detection over a manifold set.
//!
//! The engine runs this over the candidate graph (installed manifolds plus
//! the one being installed) before mutating any state, so a rejected
//! install is a true no-op.
//!
//! Edges point from each manifold to each of its inputs. Inputs that name
//! no manifold in the set are skipped: installing a dependent before its
//! dependency is legal, and an absent node cannot close a cycle.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::manifold::Manifolds;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Validates that the manifold set's dependency graph is acyclic.
///
/// The first cycle found is reported as [`EngineError::Cycle`] with the
/// names along the cycle (first name repeated at the end). Roots are
/// visited in sorted order so diagnostics are deterministic.
///
/// # Example
/// ```
/// use depvisor::{validate, EngineError, Manifold, Manifolds, WorkerError};
///
/// let mut set = Manifolds::new();
/// set.insert("a", Manifold::new(["b"], |_res| async { Err(WorkerError::Missing) }));
/// set.insert("b", Manifold::new(["a"], |_res| async { Err(WorkerError::Missing) }));
///
/// assert!(matches!(validate(&set), Err(EngineError::Cycle { .. })));
/// ```
pub fn validate(manifolds: &Manifolds) -> Result<(), EngineError> {
    let mut edges: HashMap<&str, &[String]> = HashMap::with_capacity(manifolds.len());
    for (name, manifold) in manifolds.iter() {
        edges.insert(name, manifold.inputs());
    }
    validate_edges(&edges)
}

/// Shared core for [`validate`] and the engine's install-time check, which
/// assembles the candidate adjacency without cloning manifolds.
pub(crate) fn validate_edges(edges: &HashMap<&str, &[String]>) -> Result<(), EngineError> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(edges.len());
    let mut trail: Vec<&str> = Vec::new();

    let mut roots: Vec<&str> = edges.keys().copied().collect();
    roots.sort_unstable();
    for root in roots {
        visit(root, edges, &mut marks, &mut trail)?;
    }
    Ok(())
}

fn visit<'a>(
    node: &'a str,
    edges: &HashMap<&'a str, &'a [String]>,
    marks: &mut HashMap<&'a str, Mark>,
    trail: &mut Vec<&'a str>,
) -> Result<(), EngineError> {
    match marks.get(node) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let first = trail.iter().position(|seen| *seen == node).unwrap_or(0);
            let mut path: Vec<String> = trail[first..].iter().map(|s| s.to_string()).collect();
            path.push(node.to_string());
            return Err(EngineError::Cycle { path });
        }
        None => {}
    }

    marks.insert(node, Mark::Visiting);
    trail.push(node);
    if let Some(inputs) = edges.get(node) {
        for input in inputs.iter() {
            if edges.contains_key(input.as_str()) {
                visit(input.as_str(), edges, marks, trail)?;
            }
        }
    }
    trail.pop();
    marks.insert(node, Mark::Done);
    Ok(())
}
