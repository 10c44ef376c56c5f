//! Dependency validation and ordering for a decomposition batch.

use super::entities::{SubtaskId, SubtaskSpec};
use crate::core::error::DecompositionError;
use std::collections::{HashMap, HashSet};

/// Validate a batch and return it in dependency order.
///
/// Ordering is a stable topological sort: among subtasks whose dependencies
/// are satisfied, the one listed first by the decomposer goes first.
///
/// Rejects duplicate ids, dependencies outside the batch, self-dependencies
/// and cycles.
pub fn order_subtasks(specs: Vec<SubtaskSpec>) -> Result<Vec<SubtaskSpec>, DecompositionError> {
    if specs.is_empty() {
        return Err(DecompositionError::Empty);
    }

    let mut seen = HashSet::new();
    for spec in &specs {
        if !seen.insert(spec.id.clone()) {
            return Err(DecompositionError::DuplicateId(spec.id.to_string()));
        }
    }

    for spec in &specs {
        for dep in &spec.dependencies {
            if !seen.contains(dep) || dep == &spec.id {
                return Err(DecompositionError::DanglingDependency {
                    subtask: spec.id.to_string(),
                    dependency: dep.to_string(),
                });
            }
        }
    }

    let mut remaining: HashMap<SubtaskId, usize> = specs
        .iter()
        .map(|s| {
            let unique: HashSet<&SubtaskId> = s.dependencies.iter().collect();
            (s.id.clone(), unique.len())
        })
        .collect();

    let mut ordered: Vec<SubtaskSpec> = Vec::with_capacity(specs.len());
    let mut pending = specs;

    while !pending.is_empty() {
        let Some(pos) = pending
            .iter()
            .position(|s| remaining.get(&s.id).copied().unwrap_or(0) == 0)
        else {
            let mut cycle: Vec<String> = pending.iter().map(|s| s.id.to_string()).collect();
            cycle.sort();
            return Err(DecompositionError::DependencyCycle(cycle));
        };

        let next = pending.remove(pos);

        for spec in &pending {
            let unique: HashSet<&SubtaskId> = spec.dependencies.iter().collect();
            if unique.contains(&next.id)
                && let Some(count) = remaining.get_mut(&spec.id)
            {
                *count = count.saturating_sub(1);
            }
        }

        ordered.push(next);
    }

    Ok(ordered)
}
