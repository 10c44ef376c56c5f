//! Decomposition parsing from LLM replies.
//!
//! Accepted shapes, tried in order:
//! 1. a ` ```subtasks ` (or ` ```json `) fenced block
//! 2. the whole reply as JSON
//! 3. the outermost `{...}` or `[...]` span inside surrounding prose
//!
//! The JSON itself may be `{"subtasks": [...]}` or a bare array.

use super::entities::SubtaskSpec;
use super::schedule::order_subtasks;
use crate::core::error::DecompositionError;
use crate::council::specialist::Specialist;
use serde_json::Value;

/// Parse and validate a decomposition reply.
///
/// The result is dependency-ordered and never empty.
pub fn parse_decomposition(reply: &str) -> Result<Vec<SubtaskSpec>, DecompositionError> {
    let json = extract_json(reply).ok_or_else(|| {
        DecompositionError::Unparsable(crate::util::truncate_str(reply.trim(), 200).to_string())
    })?;
    parse_decomposition_json(&json)
}

/// Parse a decomposition from an already-decoded JSON value.
pub fn parse_decomposition_json(json: &Value) -> Result<Vec<SubtaskSpec>, DecompositionError> {
    let items = match json {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("subtasks")
            .or_else(|| map.get("tasks"))
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                DecompositionError::Unparsable("missing \"subtasks\" array".to_string())
            })?,
        _ => {
            return Err(DecompositionError::Unparsable(
                "expected an object or array".to_string(),
            ));
        }
    };

    if items.is_empty() {
        return Err(DecompositionError::Empty);
    }

    let specs = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_subtask(index, item))
        .collect::<Result<Vec<_>, _>>()?;

    order_subtasks(specs)
}

fn parse_subtask(index: usize, item: &Value) -> Result<SubtaskSpec, DecompositionError> {
    let id = item
        .get("id")
        .and_then(json_value_to_string)
        .unwrap_or_else(|| format!("{}", index + 1));

    let raw_type = item
        .get("specialist_type")
        .or_else(|| item.get("specialist"))
        .or_else(|| item.get("type"))
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let specialist: Specialist =
        raw_type
            .parse()
            .map_err(|_| DecompositionError::UnknownSpecialist {
                subtask: id.clone(),
                value: raw_type.to_string(),
            })?;

    let objective = item
        .get("objective")
        .or_else(|| item.get("description"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DecompositionError::MissingObjective { subtask: id.clone() })?;

    let mut spec = SubtaskSpec::new(id, specialist, objective);

    if let Some(criteria) = item.get("success_criteria").and_then(|v| v.as_array()) {
        for criterion in criteria.iter().filter_map(|c| c.as_str()) {
            let criterion = criterion.trim();
            if !criterion.is_empty() {
                spec = spec.with_criterion(criterion);
            }
        }
    }
    if spec.success_criteria.is_empty() {
        let derived = format!("Deliverable satisfies: {}", spec.objective);
        spec = spec.with_criterion(derived);
    }

    let deps = item
        .get("dependencies")
        .or_else(|| item.get("depends_on"))
        .and_then(|v| v.as_array());
    if let Some(deps) = deps {
        for dep in deps.iter().filter_map(json_value_to_string) {
            spec = spec.with_dependency(dep);
        }
    }

    if let Some(inputs) = item.get("inputs").and_then(|v| v.as_object()) {
        spec.inputs = inputs.clone();
    }

    Ok(spec)
}

fn extract_json(reply: &str) -> Option<Value> {
    let mut in_block = false;
    let mut block = String::new();

    for line in reply.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```subtasks" || trimmed == "```json") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(parsed) = serde_json::from_str::<Value>(&block) {
                return Some(parsed);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(reply.trim()) {
        return Some(parsed);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (reply.find(open), reply.rfind(close))
            && start < end
            && let Ok(parsed) = serde_json::from_str::<Value>(&reply[start..=end])
        {
            return Some(parsed);
        }
    }

    None
}

/// Strings stay strings, numbers are stringified, null and empty become None.
fn json_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_block() {
        let reply = r#"Here is the breakdown:

```subtasks
{"subtasks": [
  {"id": "1", "specialist_type": "research", "objective": "Size the market",
   "success_criteria": ["Three competitor profiles"]},
  {"id": "2", "specialist_type": "creative", "objective": "Draft launch copy",
   "dependencies": ["1"], "inputs": {"tone": "playful"}}
]}
```
"#;
        let specs = parse_decomposition(reply).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].specialist_type, Specialist::Research);
        assert_eq!(specs[0].success_criteria, vec!["Three competitor profiles"]);
        assert_eq!(specs[1].dependencies[0].as_str(), "1");
        assert_eq!(specs[1].inputs["tone"], "playful");
    }

    #[test]
    fn test_parse_bare_array_with_numeric_ids() {
        let reply = r#"[{"id": 1, "specialist": "qa", "description": "Check claims"}]"#;
        let specs = parse_decomposition(reply).unwrap();
        assert_eq!(specs[0].id.as_str(), "1");
        assert_eq!(specs[0].specialist_type, Specialist::Qa);
    }

    #[test]
    fn test_parse_json_inside_prose() {
        let reply = r#"Sure! {"subtasks": [{"specialist_type": "operator", "objective": "Book venue"}]} Hope that helps."#;
        let specs = parse_decomposition(reply).unwrap();
        assert_eq!(specs[0].id.as_str(), "1");
    }

    #[test]
    fn test_missing_criteria_are_derived() {
        let reply = r#"[{"id": "a", "specialist_type": "strategy", "objective": "Pick a segment"}]"#;
        let specs = parse_decomposition(reply).unwrap();
        assert_eq!(
            specs[0].success_criteria,
            vec!["Deliverable satisfies: Pick a segment"]
        );
    }

    #[test]
    fn test_dependents_are_reordered() {
        let reply = r#"[
            {"id": "b", "specialist_type": "qa", "objective": "Review", "dependencies": ["a"]},
            {"id": "a", "specialist_type": "creative", "objective": "Write"}
        ]"#;
        let specs = parse_decomposition(reply).unwrap();
        assert_eq!(specs[0].id.as_str(), "a");
        assert_eq!(specs[1].id.as_str(), "b");
    }

    #[test]
    fn test_unparsable_reply() {
        let err = parse_decomposition("I cannot help with that").unwrap_err();
        assert!(matches!(err, DecompositionError::Unparsable(_)));
    }

    #[test]
    fn test_empty_subtasks() {
        assert_eq!(
            parse_decomposition(r#"{"subtasks": []}"#),
            Err(DecompositionError::Empty)
        );
    }

    #[test]
    fn test_unknown_specialist_is_rejected() {
        let err = parse_decomposition(r#"[{"id": "1", "specialist_type": "lawyer", "objective": "x"}]"#)
            .unwrap_err();
        assert_eq!(
            err,
            DecompositionError::UnknownSpecialist {
                subtask: "1".to_string(),
                value: "lawyer".to_string()
            }
        );
    }

    #[test]
    fn test_missing_objective_is_rejected() {
        let err = parse_decomposition(r#"[{"id": "1", "specialist_type": "qa", "objective": " "}]"#)
            .unwrap_err();
        assert!(matches!(err, DecompositionError::MissingObjective { .. }));
    }

    #[test]
    fn test_dangling_dependency_is_rejected() {
        let err = parse_decomposition(
            r#"[{"id": "1", "specialist_type": "qa", "objective": "x", "dependencies": ["7"]}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, DecompositionError::DanglingDependency { .. }));
    }
}
