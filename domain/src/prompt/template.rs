//! Prompt templates for decomposition, council rounds and supervision

use crate::council::specialist::Specialist;
use crate::state::orchestration::StateSnapshot;
use crate::state::status::OrchestrationStatus;
use serde_json::{Map, Value};

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for goal decomposition
    pub fn decomposition_system() -> &'static str {
        r#"You are the planner of a council of specialists working for one business workspace.
Break the goal into a small number of concrete subtasks. Assign each subtask to exactly one specialist type:
- research: gathers facts, market signals and open questions
- strategy: turns findings into positioning and priorities
- creative: produces copy, concepts and other content artifacts
- operator: plans concrete action sequences and owners
- qa: checks outputs against success criteria

Reply with a fenced block and nothing else:

```subtasks
{"subtasks": [
  {"id": "1", "specialist_type": "research", "objective": "...",
   "success_criteria": ["..."], "dependencies": [], "inputs": {}}
]}
```

Dependencies list ids of subtasks that must be finished first. Never reference an id that is not in the list."#
    }

    /// User prompt for goal decomposition
    pub fn decomposition_prompt(goal: &str, context: &Map<String, Value>) -> String {
        let mut prompt = format!("Goal: {}\n", goal);
        if !context.is_empty() {
            prompt.push_str("\nWorkspace context:\n");
            prompt.push_str(&render_context(context));
        }
        prompt
    }

    /// System prompt for one specialist in one status
    pub fn specialist_system(specialist: Specialist, status: OrchestrationStatus) -> String {
        let focus = match specialist {
            Specialist::Research => "You gather facts, market signals and open questions. Separate evidence from assumption.",
            Specialist::Strategy => "You turn findings into positioning, priorities and trade-offs.",
            Specialist::Creative => "You produce copy, concepts and other content artifacts ready to use.",
            Specialist::Operator => "You turn plans into concrete action sequences with owners and dates.",
            Specialist::Qa => "You check work against its success criteria and flag gaps plainly.",
        };
        let stage = match status {
            OrchestrationStatus::Executing => {
                "The council is EXECUTING: deliver finished output, not more analysis."
            }
            _ => "The council is RESEARCHING: surface findings, risks and open questions.",
        };

        format!(
            r#"You are the {} on a council of specialists.
{}
{}

Reply with a JSON object:
{{"content": "<your contribution>", "confidence": <0.0-1.0>, "addressed_subtasks": ["<id>", ...], "tool_observations": []}}
Only list subtasks you fully addressed. Be honest about confidence."#,
            specialist.display_name(),
            focus,
            stage
        )
    }

    /// User prompt for one specialist against a round snapshot
    pub fn specialist_prompt(snapshot: &StateSnapshot, specialist: Specialist) -> String {
        let mut prompt = format!("Goal: {}\nRound: {}\n", snapshot.goal, snapshot.round);

        let assigned = snapshot.ready_assignments(specialist);
        if assigned.is_empty() {
            prompt.push_str(
                "\nYou have no assigned subtask this round. Advise the council based on the discussion so far.\n",
            );
        } else {
            prompt.push_str("\nYour subtasks:\n");
            for spec in &assigned {
                prompt.push_str(&format!("- {}\n", spec.summary_line()));
                if !spec.inputs.is_empty() {
                    prompt.push_str(&format!("  inputs: {}\n", Value::Object(spec.inputs.clone())));
                }
            }
        }

        if !snapshot.subtasks.is_empty() {
            prompt.push_str("\nFull plan:\n");
            for spec in &snapshot.subtasks {
                let mark = if snapshot.completed_subtasks.contains(&spec.id) {
                    "x"
                } else {
                    " "
                };
                prompt.push_str(&format!("[{}] {}\n", mark, spec.summary_line()));
            }
        }

        if let Some(instructions) = &snapshot.supervisor_instructions {
            prompt.push_str(&format!("\nSupervisor instructions: {}\n", instructions));
        }

        let context: Map<String, Value> = snapshot
            .context_variables
            .iter()
            .filter(|(k, _)| k.as_str() != crate::state::SUPERVISOR_INSTRUCTIONS_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !context.is_empty() {
            prompt.push_str("\nWorkspace context:\n");
            prompt.push_str(&render_context(&context));
        }

        if !snapshot.transcript.is_empty() {
            prompt.push_str("\nDiscussion so far:\n");
            prompt.push_str(&snapshot.transcript);
            prompt.push('\n');
        }

        prompt
    }

    /// System prompt for guided supervision
    pub fn supervisor_system() -> &'static str {
        r#"You supervise a council of specialists. Decide the next step of the mission.
Allowed next_action values: "research", "execute", "complete", "stay".
Reply with a JSON object:
{"next_action": "...", "rationale": "<one sentence>", "instructions": "<optional guidance for the next round>"}"#
    }

    /// User prompt for guided supervision
    pub fn supervisor_prompt(
        goal: &str,
        status: OrchestrationStatus,
        quality: f64,
        threshold: f64,
        transcript: &str,
    ) -> String {
        format!(
            r#"Goal: {}
Current status: {}
Quality score of the last round: {:.2} (threshold {:.2})

Discussion so far:
{}"#,
            goal,
            status.as_str(),
            quality,
            threshold,
            transcript
        )
    }
}

fn render_context(context: &Map<String, Value>) -> String {
    let mut rendered = String::new();
    for (key, value) in context {
        match value {
            Value::String(s) => rendered.push_str(&format!("- {}: {}\n", key, s)),
            other => rendered.push_str(&format!("- {}: {}\n", key, other)),
        }
    }
    rendered
}
