//! Offline gateway returning canned replies.
//!
//! Recognizes the planner, specialist and supervisor system prompts and
//! answers each in the shape it expects, so a whole mission runs without a
//! network. Replies depend only on the input.

use async_trait::async_trait;
use serde_json::json;
use swarm_application::{InferenceError, InferenceGateway, InferenceReply};
use swarm_domain::{ConversationTurn, Specialist, TokenUsage};

/// Deterministic stand-in for a real model.
#[derive(Debug, Clone)]
pub struct OfflineGateway {
    confidence: f64,
}

impl Default for OfflineGateway {
    fn default() -> Self {
        Self { confidence: 0.85 }
    }
}

impl OfflineGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confidence attached to every specialist reply.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    fn reply_for(&self, role_instructions: &str, prompt: &str) -> String {
        let goal = field(prompt, "Goal:").unwrap_or("the goal");

        if role_instructions.contains("planner of a council") {
            return plan(goal);
        }
        if role_instructions.starts_with("You supervise") {
            let next = match field(prompt, "Current status:") {
                Some("executing") => "complete",
                _ => "execute",
            };
            return json!({
                "next_action": next,
                "rationale": "offline run follows the default path",
            })
            .to_string();
        }
        if let Some(specialist) = Specialist::ALL.iter().find(|s| {
            role_instructions.starts_with(&format!("You are the {} on a council", s.display_name()))
        }) {
            let round = field(prompt, "Round:").unwrap_or("1");
            return json!({
                "content": format!(
                    "[offline] {} notes for round {} on: {}",
                    specialist.display_name(),
                    round,
                    goal
                ),
                "confidence": self.confidence,
            })
            .to_string();
        }

        format!("[offline] {}", goal)
    }
}

/// Text after `label` on the first line starting with it.
fn field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(label))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn plan(goal: &str) -> String {
    let subtask = |id: &str, kind: &str, objective: String, deps: &[&str]| {
        json!({
            "id": id,
            "specialist_type": kind,
            "objective": objective,
            "success_criteria": [format!("{} is covered", kind)],
            "dependencies": deps,
        })
    };
    let plan = json!({ "subtasks": [
        subtask("1", "research", format!("Gather facts for: {}", goal), &[]),
        subtask("2", "strategy", "Set priorities from the findings".to_string(), &["1"]),
        subtask("3", "creative", "Draft the launch copy".to_string(), &["2"]),
        subtask("4", "operator", "Lay out the action plan".to_string(), &["2"]),
        subtask("5", "qa", "Review drafts against the criteria".to_string(), &["3", "4"]),
    ]});
    format!("```subtasks\n{}\n```", plan)
}

#[async_trait]
impl InferenceGateway for OfflineGateway {
    async fn invoke(
        &self,
        role_instructions: &str,
        conversation: &[ConversationTurn],
    ) -> Result<InferenceReply, InferenceError> {
        let prompt = conversation
            .iter()
            .rev()
            .find(|turn| turn.role == "user")
            .map(|turn| turn.content.as_str())
            .unwrap_or_default();
        let content = self.reply_for(role_instructions, prompt);
        let usage = TokenUsage::estimate(&format!("{}{}", role_instructions, prompt), &content);
        Ok(InferenceReply::new(content, usage))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use swarm_domain::supervisor::parse_supervisor_reply;
    use swarm_domain::{OrchestrationStatus, PromptTemplate, parse_decomposition, parse_thought_reply};

    async fn ask(system: &str, user: String) -> InferenceReply {
        OfflineGateway::new()
            .invoke(system, &[ConversationTurn::user(user)])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_plan_is_parseable() {
        let reply = ask(
            PromptTemplate::decomposition_system(),
            PromptTemplate::decomposition_prompt("Open a bakery", &Map::new()),
        )
        .await;

        let subtasks = parse_decomposition(&reply.content).unwrap();
        assert_eq!(subtasks.len(), 5);
        assert!(subtasks[0].objective.contains("Open a bakery"));
        assert!(reply.token_usage.total() > 0);
    }

    #[tokio::test]
    async fn test_specialist_reply_is_a_thought() {
        let system = PromptTemplate::specialist_system(Specialist::Qa, OrchestrationStatus::Executing);
        let reply = ask(&system, "Goal: Open a bakery\nRound: 2\n".to_string()).await;

        let parsed = parse_thought_reply(&reply.content);
        assert!(parsed.content.contains("QA Reviewer notes for round 2"));
        assert_eq!(parsed.confidence, 0.85);
    }

    #[tokio::test]
    async fn test_supervisor_proposal_follows_status() {
        let prompt = PromptTemplate::supervisor_prompt(
            "Open a bakery",
            OrchestrationStatus::Executing,
            0.9,
            0.7,
            "",
        );
        let reply = ask(PromptTemplate::supervisor_system(), prompt).await;
        let proposal = parse_supervisor_reply(&reply.content).unwrap();
        assert_eq!(proposal.next_action.as_str(), "complete");
    }

    #[tokio::test]
    async fn test_replies_are_deterministic() {
        let system = PromptTemplate::specialist_system(Specialist::Research, OrchestrationStatus::Researching);
        let a = ask(&system, "Goal: x\n".to_string()).await;
        let b = ask(&system, "Goal: x\n".to_string()).await;
        assert_eq!(a, b);
    }
}
