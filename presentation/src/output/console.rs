//! Console output formatter for mission outcomes

use crate::output::formatter::OutputFormatter;
use colored::{ColoredString, Colorize};
use swarm_application::{HealthReport, HealthStatus};
use swarm_domain::{MessageKind, MissionOutcome, MissionStatus};

/// Formats mission outcomes for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colors on or off for everything formatted afterwards.
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// Format the complete outcome
    pub fn format(outcome: &MissionOutcome) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Swarm Council Mission"));
        output.push('\n');
        output.push_str(&Self::headline(outcome));

        if !outcome.subtasks.is_empty() {
            output.push_str(&Self::section_header("Plan"));
            for spec in &outcome.subtasks {
                output.push_str(&format!("  {}\n", spec.summary_line()));
            }
        }

        output.push_str(&Self::section_header("Transcript"));
        if outcome.evicted_messages > 0 {
            output.push_str(&format!(
                "{}\n",
                format!("({} earlier messages evicted)", outcome.evicted_messages).dimmed()
            ));
        }
        for message in &outcome.messages {
            let tag = format!("[{}:{}]", message.role, message.kind.as_str());
            output.push_str(&format!(
                "\n{}\n{}\n",
                Self::kind_color(message.kind, &tag),
                Self::indent(&message.content, "  ")
            ));
        }

        if let Some(answer) = outcome.final_answer() {
            output.push_str(&Self::section_header("Final Answer"));
            output.push_str(&format!("\n{}\n", answer));
        }

        output.push_str(&Self::section_header("Spend"));
        output.push_str(&format!(
            "  tokens: {}  cost: ${:.4}  rounds: {}  supervisor steps: {}\n",
            outcome.cost.tokens(),
            outcome.cost.cost_usd(),
            outcome.rounds,
            outcome.iterations
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &MissionOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the headline and final answer
    pub fn format_summary(outcome: &MissionOutcome) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n\n", "=== Swarm Council Result ===".cyan().bold()));
        output.push_str(&Self::headline(outcome));
        output.push('\n');
        match outcome.final_answer() {
            Some(answer) => output.push_str(answer),
            None => output.push_str(&"(no specialist contribution)".dimmed().to_string()),
        }
        output.push('\n');
        output
    }

    /// Format a health report
    pub fn format_health(report: &HealthReport) -> String {
        let status = match report.status {
            HealthStatus::Healthy => report.status.as_str().green(),
            HealthStatus::Degraded => report.status.as_str().yellow(),
            HealthStatus::Unhealthy => report.status.as_str().red(),
        };
        let mut output = Self::section_header("Health");
        output.push_str(&format!(
            "  status: {}  failure rate: {:.0}%  cache hits: {:.0}%  backlog: {}\n",
            status.bold(),
            report.failure_rate * 100.0,
            report.cache_hit_ratio * 100.0,
            report.backlog
        ));
        output.push_str(&format!(
            "  mean latency: {}ms  budget denials: {}  overruns: {}\n",
            report.mean_latency_ms, report.budget_denials, report.budget_overruns
        ));
        for reason in &report.reasons {
            output.push_str(&format!("  * {}\n", reason));
        }
        output
    }

    fn headline(outcome: &MissionOutcome) -> String {
        let mut output = format!(
            "{} {}\n{} {}\n{} {}   {} {:.2}\n",
            "Goal:".cyan().bold(),
            outcome.mission.goal(),
            "Workspace:".cyan().bold(),
            outcome.mission.workspace_id(),
            "Status:".cyan().bold(),
            Self::status_color(outcome.status).bold(),
            "Quality:".cyan().bold(),
            outcome.quality_score
        );
        let degraded = outcome.degraded_thoughts();
        if degraded > 0 {
            output.push_str(&format!(
                "{}\n",
                format!("{} specialist contributions were fallbacks", degraded).yellow()
            ));
        }
        if !outcome.unaddressed_subtasks.is_empty() {
            let ids: Vec<&str> = outcome.unaddressed_subtasks.iter().map(|id| id.as_str()).collect();
            output.push_str(&format!(
                "{}\n",
                format!("Subtasks never addressed: {}", ids.join(", ")).yellow()
            ));
        }
        if let Some(error) = &outcome.error {
            output.push_str(&format!("{} {}\n", "Stopped:".red().bold(), error));
        }
        output
    }

    fn status_color(status: MissionStatus) -> ColoredString {
        if status.is_degraded() {
            status.as_str().yellow()
        } else if status.is_success() {
            status.as_str().green()
        } else {
            status.as_str().red()
        }
    }

    fn kind_color(kind: MessageKind, tag: &str) -> ColoredString {
        match kind {
            MessageKind::Goal | MessageKind::Plan => tag.cyan().bold(),
            MessageKind::Thought => tag.yellow().bold(),
            MessageKind::Fallback => tag.red().bold(),
            MessageKind::Decision => tag.magenta().bold(),
            MessageKind::System => tag.dimmed(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, outcome: &MissionOutcome) -> String {
        Self::format(outcome)
    }

    fn format_json(&self, outcome: &MissionOutcome) -> String {
        Self::format_json(outcome)
    }

    fn format_summary(&self, outcome: &MissionOutcome) -> String {
        Self::format_summary(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::time::Duration;
    use swarm_domain::{
        CostAccumulator, CouncilThought, Mission, Specialist, SpecialistFailure, SubtaskId,
    };

    fn outcome(status: MissionStatus, thoughts: Vec<CouncilThought>) -> MissionOutcome {
        MissionOutcome {
            mission: Mission::new("bakery", "Plan the spring menu"),
            status,
            messages: Vec::new(),
            evicted_messages: 0,
            context_variables: Map::new(),
            last_agent: Some("qa".to_string()),
            quality_score: 0.82,
            thoughts,
            subtasks: Vec::new(),
            unaddressed_subtasks: Vec::new(),
            cost: CostAccumulator::default(),
            iterations: 3,
            rounds: 2,
            error: None,
        }
    }

    #[test]
    fn test_summary_shows_headline_and_answer() {
        colored::control::set_override(false);
        let thoughts = vec![
            CouncilThought::new(Specialist::Research, 1, "Rhubarb is in season", 0.8),
            CouncilThought::new(Specialist::Qa, 2, "Menu approved", 0.9),
        ];

        let text = ConsoleFormatter::format_summary(&outcome(MissionStatus::Completed, thoughts));

        assert!(text.contains("Goal: Plan the spring menu"));
        assert!(text.contains("Status: completed"));
        assert!(text.contains("Quality: 0.82"));
        assert!(text.ends_with("Menu approved\n"));
    }

    #[test]
    fn test_degraded_outcome_mentions_fallbacks() {
        colored::control::set_override(false);
        let thoughts = vec![
            CouncilThought::new(Specialist::Research, 1, "Rhubarb is in season", 0.8),
            CouncilThought::fallback(
                Specialist::Creative,
                1,
                &SpecialistFailure::TimedOut(Duration::from_secs(90)),
            ),
        ];

        let text = ConsoleFormatter::format(&outcome(MissionStatus::Degraded, thoughts));

        assert!(text.contains("1 specialist contributions were fallbacks"));
        assert!(text.contains("Final Answer"));
        assert!(text.contains("Rhubarb is in season"));
        assert!(text.contains("rounds: 2"));
    }

    #[test]
    fn test_unaddressed_subtasks_are_listed() {
        colored::control::set_override(false);
        let mut outcome = outcome(MissionStatus::Completed, Vec::new());
        outcome.unaddressed_subtasks = vec![SubtaskId::new("2"), SubtaskId::new("4")];

        let text = ConsoleFormatter::format_summary(&outcome);

        assert!(text.contains("Subtasks never addressed: 2, 4"));
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&outcome)).unwrap();
        assert_eq!(json["unaddressed_subtasks"], serde_json::json!(["2", "4"]));
    }

    #[test]
    fn test_json_is_valid() {
        let json = ConsoleFormatter::format_json(&outcome(MissionStatus::TimedOut, Vec::new()));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "timed_out");
        assert_eq!(value["last_agent"], "qa");
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
