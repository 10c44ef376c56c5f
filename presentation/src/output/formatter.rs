//! Output formatter trait

use swarm_domain::MissionOutcome;

/// Trait for formatting mission outcomes
pub trait OutputFormatter {
    /// Format the complete outcome
    fn format(&self, outcome: &MissionOutcome) -> String;

    /// Format as JSON
    fn format_json(&self, outcome: &MissionOutcome) -> String;

    /// Format the headline only (concise output)
    fn format_summary(&self, outcome: &MissionOutcome) -> String;
}
