//! Progress reporting for mission execution

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use swarm_application::MissionProgress;
use swarm_domain::{
    CouncilRound, CouncilThought, Mission, MissionStatus, OrchestrationStatus, SubtaskSpec,
    SupervisorDecision,
};

/// Reports progress with one bar per council round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn line(&self, text: String) {
        let _ = self.multi.println(text);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn thought_mark(thought: &CouncilThought) -> String {
    if thought.degraded {
        format!("{} {}", "x".red(), thought.specialist.display_name())
    } else {
        format!("{} {}", "v".green(), thought.specialist.display_name())
    }
}

impl MissionProgress for ProgressReporter {
    fn on_decomposed(&self, mission: &Mission, subtasks: &[SubtaskSpec]) {
        self.line(format!(
            "{} {} ({} subtasks)",
            "->".cyan(),
            mission.goal().bold(),
            subtasks.len()
        ));
    }

    fn on_round_start(&self, round: usize, status: OrchestrationStatus, specialists: usize) {
        let pb = self.multi.add(ProgressBar::new(specialists as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {} ({})", round, status.display_name()));
        pb.set_message("thinking...");
        *self.round_bar.lock() = Some(pb);
    }

    fn on_specialist_done(&self, thought: &CouncilThought) {
        if let Some(pb) = self.round_bar.lock().as_ref() {
            pb.set_message(thought_mark(thought));
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, round: &CouncilRound) {
        if let Some(pb) = self.round_bar.lock().take() {
            pb.finish_with_message(format!("consensus {:.2}", round.consensus).green().to_string());
        }
    }

    fn on_decision(&self, decision: &SupervisorDecision) {
        self.line(format!(
            "  {} {} ({})",
            "supervisor:".magenta(),
            decision.next_status.display_name(),
            decision.rationale.dimmed()
        ));
    }

    fn on_mission_finished(&self, status: MissionStatus) {
        if let Some(pb) = self.round_bar.lock().take() {
            pb.abandon_with_message(status.as_str().to_string());
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl MissionProgress for SimpleProgress {
    fn on_decomposed(&self, mission: &Mission, subtasks: &[SubtaskSpec]) {
        println!(
            "{} {} ({} subtasks)",
            "->".cyan(),
            mission.goal().bold(),
            subtasks.len()
        );
    }

    fn on_round_start(&self, round: usize, status: OrchestrationStatus, specialists: usize) {
        println!(
            "{} Round {} ({}, {} specialists)",
            "->".cyan(),
            round,
            status.display_name().bold(),
            specialists
        );
    }

    fn on_specialist_done(&self, thought: &CouncilThought) {
        println!("  {}", thought_mark(thought));
    }

    fn on_round_complete(&self, round: &CouncilRound) {
        println!("  consensus {:.2}\n", round.consensus);
    }

    fn on_decision(&self, decision: &SupervisorDecision) {
        println!(
            "  {} {}",
            "supervisor:".magenta(),
            decision.next_status.display_name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_domain::{Specialist, SpecialistFailure};

    #[test]
    fn test_thought_mark_flags_fallbacks() {
        colored::control::set_override(false);
        let ok = CouncilThought::new(Specialist::Strategy, 1, "position on price", 0.7);
        let failed = CouncilThought::fallback(
            Specialist::Operator,
            1,
            &SpecialistFailure::Aborted("specialist panicked".into()),
        );
        assert_eq!(thought_mark(&ok), "v Strategist");
        assert_eq!(thought_mark(&failed), "x Operator");
    }

    #[test]
    fn test_reporter_tracks_one_round() {
        let reporter = ProgressReporter::new();
        reporter.on_round_start(1, OrchestrationStatus::Researching, 2);
        reporter.on_specialist_done(&CouncilThought::new(Specialist::Research, 1, "a", 0.8));
        assert_eq!(
            reporter.round_bar.lock().as_ref().map(|pb| pb.position()),
            Some(1)
        );

        let round = CouncilRound::new(
            1,
            OrchestrationStatus::Researching,
            vec![CouncilThought::new(Specialist::Research, 1, "a", 0.8)],
        );
        reporter.on_round_complete(&round);
        assert!(reporter.round_bar.lock().is_none());
    }
}
