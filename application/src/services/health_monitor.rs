//! Health monitor
//!
//! A [`TelemetrySink`] that keeps per-component counters and condenses them
//! into a [`HealthReport`]: failure rate, backlog (dispatched minus
//! resolved), cache hit ratio, budget pressure, latency and spend.

use crate::ports::telemetry::TelemetrySink;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use swarm_domain::{Component, EventOutcome, TelemetryEvent};

/// Thresholds a [`HealthReport`] is judged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    /// Failure rate at or above which the system is degraded.
    pub degraded_failure_rate: f64,
    /// Failure rate at or above which the system is unhealthy.
    pub unhealthy_failure_rate: f64,
    /// Unresolved dispatches tolerated before the system is degraded.
    pub max_backlog: u64,
    /// Mean latency above which the system is degraded.
    pub max_mean_latency: Duration,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            degraded_failure_rate: 0.2,
            unhealthy_failure_rate: 0.5,
            max_backlog: 32,
            max_mean_latency: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Counters for one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub dispatched: u64,
    pub successes: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
    pub failures: u64,
    pub budget_denials: u64,
    pub budget_overruns: u64,
    pub decisions: u64,
    pub tokens: u64,
    pub cost_usd: f64,
    latency_total_ms: u64,
    latency_samples: u64,
}

impl ComponentStats {
    fn apply(&mut self, event: &TelemetryEvent) {
        match event.outcome {
            EventOutcome::Dispatched => self.dispatched += 1,
            EventOutcome::CacheHit => self.cache_hits += 1,
            EventOutcome::Success => self.successes += 1,
            EventOutcome::Fallback => self.fallbacks += 1,
            EventOutcome::Failure => self.failures += 1,
            EventOutcome::BudgetDenied => self.budget_denials += 1,
            EventOutcome::BudgetOverrun => self.budget_overruns += 1,
            EventOutcome::Decision => self.decisions += 1,
        }
        if event.outcome.resolves_dispatch() {
            self.latency_total_ms += event.latency_ms;
            self.latency_samples += 1;
        }
        self.tokens += event.tokens;
        if event.cost_usd.is_finite() && event.cost_usd > 0.0 {
            self.cost_usd += event.cost_usd;
        }
    }

    pub fn resolved(&self) -> u64 {
        self.cache_hits + self.successes + self.fallbacks + self.failures
    }

    pub fn backlog(&self) -> u64 {
        self.dispatched.saturating_sub(self.resolved())
    }

    pub fn mean_latency(&self) -> Duration {
        if self.latency_samples == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(self.latency_total_ms / self.latency_samples)
        }
    }

    fn merge(&mut self, other: &ComponentStats) {
        self.dispatched += other.dispatched;
        self.successes += other.successes;
        self.cache_hits += other.cache_hits;
        self.fallbacks += other.fallbacks;
        self.failures += other.failures;
        self.budget_denials += other.budget_denials;
        self.budget_overruns += other.budget_overruns;
        self.decisions += other.decisions;
        self.tokens += other.tokens;
        self.cost_usd += other.cost_usd;
        self.latency_total_ms += other.latency_total_ms;
        self.latency_samples += other.latency_samples;
    }
}

/// Point-in-time health summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub failure_rate: f64,
    pub backlog: u64,
    pub cache_hit_ratio: f64,
    pub budget_overruns: u64,
    pub budget_denials: u64,
    pub mean_latency_ms: u64,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    /// Per component label, sorted
    pub components: Vec<(String, ComponentStats)>,
    /// Why the status is not healthy
    pub reasons: Vec<String>,
}

/// Telemetry-fed health monitor.
#[derive(Default)]
pub struct HealthMonitor {
    thresholds: HealthThresholds,
    stats: Mutex<HashMap<Component, ComponentStats>>,
}

impl HealthMonitor {
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self {
            thresholds,
            stats: Mutex::new(HashMap::new()),
        }
    }

    pub fn component(&self, component: Component) -> ComponentStats {
        self.stats.lock().get(&component).copied().unwrap_or_default()
    }

    pub fn report(&self) -> HealthReport {
        let stats = self.stats.lock();

        let mut total = ComponentStats::default();
        for s in stats.values() {
            total.merge(s);
        }

        let mut components: Vec<(String, ComponentStats)> =
            stats.iter().map(|(c, s)| (c.label(), *s)).collect();
        components.sort_by(|a, b| a.0.cmp(&b.0));
        drop(stats);

        let resolved = total.resolved();
        let failure_rate = if resolved == 0 {
            0.0
        } else {
            (total.fallbacks + total.failures) as f64 / resolved as f64
        };
        let cache_hit_ratio = if resolved == 0 {
            0.0
        } else {
            total.cache_hits as f64 / resolved as f64
        };

        let mut status = HealthStatus::Healthy;
        let mut reasons = Vec::new();
        let t = &self.thresholds;

        if failure_rate >= t.unhealthy_failure_rate && resolved > 0 {
            status = HealthStatus::Unhealthy;
            reasons.push(format!("failure rate {:.0}%", failure_rate * 100.0));
        } else if failure_rate >= t.degraded_failure_rate && resolved > 0 {
            status = HealthStatus::Degraded;
            reasons.push(format!("failure rate {:.0}%", failure_rate * 100.0));
        }
        if total.backlog() > t.max_backlog {
            status = status.max_with(HealthStatus::Degraded);
            reasons.push(format!("backlog of {} unresolved calls", total.backlog()));
        }
        if total.budget_denials > 0 {
            status = status.max_with(HealthStatus::Degraded);
            reasons.push(format!("{} budget denials", total.budget_denials));
        }
        if total.mean_latency() > t.max_mean_latency {
            status = status.max_with(HealthStatus::Degraded);
            reasons.push(format!("mean latency {}ms", total.mean_latency().as_millis()));
        }

        HealthReport {
            status,
            failure_rate,
            backlog: total.backlog(),
            cache_hit_ratio,
            budget_overruns: total.budget_overruns,
            budget_denials: total.budget_denials,
            mean_latency_ms: total.mean_latency().as_millis() as u64,
            total_cost_usd: total.cost_usd,
            total_tokens: total.tokens,
            components,
            reasons,
        }
    }
}

impl HealthStatus {
    fn rank(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 2,
        }
    }

    fn max_with(self, other: HealthStatus) -> HealthStatus {
        if other.rank() > self.rank() { other } else { self }
    }
}

impl TelemetrySink for HealthMonitor {
    fn record(&self, event: &TelemetryEvent) {
        self.stats
            .lock()
            .entry(event.component)
            .or_default()
            .apply(event);
    }
}
