//! Token governor: the budget ledger.
//!
//! One shard per workspace in a [`DashMap`]; every check, reservation and
//! commit happens under that shard's lock, so concurrent missions sharing a
//! workspace can never jointly reserve past its ceiling.
//!
//! ```text
//! try_reserve ──▶ Reservation ──┬──▶ commit(actual)  → ledger entry (+ overrun signal)
//!                               └──▶ release()       → headroom returned
//! ```

use crate::config::BudgetPolicy;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use swarm_domain::{BudgetExceeded, LedgerEntry, TokenUsage, WorkspaceId};
use tracing::{debug, warn};

/// Reserved headroom for one pending call. Consumed by
/// [`TokenGovernor::commit`] or [`TokenGovernor::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be committed or released"]
pub struct Reservation {
    id: u64,
    workspace_id: WorkspaceId,
    tokens: u64,
    label: String,
}

impl Reservation {
    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }
}

/// Result of converting a reservation into recorded usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub entry: LedgerEntry,
    /// Tokens used beyond the reservation, if any.
    pub overrun: Option<u64>,
}

/// Per-workspace totals.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LedgerTotals {
    pub tokens_used: u64,
    pub reserved: u64,
    pub cost_usd: f64,
    pub entries: usize,
    pub overruns: u64,
    pub ceiling: u64,
}

impl LedgerTotals {
    pub fn remaining(&self) -> u64 {
        self.ceiling
            .saturating_sub(self.tokens_used.saturating_add(self.reserved))
    }
}

#[derive(Debug)]
struct WorkspaceLedger {
    ceiling: u64,
    used: u64,
    reserved: u64,
    cost_usd: f64,
    overruns: u64,
    entries: Vec<LedgerEntry>,
}

impl WorkspaceLedger {
    fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            used: 0,
            reserved: 0,
            cost_usd: 0.0,
            overruns: 0,
            entries: Vec::new(),
        }
    }

    fn committed_or_reserved(&self) -> u64 {
        self.used.saturating_add(self.reserved)
    }

    fn has_headroom(&self) -> bool {
        self.committed_or_reserved() < self.ceiling
    }

    fn append(&mut self, entry: LedgerEntry) {
        self.used = self.used.saturating_add(entry.tokens_used);
        self.cost_usd += entry.cost_usd;
        self.entries.push(entry);
    }

    fn totals(&self) -> LedgerTotals {
        LedgerTotals {
            tokens_used: self.used,
            reserved: self.reserved,
            cost_usd: self.cost_usd,
            entries: self.entries.len(),
            overruns: self.overruns,
            ceiling: self.ceiling,
        }
    }
}

/// Shared, concurrency-safe budget ledger.
pub struct TokenGovernor {
    policy: BudgetPolicy,
    ledgers: DashMap<WorkspaceId, WorkspaceLedger>,
    next_reservation: AtomicU64,
}

impl TokenGovernor {
    pub fn new(policy: BudgetPolicy) -> Self {
        Self {
            policy,
            ledgers: DashMap::new(),
            next_reservation: AtomicU64::new(1),
        }
    }

    pub fn policy(&self) -> &BudgetPolicy {
        &self.policy
    }

    /// Whether `workspace` still has headroom (`used + reserved < ceiling`).
    ///
    /// Unknown workspaces are checked against their configured ceiling, which
    /// defaults to the policy's default ceiling.
    pub fn check_budget(&self, workspace: &WorkspaceId) -> bool {
        match self.ledgers.get(workspace) {
            Some(ledger) => ledger.has_headroom(),
            None => self.policy.ceiling_for(workspace) > 0,
        }
    }

    /// Reserve `estimate` tokens of headroom.
    ///
    /// Fails when the remaining headroom cannot cover the whole estimate;
    /// a reservation is never shrunk to fit.
    pub fn try_reserve(
        &self,
        workspace: &WorkspaceId,
        estimate: u64,
        label: impl Into<String>,
    ) -> Result<Reservation, BudgetExceeded> {
        let mut ledger = self
            .ledgers
            .entry(workspace.clone())
            .or_insert_with(|| WorkspaceLedger::new(self.policy.ceiling_for(workspace)));

        let tokens = estimate.max(1);
        let remaining = ledger.ceiling.saturating_sub(ledger.committed_or_reserved());
        if remaining < tokens {
            return Err(BudgetExceeded {
                workspace_id: workspace.to_string(),
                used: ledger.used,
                ceiling: ledger.ceiling,
            });
        }
        ledger.reserved += tokens;

        let reservation = Reservation {
            id: self.next_reservation.fetch_add(1, Ordering::Relaxed),
            workspace_id: workspace.clone(),
            tokens,
            label: label.into(),
        };
        debug!(
            "Reserved {} tokens for {} in workspace {} (reservation #{})",
            tokens, reservation.label, workspace, reservation.id
        );
        Ok(reservation)
    }

    /// Convert a reservation into recorded usage.
    ///
    /// Usage beyond the reservation is recorded in full and reported as an
    /// overrun.
    pub fn commit(&self, reservation: Reservation, usage: TokenUsage) -> Commit {
        let actual = usage.total();
        let cost = self.policy.pricing.cost_of(usage);
        let entry = LedgerEntry::new(
            reservation.workspace_id.clone(),
            actual,
            cost,
            reservation.label.clone(),
        );

        let mut ledger = self
            .ledgers
            .entry(reservation.workspace_id.clone())
            .or_insert_with(|| {
                WorkspaceLedger::new(self.policy.ceiling_for(&reservation.workspace_id))
            });
        ledger.reserved = ledger.reserved.saturating_sub(reservation.tokens);

        let overrun = (actual > reservation.tokens).then(|| actual - reservation.tokens);
        if let Some(over) = overrun {
            ledger.overruns += 1;
            warn!(
                "Budget overrun in workspace {}: {} used {} tokens, {} over its reservation",
                reservation.workspace_id, reservation.label, actual, over
            );
        }
        ledger.append(entry.clone());

        Commit { entry, overrun }
    }

    /// Return reserved headroom after a failed call.
    pub fn release(&self, reservation: Reservation) {
        if let Some(mut ledger) = self.ledgers.get_mut(&reservation.workspace_id) {
            ledger.reserved = ledger.reserved.saturating_sub(reservation.tokens);
        }
        debug!("Released reservation #{}", reservation.id);
    }

    /// Append a ledger entry directly, outside the reservation protocol.
    pub fn record_usage(&self, workspace: &WorkspaceId, tokens: u64, cost_usd: f64) -> LedgerEntry {
        let entry = LedgerEntry::new(workspace.clone(), tokens, cost_usd, "direct");
        self.ledgers
            .entry(workspace.clone())
            .or_insert_with(|| WorkspaceLedger::new(self.policy.ceiling_for(workspace)))
            .append(entry.clone());
        entry
    }

    pub fn total(&self, workspace: &WorkspaceId) -> LedgerTotals {
        self.ledgers
            .get(workspace)
            .map(|ledger| ledger.totals())
            .unwrap_or_else(|| LedgerTotals {
                ceiling: self.policy.ceiling_for(workspace),
                ..LedgerTotals::default()
            })
    }

    pub fn entries(&self, workspace: &WorkspaceId) -> Vec<LedgerEntry> {
        self.ledgers
            .get(workspace)
            .map(|ledger| ledger.entries.clone())
            .unwrap_or_default()
    }

    /// The error to report for `workspace` once it is out of headroom.
    pub fn exceeded(&self, workspace: &WorkspaceId) -> BudgetExceeded {
        let totals = self.total(workspace);
        BudgetExceeded {
            workspace_id: workspace.to_string(),
            used: totals.tokens_used,
            ceiling: totals.ceiling,
        }
    }
}
