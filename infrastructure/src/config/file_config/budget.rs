//! Budget configuration from TOML (`[budget]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_application::BudgetPolicy;
use swarm_domain::{Pricing, WorkspaceId};

/// Token ceilings and pricing.
///
/// # Example
///
/// ```toml
/// [budget]
/// default_ceiling = 200000
/// prompt_usd_per_1k = 0.0005
/// completion_usd_per_1k = 0.0015
///
/// [budget.workspaces]
/// acme = 50000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBudgetConfig {
    /// Ceiling for workspaces without an override
    pub default_ceiling: u64,
    /// Per-workspace ceilings
    pub workspaces: BTreeMap<String, u64>,
    pub prompt_usd_per_1k: f64,
    pub completion_usd_per_1k: f64,
}

impl Default for FileBudgetConfig {
    fn default() -> Self {
        let policy = BudgetPolicy::default();
        Self {
            default_ceiling: policy.default_ceiling,
            workspaces: BTreeMap::new(),
            prompt_usd_per_1k: policy.pricing.prompt_per_1k,
            completion_usd_per_1k: policy.pricing.completion_per_1k,
        }
    }
}

impl FileBudgetConfig {
    /// Convert to [`BudgetPolicy`]. Negative prices are reported and
    /// replaced by the default pricing.
    pub fn to_budget_policy(&self) -> (BudgetPolicy, Vec<ConfigValidationError>) {
        let mut issues = Vec::new();

        let pricing = if self.prompt_usd_per_1k < 0.0 || self.completion_usd_per_1k < 0.0 {
            issues.push(ConfigValidationError::invalid(
                "budget",
                "prices per 1k tokens cannot be negative",
            ));
            Pricing::default()
        } else {
            Pricing {
                prompt_per_1k: self.prompt_usd_per_1k,
                completion_per_1k: self.completion_usd_per_1k,
            }
        };

        let mut policy = BudgetPolicy::default()
            .with_default_ceiling(self.default_ceiling)
            .with_pricing(pricing);
        for (workspace, ceiling) in &self.workspaces {
            if workspace.trim().is_empty() {
                issues.push(ConfigValidationError::invalid(
                    "budget.workspaces",
                    "workspace id cannot be empty",
                ));
                continue;
            }
            policy = policy.with_workspace_ceiling(WorkspaceId::new(workspace.as_str()), *ceiling);
        }

        (policy, issues)
    }
}
