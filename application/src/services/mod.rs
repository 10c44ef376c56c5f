//! Shared services used by the mission use cases.
//!
//! - [`ThoughtCache`] - memoized inference replies
//! - [`TokenGovernor`] - per-workspace budget ledger
//! - [`FallbackManager`] - fallback values and bounded retries
//! - [`HealthMonitor`] - telemetry-fed health report

pub mod fallback;
pub mod health_monitor;
pub mod thought_cache;
pub mod token_governor;

pub use fallback::FallbackManager;
pub use health_monitor::{HealthMonitor, HealthReport, HealthStatus, HealthThresholds};
pub use thought_cache::{CacheStats, ThoughtCache};
pub use token_governor::{Commit, LedgerTotals, Reservation, TokenGovernor};
