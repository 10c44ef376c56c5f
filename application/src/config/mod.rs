//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`MissionParams`] - orchestration loop control (iterations, timeouts, council)
//! - [`RetryPolicy`] - bounded exponential backoff for transient inference errors
//! - [`BudgetPolicy`] - token ceilings and pricing
//! - [`CachePolicy`] - thought cache sizing

pub mod mission_params;
pub mod policies;

pub use mission_params::MissionParams;
pub use policies::{BudgetPolicy, CachePolicy, RetryPolicy};
