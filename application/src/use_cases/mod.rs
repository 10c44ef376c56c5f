//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod decompose;
pub mod run_council;
pub mod run_mission;
pub mod supervise;
pub mod shared;

#[cfg(test)]
pub(crate) mod testing;
