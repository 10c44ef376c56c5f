//! Core domain concepts shared across all subdomains.
//!
//! - [`ids::WorkspaceId`] / [`ids::MissionId`] - identifiers
//! - [`error::DomainError`] - domain-level errors and the failure taxonomy

pub mod error;
pub mod ids;
