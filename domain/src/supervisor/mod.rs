//! Supervisor routing decisions.

pub mod routing;

pub use routing::{
    DEFAULT_QUALITY_THRESHOLD, NextAction, RoutingPolicy, SupervisorDecision, SupervisorProposal,
    parse_supervisor_reply,
};
