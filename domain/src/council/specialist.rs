//! Specialist roles of the council.
//!
//! The council is a closed set: every round fans out over a subset of
//! [`Specialist::ALL`], and every `match` on a specialist is exhaustive.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A specialist variant participating in council rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialist {
    /// Gathers facts, market signals and open questions
    Research,
    /// Turns findings into positioning and priorities
    Strategy,
    /// Produces copy, concepts and other content artifacts
    Creative,
    /// Plans concrete action sequences and owners
    Operator,
    /// Checks outputs against success criteria
    Qa,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown specialist type: {0}")]
pub struct UnknownSpecialist(pub String);

impl Specialist {
    /// Registration order used for stable blackboard ordering.
    pub const ALL: [Specialist; 5] = [
        Specialist::Research,
        Specialist::Strategy,
        Specialist::Creative,
        Specialist::Operator,
        Specialist::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialist::Research => "research",
            Specialist::Strategy => "strategy",
            Specialist::Creative => "creative",
            Specialist::Operator => "operator",
            Specialist::Qa => "qa",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Specialist::Research => "Research Analyst",
            Specialist::Strategy => "Strategist",
            Specialist::Creative => "Creative Lead",
            Specialist::Operator => "Operator",
            Specialist::Qa => "QA Reviewer",
        }
    }

    /// Position in [`Specialist::ALL`].
    pub fn registration_index(&self) -> usize {
        match self {
            Specialist::Research => 0,
            Specialist::Strategy => 1,
            Specialist::Creative => 2,
            Specialist::Operator => 3,
            Specialist::Qa => 4,
        }
    }

    /// Cache role key for this specialist.
    pub fn cache_role(&self) -> String {
        format!("specialist:{}", self.as_str())
    }
}

impl std::fmt::Display for Specialist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Specialist {
    type Err = UnknownSpecialist;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "research" | "researcher" | "research_analyst" | "analyst" => Ok(Specialist::Research),
            "strategy" | "strategist" | "planner" => Ok(Specialist::Strategy),
            "creative" | "writer" | "copywriter" | "content" => Ok(Specialist::Creative),
            "operator" | "ops" | "operations" | "executor" => Ok(Specialist::Operator),
            "qa" | "qa_reviewer" | "reviewer" | "quality" | "critic" => Ok(Specialist::Qa),
            _ => Err(UnknownSpecialist(s.to_string())),
        }
    }
}
