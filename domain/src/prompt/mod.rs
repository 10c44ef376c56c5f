//! Prompt domain
//!
//! Templates for generating prompts at each stage of a mission.

mod template;

pub use template::PromptTemplate;
