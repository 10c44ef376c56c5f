//! Inference gateway adapters
//!
//! Implementations of the [`InferenceGateway`] port:
//!
//! - [`OpenAiCompatibleGateway`] - HTTP chat completions (OpenAI, vLLM, Ollama, LM Studio)
//! - [`OfflineGateway`] - Deterministic canned replies for dry runs
//!
//! [`InferenceGateway`]: swarm_application::InferenceGateway

mod offline;
mod openai;

pub use offline::OfflineGateway;
pub use openai::OpenAiCompatibleGateway;
