//! Async half of the math solver: model clients, configuration and the
//! draft → verify → retry → escalate orchestration loop.
//!
//! The synchronous core (routing, symbolic verification, escalation state)
//! lives in the `reasoner` crate; this crate wires it to real models.

pub mod client;
pub mod config;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod response;
pub mod telemetry;
pub mod vision;

pub use client::OpenAiCompatClient;
pub use config::{ClientSet, SolverConfig};
pub use model::{ChatMessage, ModelCapability, ModelError};
pub use orchestrator::{SolveError, SolveOrchestrator};
pub use response::{HealthReport, SolveRequest, SolveResponse};
pub use vision::{ImageError, ImageInput};
