//! Model backend access and the orchestration loop on top of it.

pub mod client;
pub mod orchestrator;
pub mod provider;
pub mod registry;

pub use client::{ChatBackend, ChatClient, ChatRequest, ChatResponse};
pub use orchestrator::Orchestrator;
pub use provider::Provider;
pub use registry::{ToolExecutor, ToolRegistry};
