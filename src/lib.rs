//! Interlink: tool-calling agent core.
//!
//! Drives an OpenAI-compatible chat backend through tool-calling turns,
//! pulls remote tools from MCP servers and exposes local tools over MCP.

pub mod agent;
pub mod config;
pub mod errors;
pub mod llm;
pub mod mcp;
pub mod tools;
pub mod types;
