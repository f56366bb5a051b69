//! Model Context Protocol over JSON-RPC 2.0: a client for remote tool
//! catalogs and a server exposing local tools.

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::McpClient;
pub use error::{McpError, RegistrationError};
pub use server::McpServer;
