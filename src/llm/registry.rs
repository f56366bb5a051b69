//! Per-orchestrator tool registry.
//!
//! Maps wire names to an executor plus the precomputed function payload sent
//! to the backend. Local tools come first, then each configured MCP server's
//! tools as `<server-key>_<tool-name>`.

use crate::agent::AgentConfiguration;
use crate::errors::AgentError;
use crate::mcp::McpClient;
use crate::tools::{serializer, Tool};
use anyhow::{bail, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// How a registered tool is executed.
pub enum ToolExecutor {
    /// In-process tool.
    Local(Arc<dyn Tool>),
    /// Tool living on a remote MCP server, addressed by its remote name.
    Remote {
        client: Arc<McpClient>,
        tool_name: String,
    },
}

impl ToolExecutor {
    pub async fn call(&self, arguments: Value) -> Result<String> {
        match self {
            Self::Local(tool) => {
                let tool = Arc::clone(tool);
                let name = tool.name().to_string();
                match tokio::spawn(async move { tool.call(arguments).await }).await {
                    Ok(result) => result,
                    Err(join) if join.is_panic() => bail!("Tool {} panicked", name),
                    Err(join) => Err(join.into()),
                }
            }
            Self::Remote { client, tool_name } => Ok(client.call_tool(tool_name, arguments).await?),
        }
    }
}

impl std::fmt::Debug for ToolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(tool) => f.debug_tuple("Local").field(&tool.name()).finish(),
            Self::Remote { client, tool_name } => f
                .debug_struct("Remote")
                .field("url", &client.url())
                .field("tool_name", tool_name)
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct RegisteredTool {
    pub executor: ToolExecutor,
    pub serialization: Value,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    entries: Vec<(String, RegisteredTool)>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Serialize local tools and list every configured MCP server.
    pub async fn build(configuration: &AgentConfiguration) -> Result<Self, AgentError> {
        let mut registry = Self::default();

        for tool in &configuration.tools {
            let serialization = serializer::serialize(tool.as_ref())?;
            registry.insert(
                serialization.name.clone(),
                RegisteredTool {
                    executor: ToolExecutor::Local(tool.clone()),
                    serialization: serialization.function_payload(),
                },
            )?;
        }

        for (server, settings) in &configuration.mcp_servers {
            let client = Arc::new(McpClient::new(&settings.url, settings.allowed_tools.clone()));
            let remote_tools = client
                .list_tools()
                .await
                .map_err(|source| AgentError::McpServer {
                    server: server.clone(),
                    source,
                })?;

            info!("Loaded {} tools from MCP server '{}'", remote_tools.len(), server);

            for remote in remote_tools {
                let name = format!("{}_{}", server, remote.name);
                let tool_name = remote.name.clone();
                registry.insert(
                    name.clone(),
                    RegisteredTool {
                        executor: ToolExecutor::Remote {
                            client: client.clone(),
                            tool_name,
                        },
                        serialization: remote.renamed(name).function_payload(),
                    },
                )?;
            }
        }

        debug!("Tool registry ready: {:?}", registry.names());
        Ok(registry)
    }

    pub fn insert(&mut self, name: String, tool: RegisteredTool) -> Result<(), AgentError> {
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, tool));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Function payloads in registration order.
    pub fn serializations(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|(_, tool)| tool.serialization.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
