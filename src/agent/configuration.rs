//! Immutable description of an agent: identity, instructions, backend
//! selection, local tools, remote MCP servers and output contract.

use crate::config::{AgentSettings, McpServerSettings};
use crate::llm::Provider;
use crate::tools::Tool;
use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Which backend serves the agent and with what credentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmConfiguration {
    pub provider: Provider,
    /// Falls back to the transport's default model.
    pub model: Option<String>,
    /// Falls back to the transport's process-wide key.
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct AgentConfiguration {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub llm: LlmConfiguration,
    pub tools: Vec<Arc<dyn Tool>>,
    /// Iterated in key order when the tool registry is built.
    pub mcp_servers: BTreeMap<String, McpServerSettings>,
    pub output_schema: Option<Value>,
    /// Backend calls allowed per prompt. `None` disables the cap.
    pub max_iterations: Option<usize>,
    pub cache_tool_results: bool,
}

pub const DEFAULT_MAX_ITERATIONS: usize = 25;

impl AgentConfiguration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name: name.into(),
            instructions: String::new(),
            llm: LlmConfiguration::default(),
            tools: Vec::new(),
            mcp_servers: BTreeMap::new(),
            output_schema: None,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            cache_tool_results: false,
        }
    }

    /// Build from the `[agent]` section of the config file.
    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        let provider = settings
            .provider
            .parse::<Provider>()
            .with_context(|| format!("agent '{}'", settings.name))?;

        let output_schema = settings
            .output_schema
            .as_ref()
            .map(|source| source.resolve())
            .transpose()
            .context("Invalid output_schema JSON")?;

        Ok(Self {
            instructions: settings.instructions.clone(),
            llm: LlmConfiguration {
                provider,
                model: settings.model.clone(),
                api_key: settings.api_key.clone(),
            },
            mcp_servers: settings.mcp_servers.clone(),
            output_schema,
            max_iterations: (settings.max_iterations > 0).then_some(settings.max_iterations),
            cache_tool_results: settings.cache_tool_results,
            ..Self::new(settings.name.clone())
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.llm.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.llm.api_key = Some(api_key.into());
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn with_mcp_server(mut self, key: impl Into<String>, server: McpServerSettings) -> Self {
        self.mcp_servers.insert(key.into(), server);
        self
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Parse the output schema from JSON text.
    pub fn with_output_schema_json(self, schema: &str) -> Result<Self> {
        let schema = serde_json::from_str(schema).context("Invalid output_schema JSON")?;
        Ok(self.with_output_schema(schema))
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tool_cache(mut self, enabled: bool) -> Self {
        self.cache_tool_results = enabled;
        self
    }
}

impl fmt::Debug for AgentConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfiguration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("llm.provider", &self.llm.provider)
            .field("llm.model", &self.llm.model)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("mcp_servers", &self.mcp_servers.keys().collect::<Vec<_>>())
            .field("output_schema", &self.output_schema.is_some())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}
