//! The tool-calling turn loop.
//!
//! Each turn sends the whole session to the backend. Tool calls requested by
//! the model are executed one after another in the order received and their
//! results appended as tool messages; a plain answer with a terminal
//! `finish_reason` ends the loop.

use super::client::{ChatBackend, ChatClient, ChatRequest};
use super::registry::ToolRegistry;
use crate::agent::Session;
use crate::errors::{AgentError, UndefinedTool};
use crate::types::{Message, ToolCall};
use anyhow::anyhow;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

pub struct Orchestrator<B: ChatBackend = ChatClient> {
    session: Session,
    backend: B,
    registry: Option<ToolRegistry>,
}

impl<B: ChatBackend> Orchestrator<B> {
    pub fn new(session: Session, backend: B) -> Self {
        Self {
            session,
            backend,
            registry: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build the tool registry. Runs once; later calls are no-ops.
    ///
    /// Schema and remote listing failures surface here, before any backend
    /// request is made.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        if self.registry.is_none() {
            let registry = ToolRegistry::build(self.session.configuration()).await?;
            info!(
                "Agent '{}' initialized with {} tools",
                self.session.configuration().name,
                registry.len()
            );
            self.registry = Some(registry);
        }
        Ok(())
    }

    /// Append `prompt` as a user message and run until the model answers.
    pub async fn call(&mut self, prompt: impl Into<String>) -> Result<String, AgentError> {
        self.session.add_message(Message::user(prompt));
        self.run().await
    }

    /// Run on the session as it is, for sessions whose last message is
    /// already the input.
    pub async fn resume(&mut self) -> Result<String, AgentError> {
        self.run().await
    }

    async fn run(&mut self) -> Result<String, AgentError> {
        self.initialize().await?;
        let registry = self.registry.take().unwrap_or_default();
        let result = self.run_turns(&registry).await;
        self.registry = Some(registry);
        result
    }

    async fn run_turns(&mut self, registry: &ToolRegistry) -> Result<String, AgentError> {
        let config = self.session.configuration();
        let max_iterations = config.max_iterations;
        let cache = config.cache_tool_results;
        let model = config.llm.model.clone();
        let response_format = config.output_schema.clone().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": schema,
            })
        });
        let tools = registry.serializations();

        let mut iterations = 0;
        loop {
            if let Some(max) = max_iterations {
                if iterations >= max {
                    warn!("Stopping after {} model calls without a final answer", max);
                    return Err(AgentError::IterationLimit(max));
                }
            }
            iterations += 1;

            let request = ChatRequest {
                messages: self.session.all_messages(),
                model: model.clone(),
                tools: tools.clone(),
                response_format: response_format.clone(),
            };

            let choice = self
                .backend
                .chat_completions(request)
                .await?
                .into_first_choice()
                .ok_or(AgentError::EmptyResponse)?;

            match choice.message.tool_calls.filter(|calls| !calls.is_empty()) {
                Some(calls) => {
                    self.session
                        .add_message(Message::assistant_tool_calls(calls.clone()));

                    for call in &calls {
                        let result =
                            execute_tool_call(registry, &mut self.session, call, cache).await;
                        self.session.add_message(Message::tool(call.id.clone(), result));
                    }
                }
                None => {
                    let content = choice.message.content;
                    self.session.add_message(Message::assistant(content.clone()));

                    if is_terminal(choice.finish_reason.as_deref()) {
                        return Ok(content.unwrap_or_default());
                    }
                    debug!(
                        "Non-terminal finish_reason {:?}, continuing",
                        choice.finish_reason
                    );
                }
            }
        }
    }
}

fn is_terminal(finish_reason: Option<&str>) -> bool {
    matches!(finish_reason, None | Some("stop" | "length" | "content_filter"))
}

/// Run one requested call. Failures become `Error: <message>`.
async fn execute_tool_call(
    registry: &ToolRegistry,
    session: &mut Session,
    call: &ToolCall,
    cache: bool,
) -> String {
    let name = &call.function.name;
    let arguments = &call.function.arguments;

    if cache {
        if let Some(result) = session.cached_tool_result(name, arguments) {
            info!("Reusing result of {} for {}", name, arguments);
            return result.to_string();
        }
    }

    match invoke(registry, call).await {
        Ok(result) => {
            info!("Function result: {}", result);
            if cache {
                session.cache_tool_result(name, arguments, &result);
            }
            result
        }
        Err(e) => {
            warn!("Function {} failed: {:#}", name, e);
            format!("Error: {}", e)
        }
    }
}

async fn invoke(registry: &ToolRegistry, call: &ToolCall) -> anyhow::Result<String> {
    let name = &call.function.name;
    let tool = registry
        .get(name)
        .ok_or_else(|| UndefinedTool(name.clone()))?;
    let arguments: Value = call
        .parsed_arguments()
        .map_err(|e| anyhow!("Invalid arguments for {}: {}", name, e))?;

    info!("Calling function {} with {}", name, arguments);
    tool.executor.call(arguments).await
}
