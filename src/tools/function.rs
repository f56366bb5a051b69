//! Closure-backed tools.

use super::schema::ParamShape;
use super::Tool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;
type Handler = Box<dyn Fn(Map<String, Value>) -> HandlerFuture + Send + Sync>;

/// A [`Tool`] built from an async closure.
///
/// Arguments are checked against the declared [`ParamShape`] before the
/// closure runs, and whatever it returns is JSON-encoded.
pub struct FunctionTool {
    name: String,
    description: Option<String>,
    parameters: Option<ParamShape>,
    handler: Handler,
}

impl FunctionTool {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
            handler: Box::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters(mut self, parameters: ParamShape) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn parameters(&self) -> Option<&ParamShape> {
        self.parameters.as_ref()
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let arguments = match &self.parameters {
            Some(shape) => shape.validate(&arguments)?,
            None => match arguments {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };

        let result = (self.handler)(arguments).await?;
        serde_json::to_string(&result).context("Failed to encode tool result")
    }
}
