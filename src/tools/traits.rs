//! Tool trait definition.

use super::schema::ParamShape;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A named capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool identifier. May carry a namespace (`weather::Forecast`); the
    /// serializer strips it and snake-cases the rest.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Declared parameters, in order.
    fn parameters(&self) -> Option<&ParamShape> {
        None
    }

    /// Execute the tool with the raw arguments sent by the model.
    async fn call(&self, arguments: Value) -> Result<String>;
}
