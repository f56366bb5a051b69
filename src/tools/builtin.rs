//! Built-in tools published by `interlink serve`.

use super::function::FunctionTool;
use super::schema::{Attribute, ParamShape, ParamType};
use super::Tool;
use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Every built-in tool, in publication order.
pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(sum_tool()), Arc::new(current_date_tool())]
}

pub fn sum_tool() -> FunctionTool {
    FunctionTool::new("Sum", sum)
        .with_description("Add two numbers.")
        .with_parameters(
            ParamShape::new()
                .attribute(Attribute::new("a", ParamType::Float).required().describe("First addend"))
                .attribute(Attribute::new("b", ParamType::Float).required().describe("Second addend")),
        )
}

pub fn current_date_tool() -> FunctionTool {
    FunctionTool::new("CurrentDate", current_date)
        .with_description(
            "Today's date in UTC.
             Use offset_days to ask for a date relative to today.",
        )
        .with_parameters(ParamShape::new().attribute(
            Attribute::new("offset_days", ParamType::Integer).describe("Days to add (may be negative)"),
        ))
}

async fn sum(args: Map<String, Value>) -> Result<Value> {
    let a = number(&args, "a")?;
    let b = number(&args, "b")?;
    Ok(json!({ "result": a + b }))
}

async fn current_date(args: Map<String, Value>) -> Result<Value> {
    let offset = args.get("offset_days").and_then(Value::as_i64).unwrap_or(0);
    let date = TimeDelta::try_days(offset)
        .and_then(|delta| Utc::now().date_naive().checked_add_signed(delta))
        .with_context(|| format!("offset_days {} is out of range", offset))?;
    Ok(json!({ "date": date.format("%Y-%m-%d").to_string() }))
}

fn number(args: &Map<String, Value>, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .with_context(|| format!("Missing '{}' argument", key))
}
