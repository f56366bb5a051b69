//! Tool serializer: parameter shapes to JSON-schema wire format.
//!
//! The same [`ToolSerialization`] is published by the MCP server in
//! `tools/list` and, wrapped as a function, sent to the model backend.

use super::schema::{Attribute, ParamShape, ParamType};
use super::Tool;
use crate::errors::{SchemaError, ToolSerializationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Name, description and input schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSerialization {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "inputSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,
}

impl ToolSerialization {
    /// Same tool published under another name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Chat-completions `tools` entry for this tool.
    pub fn function_payload(&self) -> Value {
        let mut function = Map::new();
        function.insert("name".into(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            function.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(schema) = &self.input_schema {
            function.insert("parameters".into(), schema.clone());
        }
        json!({
            "type": "function",
            "function": function,
        })
    }
}

/// Serialize a tool, failing with the tool identifier on any unmapped type.
pub fn serialize(tool: &dyn Tool) -> Result<ToolSerialization, ToolSerializationError> {
    serialize_parts(tool.name(), tool.description(), tool.parameters())
}

pub fn serialize_parts(
    identifier: &str,
    description: Option<&str>,
    parameters: Option<&ParamShape>,
) -> Result<ToolSerialization, ToolSerializationError> {
    let input_schema = parameters
        .map(serialize_shape)
        .transpose()
        .map_err(|source| ToolSerializationError {
            tool: identifier.to_string(),
            source,
        })?;

    Ok(ToolSerialization {
        name: tool_name(identifier),
        description: description.map(normalize_description),
        input_schema,
    })
}

/// `weather::CurrentWeather` -> `current_weather`.
pub fn tool_name(identifier: &str) -> String {
    let base = identifier.rsplit("::").next().unwrap_or(identifier);
    let base = base.rsplit('.').next().unwrap_or(base);
    let chars: Vec<char> = base.chars().collect();

    let mut name = String::with_capacity(base.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c.is_whitespace() {
            if !name.is_empty() && !name.ends_with('_') {
                name.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !name.ends_with('_') {
                    name.push('_');
                }
            }
            name.extend(c.to_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

/// Collapse a multi-line description into one trimmed line.
pub fn normalize_description(description: &str) -> String {
    description
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn serialize_shape(shape: &ParamShape) -> Result<Value, SchemaError> {
    let mut properties = Map::new();
    for attribute in shape.attributes() {
        let schema = serialize_attribute(attribute).map_err(|source| SchemaError::Attribute {
            attribute: attribute.name.clone(),
            source: Box::new(source),
        })?;
        properties.insert(attribute.name.clone(), Value::Object(schema));
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));

    let required: Vec<Value> = shape
        .attributes()
        .iter()
        .filter(|a| a.required)
        .map(|a| Value::String(a.name.clone()))
        .collect();
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }

    Ok(Value::Object(schema))
}

fn serialize_attribute(attribute: &Attribute) -> Result<Map<String, Value>, SchemaError> {
    let mut schema = Map::new();
    if let Some(description) = &attribute.description {
        schema.insert(
            "description".into(),
            Value::String(normalize_description(description)),
        );
    }

    if let Value::Object(fragment) = serialize_type(&attribute.kind)? {
        schema.extend(fragment);
    }

    if let ParamType::Enum(values) = &attribute.kind {
        let values = values.join(", ");
        let description = match schema.get("description").and_then(Value::as_str) {
            Some(existing) => format!("{existing} ({values})"),
            None => values,
        };
        schema.insert("description".into(), Value::String(description));
    }

    Ok(schema)
}

fn serialize_type(kind: &ParamType) -> Result<Value, SchemaError> {
    Ok(match kind {
        ParamType::String => json!({"type": "string"}),
        ParamType::Integer => json!({"type": "integer"}),
        ParamType::Float => json!({"type": "number"}),
        ParamType::Boolean => json!({"type": "boolean"}),
        ParamType::Temporal => json!({"type": "string", "format": "date"}),
        ParamType::Enum(values) => json!({"type": "string", "enum": values}),
        ParamType::Array(item) => json!({
            "type": "array",
            "items": serialize_type(item)?,
        }),
        ParamType::Object(shape) => serialize_shape(shape)?,
        ParamType::Unsupported(name) => return Err(SchemaError::Unsupported(name.clone())),
    })
}
