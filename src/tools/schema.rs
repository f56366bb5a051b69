//! Typed parameter shapes for tools.
//!
//! A [`ParamShape`] is an ordered list of attributes. It is the only input the
//! serializer needs, and [`ParamShape::validate`] is what local tools use to
//! check the raw arguments sent by the model.

use anyhow::{bail, Result};
use serde_json::{Map, Value};

/// Declared type of a tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    /// Calendar date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    Temporal,
    Enum(Vec<String>),
    Array(Box<ParamType>),
    Object(ParamShape),
    /// A type the schema serializer cannot express. Kept so that declaring it
    /// fails loudly at registration instead of being dropped.
    Unsupported(String),
}

impl ParamType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn array_of(kind: ParamType) -> Self {
        Self::Array(Box::new(kind))
    }

    fn label(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Integer => "integer".into(),
            Self::Float => "float".into(),
            Self::Boolean => "boolean".into(),
            Self::Temporal => "date".into(),
            Self::Enum(values) => format!("one of [{}]", values.join(", ")),
            Self::Array(kind) => format!("array of {}", kind.label()),
            Self::Object(_) => "object".into(),
            Self::Unsupported(name) => name.clone(),
        }
    }
}

/// One named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    pub description: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered parameter declaration for a tool (or a nested object).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamShape {
    attributes: Vec<Attribute>,
}

impl ParamShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Check raw model arguments against the shape.
    ///
    /// Returns only the declared attributes; unknown keys are dropped. A
    /// `null` argument object is treated as empty.
    pub fn validate(&self, arguments: &Value) -> Result<Map<String, Value>> {
        let empty = Map::new();
        let object = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => bail!("arguments must be an object, got {}", other),
        };

        let mut validated = Map::new();
        for attribute in &self.attributes {
            match object.get(&attribute.name) {
                None | Some(Value::Null) => {
                    if attribute.required {
                        bail!("{} is required", attribute.name);
                    }
                }
                Some(value) => {
                    check_type(&attribute.name, &attribute.kind, value)?;
                    validated.insert(attribute.name.clone(), value.clone());
                }
            }
        }
        Ok(validated)
    }
}

fn check_type(path: &str, kind: &ParamType, value: &Value) -> Result<()> {
    let valid = match kind {
        ParamType::String => value.is_string(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Float => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Temporal => value.as_str().is_some_and(is_temporal),
        ParamType::Enum(values) => value
            .as_str()
            .is_some_and(|v| values.iter().any(|allowed| allowed == v)),
        ParamType::Array(item) => match value.as_array() {
            Some(items) => {
                for (index, item_value) in items.iter().enumerate() {
                    check_type(&format!("{path}[{index}]"), item, item_value)?;
                }
                true
            }
            None => false,
        },
        ParamType::Object(shape) => {
            if !value.is_object() {
                bail!("{} must be an object", path);
            }
            shape
                .validate(value)
                .map_err(|e| anyhow::anyhow!("{}.{}", path, e))?;
            true
        }
        ParamType::Unsupported(name) => bail!("{} has unsupported type {}", path, name),
    };

    if !valid {
        bail!("{} must be {}", path, kind.label());
    }
    Ok(())
}

fn is_temporal(text: &str) -> bool {
    chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(text).is_ok()
}
