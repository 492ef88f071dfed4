//! Text formats: YAML and JSON to node trees and back.
//!
//! Scalars remember whether they were written as strings, numbers,
//! booleans or null, so a document survives a round trip without `200:`
//! turning into `'200':` or `minimum: 1` turning into `minimum: '1'`.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::node::{Node, NodeKind, Scalar, ScalarStyle};

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    /// JSON for `.json` locations, YAML for everything else.
    pub fn from_location(location: &str) -> Self {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        if path.to_ascii_lowercase().ends_with(".json") {
            Format::Json
        } else {
            Format::Yaml
        }
    }

    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(format!("unknown format \"{}\": expected yaml or json", other)),
        }
    }
}

/// Parse text in the given format into a document node.
///
/// # Errors
///
/// Returns `LoadError::InvalidYaml` or `LoadError::InvalidJson`.
pub fn parse(content: &str, format: Format) -> Result<Node, LoadError> {
    match format {
        Format::Yaml => parse_yaml(content),
        Format::Json => parse_json(content),
    }
}

/// Parse YAML text into a document node.
///
/// Anchors are expanded by the parser, so the result never holds aliases.
pub fn parse_yaml(content: &str) -> Result<Node, LoadError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })?;
    Ok(Node::document(from_yaml(value)))
}

/// Parse JSON text into a document node.
pub fn parse_json(content: &str) -> Result<Node, LoadError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;
    Ok(Node::document(from_json(value)))
}

/// Serialize a node tree.
///
/// # Errors
///
/// Returns `LoadError::Emit` for alias nodes or serializer failures.
pub fn emit(node: &Node, format: Format) -> Result<String, LoadError> {
    match format {
        Format::Yaml => {
            let value = to_yaml(node)?;
            serde_yaml::to_string(&value).map_err(|e| LoadError::Emit {
                message: e.to_string(),
            })
        }
        Format::Json => {
            let value = to_json(node)?;
            serde_json::to_string_pretty(&value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| LoadError::Emit {
                    message: e.to_string(),
                })
        }
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<Scalar> {
    use serde_yaml::Value;
    match value {
        Value::Null => Some(Scalar::with_style("null", ScalarStyle::Null)),
        Value::Bool(b) => Some(Scalar::with_style(b.to_string(), ScalarStyle::Bool)),
        Value::Number(n) => {
            let style = if n.is_f64() {
                ScalarStyle::Float
            } else {
                ScalarStyle::Int
            };
            Some(Scalar::with_style(n.to_string(), style))
        }
        Value::String(s) => Some(Scalar::string(s.clone())),
        Value::Tagged(tagged) => yaml_scalar(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn from_yaml(value: serde_yaml::Value) -> Node {
    use serde_yaml::Value;
    match value {
        Value::Sequence(items) => Node::sequence(items.into_iter().map(from_yaml).collect()),
        Value::Mapping(map) => Node::new(NodeKind::Mapping(
            map.into_iter()
                .map(|(k, v)| (yaml_key(&k), from_yaml(v)))
                .collect(),
        )),
        Value::Tagged(tagged) => from_yaml(tagged.value),
        other => Node::scalar(yaml_scalar(&other).unwrap_or_else(|| Scalar::string(""))),
    }
}

/// Keys are scalars; complex keys fall back to their YAML text.
fn yaml_key(key: &serde_yaml::Value) -> Scalar {
    yaml_scalar(key).unwrap_or_else(|| {
        let text = serde_yaml::to_string(key).unwrap_or_default();
        Scalar::string(text.trim_end())
    })
}

fn from_json(value: serde_json::Value) -> Node {
    use serde_json::Value;
    match value {
        Value::Null => Node::scalar(Scalar::with_style("null", ScalarStyle::Null)),
        Value::Bool(b) => Node::scalar(Scalar::with_style(b.to_string(), ScalarStyle::Bool)),
        Value::Number(n) => {
            let style = if n.is_f64() {
                ScalarStyle::Float
            } else {
                ScalarStyle::Int
            };
            Node::scalar(Scalar::with_style(n.to_string(), style))
        }
        Value::String(s) => Node::string(s),
        Value::Array(items) => Node::sequence(items.into_iter().map(from_json).collect()),
        Value::Object(map) => Node::new(NodeKind::Mapping(
            map.into_iter()
                .map(|(k, v)| (Scalar::string(k), from_json(v)))
                .collect(),
        )),
    }
}

fn scalar_to_yaml(scalar: &Scalar) -> serde_yaml::Value {
    use serde_yaml::{Number, Value};
    let text = scalar.value.as_str();
    // keep it a string if the text no longer matches its type
    let typed = match scalar.style {
        ScalarStyle::String => None,
        ScalarStyle::Null => Some(Value::Null),
        ScalarStyle::Bool => text.parse::<bool>().ok().map(Value::Bool),
        ScalarStyle::Int => text
            .parse::<i64>()
            .map(Number::from)
            .or_else(|_| text.parse::<u64>().map(Number::from))
            .ok()
            .map(Value::Number),
        ScalarStyle::Float => parse_float(text).map(|f| Value::Number(Number::from(f))),
    };
    typed.unwrap_or_else(|| Value::String(scalar.value.clone()))
}

/// Float text as written by either YAML (`.inf`, `-.inf`, `.nan`) or Rust.
fn parse_float(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        other => other.parse::<f64>().ok(),
    }
}

fn to_yaml(node: &Node) -> Result<serde_yaml::Value, LoadError> {
    use serde_yaml::Value;
    Ok(match &*node.kind() {
        NodeKind::Document(child) => to_yaml(child)?,
        NodeKind::Sequence(items) => {
            Value::Sequence(items.iter().map(to_yaml).collect::<Result<_, _>>()?)
        }
        NodeKind::Mapping(pairs) => {
            let mut map = serde_yaml::Mapping::new();
            for (key, value) in pairs {
                map.insert(scalar_to_yaml(key), to_yaml(value)?);
            }
            Value::Mapping(map)
        }
        NodeKind::Scalar(scalar) => scalar_to_yaml(scalar),
        NodeKind::Alias(anchor) => {
            return Err(LoadError::Emit {
                message: format!("cannot serialize alias *{}", anchor),
            })
        }
    })
}

fn scalar_to_json(scalar: &Scalar) -> serde_json::Value {
    use serde_json::Value;
    let text = scalar.value.as_str();
    match scalar.style {
        ScalarStyle::String => Value::String(scalar.value.clone()),
        ScalarStyle::Null => Value::Null,
        ScalarStyle::Bool => match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(scalar.value.clone()),
        },
        ScalarStyle::Int | ScalarStyle::Float => {
            serde_json::from_str::<serde_json::Number>(text)
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(scalar.value.clone()))
        }
    }
}

fn to_json(node: &Node) -> Result<serde_json::Value, LoadError> {
    use serde_json::Value;
    Ok(match &*node.kind() {
        NodeKind::Document(child) => to_json(child)?,
        NodeKind::Sequence(items) => {
            Value::Array(items.iter().map(to_json).collect::<Result<_, _>>()?)
        }
        NodeKind::Mapping(pairs) => {
            let mut map = serde_json::Map::new();
            for (key, value) in pairs {
                map.insert(key.value.clone(), to_json(value)?);
            }
            Value::Object(map)
        }
        NodeKind::Scalar(scalar) => scalar_to_json(scalar),
        NodeKind::Alias(anchor) => {
            return Err(LoadError::Emit {
                message: format!("cannot serialize alias *{}", anchor),
            })
        }
    })
}
