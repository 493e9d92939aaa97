use std::fmt;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// Keys whose presence at a document root marks it as a bare JSON Schema document.
pub const JSON_SCHEMA_KEYS: [&str; 9] = [
    "$id",
    "allOf",
    "anyOf",
    "oneOf",
    "enum",
    "not",
    "properties",
    "title",
    "type",
];

/// The OpenAPI dialect a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpenApiVersion {
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "3.0")]
    V3_0,
    #[serde(rename = "3.1")]
    V3_1,
}

impl OpenApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenApiVersion::V2_0 => "2.0",
            OpenApiVersion::V3_0 => "3.0",
            OpenApiVersion::V3_1 => "3.1",
        }
    }
}

impl fmt::Display for OpenApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Info object describing the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub description: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub version: String,
}

/// Tag definition. A tag without a `name` keeps an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub description: Option<String>,
}

/// Typed view of the top-level metadata of a document. Everything below the
/// root is read through [`super::Node`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentHeader {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub openapi: Option<String>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_string"
    )]
    pub swagger: Option<String>,

    pub info: Info,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// OpenAPI 2.0 document-level request media types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,

    /// OpenAPI 2.0 document-level response media types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
}

/// A loaded OpenAPI (or bare JSON Schema) document.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiDocument {
    pub file: String,
    pub version: OpenApiVersion,
    pub header: DocumentHeader,
    pub root: Value,
}

impl OpenApiDocument {
    /// Only the version fields can reject a document. Metadata that does not
    /// fit [`DocumentHeader`] is dropped with a warning.
    pub fn from_value(file: impl Into<String>, root: Value) -> Result<Self, ParseError> {
        let file = file.into();
        let version = detect_version(&root)?;
        let header = if root.is_object() {
            DocumentHeader::deserialize(&root).unwrap_or_else(|err| {
                warn!("{}: ignoring malformed document header: {}", file, err);
                DocumentHeader::default()
            })
        } else {
            DocumentHeader::default()
        };
        Ok(Self {
            file,
            version,
            header,
            root,
        })
    }
}

fn detect_version(root: &Value) -> Result<OpenApiVersion, ParseError> {
    if let Some(swagger) = root.get("swagger").and_then(scalar_string) {
        return if swagger.starts_with("2.") {
            Ok(OpenApiVersion::V2_0)
        } else {
            Err(ParseError::UnsupportedVersion(swagger))
        };
    }
    if let Some(openapi) = root.get("openapi").and_then(scalar_string) {
        return if openapi.starts_with("3.0") {
            Ok(OpenApiVersion::V3_0)
        } else if openapi.starts_with("3.") {
            Ok(OpenApiVersion::V3_1)
        } else {
            Err(ParseError::UnsupportedVersion(openapi))
        };
    }
    if is_json_schema(root) {
        return Ok(OpenApiVersion::V3_1);
    }
    Err(ParseError::UnsupportedVersion(
        "missing `openapi` or `swagger` field".to_string(),
    ))
}

/// Text form of a scalar. YAML reads `version: 1.0` or `swagger: 2.0` as
/// numbers.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(lenient_optional_string(deserializer)?.unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_string(&value))
}

/// Whether a value carries any JSON-Schema-shaped key.
pub fn is_json_schema(value: &Value) -> bool {
    JSON_SCHEMA_KEYS.iter().any(|key| value.get(key).is_some())
}
