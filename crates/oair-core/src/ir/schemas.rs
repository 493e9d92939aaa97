use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::Value;

use super::types::SchemaId;
use crate::parse::SourceLocation;

/// A schema in the IR. One instance exists per source location.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSchema {
    pub id: String,
    pub src: SourceLocation,
    /// The schema this one was dereferenced from (`$ref` with sibling keys).
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_schema: Option<SchemaId>,
    pub name: String,
    pub is_name_generated: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    pub accessibility: ApiSchemaAccessibility,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(rename = "const")]
    pub const_value: Option<Value>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub nullable: bool,
    pub required: IndexSet<String>,
    pub custom: IndexMap<String, Value>,
    pub not: Option<SchemaId>,
    pub discriminator: Option<ApiSchemaDiscriminator>,
    /// Discriminated schemas this schema is a variant of.
    pub inherited_schemas: Vec<SchemaId>,
    #[serde(flatten)]
    pub kind: ApiSchemaKind,
}

impl ApiSchema {
    pub(crate) fn new(id: String, src: SourceLocation, name: String, is_name_generated: bool) -> Self {
        Self {
            id,
            src,
            ref_schema: None,
            name,
            is_name_generated,
            description: None,
            deprecated: false,
            accessibility: ApiSchemaAccessibility::All,
            enum_values: None,
            const_value: None,
            default: None,
            example: None,
            nullable: false,
            required: IndexSet::new(),
            custom: IndexMap::new(),
            not: None,
            discriminator: None,
            inherited_schemas: Vec::new(),
            kind: ApiSchemaKind::Unknown(ObjectSchema::default()),
        }
    }

    /// Object-shaped fields, for every kind that carries them.
    pub fn object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            ApiSchemaKind::Object(object)
            | ApiSchemaKind::Combined(object)
            | ApiSchemaKind::Unknown(object) => Some(object),
            ApiSchemaKind::MultiType(multi) => Some(&multi.object),
            _ => None,
        }
    }

    /// Looks up a property schema by name.
    pub fn property(&self, name: &str) -> Option<SchemaId> {
        self.object()
            .and_then(|object| object.properties.get(name))
            .map(|property| property.schema)
    }

    /// The `type` keyword after normalization: the kind name for single-typed
    /// schemas, every non-null type for multi-type schemas.
    pub fn type_names(&self) -> Vec<&str> {
        match &self.kind {
            ApiSchemaKind::MultiType(multi) => multi.types.iter().map(String::as_str).collect(),
            ApiSchemaKind::String(_)
            | ApiSchemaKind::Number(_)
            | ApiSchemaKind::Integer(_)
            | ApiSchemaKind::Array(_)
            | ApiSchemaKind::Boolean
            | ApiSchemaKind::Null
            | ApiSchemaKind::Object(_) => vec![self.kind.name()],
            _ => Vec::new(),
        }
    }
}

/// Which directions of data flow a schema participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiSchemaAccessibility {
    All,
    ReadOnly,
    WriteOnly,
    None,
}

/// The closed set of schema shapes, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    OneOf,
    MultiType,
    String,
    Number,
    Integer,
    Array,
    Boolean,
    Null,
    Object,
    Combined,
    Unknown,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::OneOf => "oneOf",
            SchemaKind::MultiType => "multi-type",
            SchemaKind::String => "string",
            SchemaKind::Number => "number",
            SchemaKind::Integer => "integer",
            SchemaKind::Array => "array",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Object => "object",
            SchemaKind::Combined => "combined",
            SchemaKind::Unknown => "unknown",
        }
    }

    /// Kind for a single JSON Schema `type` keyword value.
    pub fn from_type(value: &str) -> SchemaKind {
        match value {
            "string" => SchemaKind::String,
            "number" => SchemaKind::Number,
            "integer" => SchemaKind::Integer,
            "array" => SchemaKind::Array,
            "boolean" => SchemaKind::Boolean,
            "null" => SchemaKind::Null,
            "object" => SchemaKind::Object,
            _ => SchemaKind::Unknown,
        }
    }
}

/// A schema's kind together with the fields specific to it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ApiSchemaKind {
    #[serde(rename = "oneOf")]
    OneOf(OneOfSchema),
    MultiType(MultiTypeSchema),
    String(StringSchema),
    Number(NumberSchema),
    Integer(NumberSchema),
    Array(ArraySchema),
    Boolean,
    Null,
    Object(ObjectSchema),
    Combined(ObjectSchema),
    Unknown(ObjectSchema),
}

impl ApiSchemaKind {
    pub fn tag(&self) -> SchemaKind {
        match self {
            ApiSchemaKind::OneOf(_) => SchemaKind::OneOf,
            ApiSchemaKind::MultiType(_) => SchemaKind::MultiType,
            ApiSchemaKind::String(_) => SchemaKind::String,
            ApiSchemaKind::Number(_) => SchemaKind::Number,
            ApiSchemaKind::Integer(_) => SchemaKind::Integer,
            ApiSchemaKind::Array(_) => SchemaKind::Array,
            ApiSchemaKind::Boolean => SchemaKind::Boolean,
            ApiSchemaKind::Null => SchemaKind::Null,
            ApiSchemaKind::Object(_) => SchemaKind::Object,
            ApiSchemaKind::Combined(_) => SchemaKind::Combined,
            ApiSchemaKind::Unknown(_) => SchemaKind::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        self.tag().as_str()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OneOfSchema {
    pub one_of: Vec<SchemaId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiTypeSchema {
    /// Every declared type except `null`.
    pub types: Vec<String>,
    #[serde(flatten)]
    pub object: ObjectSchema,
    #[serde(flatten)]
    pub array: ArraySchema,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StringSchema {
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

/// Numeric constraints. Boolean `exclusiveMinimum`/`exclusiveMaximum`
/// (2.0/3.0) are folded into the numeric form used by 3.1.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NumberSchema {
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ArraySchema {
    pub items: Option<SchemaId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, ApiSchemaProperty>,
    pub additional_properties: Option<AdditionalProperties>,
    pub all_of: Vec<SchemaId>,
    pub any_of: Vec<SchemaId>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiSchemaProperty {
    pub name: String,
    pub schema: SchemaId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(SchemaId),
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiSchemaDiscriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, SchemaId>,
}
