use indexmap::IndexMap;
use serde_json::Value;

use super::TransformOptions;
use super::context::TransformerContext;
use crate::collect::EndpointInfo;
use crate::config::NamingStrategy;
use crate::error::TransformError;
use crate::ir::{
    AdditionalProperties, ApiSchemaAccessibility, ApiSchemaProperty, HttpMethod, SchemaId,
    SchemaKind,
};
use crate::parse::Node;
use crate::parse::ref_resolve::unescape_pointer_segment;

/// A schema name and whether it was synthesized rather than authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaName {
    pub name: String,
    pub is_generated: bool,
}

impl SchemaName {
    fn authored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_generated: false,
        }
    }

    fn generated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_generated: true,
        }
    }
}

/// Classify a schema by its composition keywords and `type`.
///
/// An object schema with `allOf`/`anyOf` stays an object; the composition
/// only makes schemas of any other type `combined`.
pub fn determine_schema_kind(schema: &Node<'_>) -> SchemaKind {
    if schema.has("oneOf") {
        return SchemaKind::OneOf;
    }
    let schema_type = schema.raw("type");
    let is_object = schema_type.and_then(Value::as_str) == Some("object");
    if !is_object && (schema.has("allOf") || schema.has("anyOf")) {
        return SchemaKind::Combined;
    }
    match schema_type {
        Some(Value::Array(_)) => SchemaKind::MultiType,
        Some(Value::String(name)) => SchemaKind::from_type(name),
        _ => SchemaKind::Unknown,
    }
}

/// Name a schema from its `title`, its component/definition key, or the
/// response it is the body of (`{method}_{path}_{status}_Response`).
/// Anything else gets `fallback_id`.
///
/// In response names every `/` of the path becomes `_` and leading
/// underscores are trimmed, so `GET /pets` yields `get_pets_200_Response`
/// rather than `get__pets_200_Response`.
pub fn determine_schema_name(schema: &Node<'_>, fallback_id: &str) -> SchemaName {
    if let Some(title) = schema.str("title") {
        return SchemaName::authored(title);
    }

    let segments: Vec<&str> = schema.path().split('/').skip(1).collect();
    match segments.as_slice() {
        ["components", "schemas", name] | ["definitions", name] => {
            return SchemaName::authored(unescape_pointer_segment(name));
        }
        ["paths", path, method, "responses", status, "schema"]
        | ["paths", path, method, "responses", status, "content", _, "schema"]
            if HttpMethod::ALL.iter().any(|m| m.as_str() == *method) =>
        {
            let path = unescape_pointer_segment(path).replace('/', "_");
            return SchemaName::generated(format!(
                "{method}_{}_{status}_Response",
                path.trim_start_matches('_')
            ));
        }
        _ => {}
    }

    SchemaName::generated(fallback_id)
}

pub fn determine_schema_accessibility(schema: &Node<'_>) -> ApiSchemaAccessibility {
    let read_only = schema.bool("readOnly").unwrap_or(false);
    let write_only = schema.bool("writeOnly").unwrap_or(false);
    match (read_only, write_only) {
        (true, true) => ApiSchemaAccessibility::None,
        (true, false) => ApiSchemaAccessibility::ReadOnly,
        (false, true) => ApiSchemaAccessibility::WriteOnly,
        (false, false) => ApiSchemaAccessibility::All,
    }
}

/// Vendor extensions (`x-*`) with the prefix stripped.
pub fn get_custom_fields(node: &Node<'_>) -> IndexMap<String, Value> {
    node.fields()
        .into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("x-")
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect()
}

/// `"{method}{path}"` with `{param}` written as `:param` and `/` as `_`.
pub fn route_name(method: HttpMethod, path: &str) -> String {
    let path = path.replace('{', ":").replace('}', "").replace('/', "_");
    format!("{}{}", method.as_str(), path)
}

/// The endpoint name: `operationId` (unless route naming is configured), else
/// the route name, then replaced by its alias if one is configured.
pub fn determine_endpoint_name(info: &EndpointInfo<'_>, options: &TransformOptions) -> String {
    let name = match options.naming_strategy {
        NamingStrategy::UseOperationId => info
            .operation
            .str("operationId")
            .map(str::to_string)
            .unwrap_or_else(|| route_name(info.method, &info.path)),
        NamingStrategy::UseRouteBased => route_name(info.method, &info.path),
    };
    match options.aliases.get(&name) {
        Some(alias) => alias.clone(),
        None => name,
    }
}

pub fn transform_additional_properties(
    ctx: &mut TransformerContext<'_>,
    schema: &Node<'_>,
    mut transform: impl FnMut(&mut TransformerContext<'_>, &Node<'_>) -> Result<SchemaId, TransformError>,
) -> Result<Option<AdditionalProperties>, TransformError> {
    let Some(additional) = schema.get("additionalProperties") else {
        return Ok(None);
    };
    if let Some(allowed) = additional.value().as_bool() {
        return Ok(Some(AdditionalProperties::Allowed(allowed)));
    }
    if !additional.is_object() {
        return Ok(None);
    }
    Ok(Some(AdditionalProperties::Schema(transform(
        ctx,
        &additional,
    )?)))
}

/// Transform `properties` into an ordered map. Internal `$` keys and values
/// that are not schema objects are skipped.
pub fn transform_schema_properties(
    ctx: &mut TransformerContext<'_>,
    schema: &Node<'_>,
    mut transform: impl FnMut(&mut TransformerContext<'_>, &Node<'_>) -> Result<SchemaId, TransformError>,
) -> Result<IndexMap<String, ApiSchemaProperty>, TransformError> {
    let mut properties = IndexMap::new();
    let Some(node) = schema.get("properties") else {
        return Ok(properties);
    };
    for (name, property) in node.entries() {
        if name.starts_with('$') || !property.is_object() {
            continue;
        }
        let schema = transform(ctx, &property)?;
        properties.insert(
            name.to_string(),
            ApiSchemaProperty {
                name: name.to_string(),
                schema,
            },
        );
    }
    Ok(properties)
}
