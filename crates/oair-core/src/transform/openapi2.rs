//! OpenAPI 2.0: bodies are `in: body` parameters and media types come from
//! `consumes`/`produces`, of which only the first entry is kept.

use serde_json::Value;

use super::context::TransformerContext;
use super::helpers::get_custom_fields;
use super::schema::transform_schema;
use super::{Dialect, OpenApiTransformer, endpoint, seed_services};
use crate::collect::EndpointInfo;
use crate::error::TransformError;
use crate::ir::{ApiContent, ApiRequestBody, EndpointId, SchemaId};
use crate::parse::{Node, OpenApiVersion};

pub(crate) const OPENAPI_2_0: Dialect = Dialect {
    nullable_keyword: false,
    tuple_items: true,
    link_inheritance: false,
    body_parameters: true,
};

const DEFAULT_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi2Transformer;

impl OpenApiTransformer for OpenApi2Transformer {
    fn version(&self) -> OpenApiVersion {
        OpenApiVersion::V2_0
    }

    fn transform_document(
        &self,
        ctx: &mut TransformerContext<'_>,
        document: &Node<'_>,
    ) -> Result<(), TransformError> {
        seed_services(ctx, document);
        Ok(())
    }

    fn transform_schema(
        &self,
        ctx: &mut TransformerContext<'_>,
        schema: &Node<'_>,
    ) -> Result<SchemaId, TransformError> {
        transform_schema(ctx, schema, &OPENAPI_2_0)
    }

    fn transform_endpoint(
        &self,
        ctx: &mut TransformerContext<'_>,
        info: &EndpointInfo<'_>,
    ) -> Result<EndpointId, TransformError> {
        endpoint::transform_endpoint(ctx, info, &OPENAPI_2_0)
    }
}

/// The request body carried by the first `in: body` parameter of the
/// operation, or else of its path item.
pub(crate) fn transform_body_parameter(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    dialect: &Dialect,
) -> Result<Option<ApiRequestBody>, TransformError> {
    let body = [info.operation.get("parameters"), info.path_item.get("parameters")]
        .into_iter()
        .flatten()
        .flat_map(|parameters| parameters.elements())
        .find(|parameter| parameter.str("in") == Some("body"));
    let Some(body) = body else {
        return Ok(None);
    };

    let id = ctx.id_generator.generate_id("requestBody");
    let content_id = ctx.id_generator.generate_id("content");
    let schema = match body.get("schema").filter(Node::is_object) {
        Some(schema) => Some(transform_schema(ctx, &schema, dialect)?),
        None => None,
    };
    let media_type = first_media_type(
        &info.operation,
        "consumes",
        &info.operation.document().header.consumes,
    );

    Ok(Some(ApiRequestBody {
        id,
        src: body.src(),
        description: body.str("description").map(str::to_string),
        required: body.bool("required").unwrap_or(false),
        content: vec![ApiContent {
            id: content_id,
            src: body.src(),
            media_type,
            schema,
        }],
        custom: get_custom_fields(&body),
    }))
}

/// A response `schema` as a single content option typed by `produces`.
pub(crate) fn transform_response_content(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    response: &Node<'_>,
    dialect: &Dialect,
) -> Result<Vec<ApiContent>, TransformError> {
    let Some(schema) = response.get("schema").filter(Node::is_object) else {
        return Ok(Vec::new());
    };
    let id = ctx.id_generator.generate_id("content");
    let schema = transform_schema(ctx, &schema, dialect)?;
    let media_type = first_media_type(
        &info.operation,
        "produces",
        &info.operation.document().header.produces,
    );
    Ok(vec![ApiContent {
        id,
        src: response.src(),
        media_type,
        schema: Some(schema),
    }])
}

// TODO: keep every `consumes`/`produces` entry once downstream generators
// accept several content options per 2.0 body.
fn first_media_type(operation: &Node<'_>, keyword: &str, document_default: &[String]) -> String {
    operation
        .raw(keyword)
        .and_then(Value::as_array)
        .and_then(|media_types| media_types.first())
        .and_then(Value::as_str)
        .or_else(|| document_default.first().map(String::as_str))
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_string()
}
