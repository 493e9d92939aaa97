use super::context::TransformerContext;
use super::endpoint::transform_content;
use super::helpers::get_custom_fields;
use super::schema::transform_schema;
use super::{Dialect, OpenApiTransformer, endpoint, seed_services};
use crate::collect::EndpointInfo;
use crate::error::TransformError;
use crate::ir::{ApiRequestBody, EndpointId, SchemaId};
use crate::parse::{Node, OpenApiVersion};

pub(crate) const OPENAPI_3_0: Dialect = Dialect {
    nullable_keyword: true,
    tuple_items: false,
    link_inheritance: false,
    body_parameters: false,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi30Transformer;

impl OpenApiTransformer for OpenApi30Transformer {
    fn version(&self) -> OpenApiVersion {
        OpenApiVersion::V3_0
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
        transform_schema(ctx, schema, &OPENAPI_3_0)
    }

    fn transform_endpoint(
        &self,
        ctx: &mut TransformerContext<'_>,
        info: &EndpointInfo<'_>,
    ) -> Result<EndpointId, TransformError> {
        endpoint::transform_endpoint(ctx, info, &OPENAPI_3_0)
    }
}

/// `requestBody` with its whole `content` map. Shared by 3.0 and 3.1.
pub(crate) fn transform_request_body(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    dialect: &Dialect,
) -> Result<Option<ApiRequestBody>, TransformError> {
    let Some(body) = info.operation.get("requestBody") else {
        return Ok(None);
    };
    let id = ctx.id_generator.generate_id("requestBody");
    let content = transform_content(ctx, body.get("content"), dialect)?;
    Ok(Some(ApiRequestBody {
        id,
        src: body.src(),
        description: body.str("description").map(str::to_string),
        required: body.bool("required").unwrap_or(false),
        content,
        custom: get_custom_fields(&body),
    }))
}
