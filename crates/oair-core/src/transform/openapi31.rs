use super::context::TransformerContext;
use super::schema::transform_schema;
use super::{Dialect, OpenApiTransformer, endpoint, seed_services};
use crate::collect::EndpointInfo;
use crate::error::TransformError;
use crate::ir::{EndpointId, SchemaId};
use crate::parse::{Node, OpenApiVersion};

/// 3.1 and bare JSON Schema documents. Nullability comes only from `type`
/// arrays, and discriminators are linked in both directions.
pub(crate) const OPENAPI_3_1: Dialect = Dialect {
    nullable_keyword: false,
    tuple_items: false,
    link_inheritance: true,
    body_parameters: false,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApi31Transformer;

impl OpenApiTransformer for OpenApi31Transformer {
    fn version(&self) -> OpenApiVersion {
        OpenApiVersion::V3_1
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
        transform_schema(ctx, schema, &OPENAPI_3_1)
    }

    fn transform_endpoint(
        &self,
        ctx: &mut TransformerContext<'_>,
        info: &EndpointInfo<'_>,
    ) -> Result<EndpointId, TransformError> {
        endpoint::transform_endpoint(ctx, info, &OPENAPI_3_1)
    }
}
