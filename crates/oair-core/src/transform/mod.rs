pub mod context;
mod discriminator;
mod endpoint;
pub mod helpers;
pub mod id_generator;
pub mod openapi2;
pub mod openapi30;
pub mod openapi31;
mod schema;

use indexmap::IndexMap;
use log::debug;

pub use context::TransformerContext;
pub use id_generator::IdGenerator;
pub use openapi2::OpenApi2Transformer;
pub use openapi30::OpenApi30Transformer;
pub use openapi31::OpenApi31Transformer;

use crate::collect::{CollectorData, EndpointInfo, collect_openapi};
use crate::config::{NamingStrategy, OairConfig};
use crate::error::TransformError;
use crate::ir::{ApiData, EndpointId, SchemaId};
use crate::parse::{DocumentSet, Node, OpenApiVersion};

/// Options controlling endpoint naming and service assignment.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub naming_strategy: NamingStrategy,
    pub aliases: IndexMap<String, String>,
    /// Service that receives endpoints without tags.
    pub default_service_name: String,
}

impl From<&OairConfig> for TransformOptions {
    fn from(config: &OairConfig) -> Self {
        Self {
            naming_strategy: config.naming.strategy,
            aliases: config.naming.aliases.clone(),
            default_service_name: config.services.default_name.clone(),
        }
    }
}

/// One OpenAPI version's way of turning documents, schemas and endpoints
/// into IR. Every call shares `ctx`, so a source location is only ever
/// transformed once per run.
pub trait OpenApiTransformer {
    fn version(&self) -> OpenApiVersion;

    /// Create a service for every tag the document declares.
    fn transform_document(
        &self,
        ctx: &mut TransformerContext<'_>,
        document: &Node<'_>,
    ) -> Result<(), TransformError>;

    fn transform_schema(
        &self,
        ctx: &mut TransformerContext<'_>,
        schema: &Node<'_>,
    ) -> Result<SchemaId, TransformError>;

    fn transform_endpoint(
        &self,
        ctx: &mut TransformerContext<'_>,
        info: &EndpointInfo<'_>,
    ) -> Result<EndpointId, TransformError>;
}

pub fn transformer_for(version: OpenApiVersion) -> &'static dyn OpenApiTransformer {
    match version {
        OpenApiVersion::V2_0 => &OpenApi2Transformer,
        OpenApiVersion::V3_0 => &OpenApi30Transformer,
        OpenApiVersion::V3_1 => &OpenApi31Transformer,
    }
}

/// Version-dependent behavior of the shared schema and endpoint pipeline.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dialect {
    /// Honor the 3.0 `nullable` keyword.
    pub nullable_keyword: bool,
    /// Wrap list-valued `items` in a synthetic `oneOf`.
    pub tuple_items: bool,
    /// Link discriminators and their variants after each schema completes.
    pub link_inheritance: bool,
    /// Bodies are `in: body` parameters typed by `consumes`/`produces`.
    pub body_parameters: bool,
}

/// Transform collected documents into the IR: documents first, then every
/// schema, then every endpoint, each with its own document's transformer.
pub fn transform_openapi(
    input: &CollectorData<'_>,
    options: &TransformOptions,
) -> Result<ApiData, TransformError> {
    let mut ctx = TransformerContext::new(input, options);
    let input = ctx.input;

    for document in &input.documents {
        transformer_for(document.document().version).transform_document(&mut ctx, document)?;
    }
    for schema in input.schemas.values() {
        transformer_for(schema.document().version).transform_schema(&mut ctx, schema)?;
    }
    for info in input.endpoints.values() {
        transformer_for(info.operation.document().version).transform_endpoint(&mut ctx, info)?;
    }

    let data = ctx.into_data();
    debug!(
        "transformed {} services, {} paths, {} endpoints, {} schemas",
        data.services.len(),
        data.paths.len(),
        data.endpoints.len(),
        data.schemas.len()
    );
    Ok(data)
}

/// Collect and transform every document of a set with default options.
pub fn transform(documents: &DocumentSet) -> Result<ApiData, TransformError> {
    transform_with_options(documents, &TransformOptions::default())
}

/// Collect and transform every document of a set.
pub fn transform_with_options(
    documents: &DocumentSet,
    options: &TransformOptions,
) -> Result<ApiData, TransformError> {
    let input = collect_openapi(documents);
    transform_openapi(&input, options)
}

fn seed_services(ctx: &mut TransformerContext<'_>, document: &Node<'_>) {
    let Some(tags) = document.get("tags") else {
        return;
    };
    for tag in tags.elements() {
        let Some(name) = tag.str("name") else {
            continue;
        };
        let description = tag.str("description").map(str::to_string);
        ctx.service(name, Some(tag.src()), description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformer_for_version() {
        for version in [
            OpenApiVersion::V2_0,
            OpenApiVersion::V3_0,
            OpenApiVersion::V3_1,
        ] {
            assert_eq!(transformer_for(version).version(), version);
        }
    }

    #[test]
    fn test_options_from_config() {
        let config: OairConfig = serde_yaml_ng::from_str(
            "naming:\n  strategy: use_route_based\n  aliases:\n    a: b\nservices:\n  default_name: misc\n",
        )
        .unwrap();
        let options = TransformOptions::from(&config);
        assert_eq!(options.naming_strategy, NamingStrategy::UseRouteBased);
        assert_eq!(options.aliases.get("a").map(String::as_str), Some("b"));
        assert_eq!(options.default_service_name, "misc");
    }

    #[test]
    fn test_document_tags_seed_services() {
        let mut documents = DocumentSet::new();
        documents
            .add_yaml(
                "tags.yaml",
                r#"
openapi: 3.0.3
info: {title: Tags, version: "1"}
tags:
  - name: pets
    description: Everything about pets
  - name: store
paths: {}
"#,
            )
            .unwrap();
        let data = transform(&documents).unwrap();

        assert_eq!(data.services.len(), 2);
        let pets = data.service(data.service_by_name("pets").unwrap());
        assert_eq!(pets.id, "service-1");
        assert_eq!(pets.description.as_deref(), Some("Everything about pets"));
        assert!(pets.endpoints.is_empty());
        assert_eq!(
            pets.src.as_ref().map(|src| src.path.as_str()),
            Some("/tags/0")
        );
    }
}
