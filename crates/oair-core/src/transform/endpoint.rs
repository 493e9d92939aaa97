use log::{debug, warn};

use super::context::TransformerContext;
use super::helpers::{determine_endpoint_name, get_custom_fields};
use super::schema::transform_schema;
use super::{Dialect, openapi2, openapi30};
use crate::collect::EndpointInfo;
use crate::error::TransformError;
use crate::ir::{
    ApiContent, ApiEndpoint, ApiHeader, ApiParameter, ApiParameterTarget, ApiPath, ApiResponse,
    EndpointId, PathId, SchemaId,
};
use crate::parse::Node;

pub(crate) fn transform_endpoint(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    dialect: &Dialect,
) -> Result<EndpointId, TransformError> {
    let operation = &info.operation;
    let source_key = operation.key();
    if let Some(&id) = ctx.endpoint_sources.get(&source_key) {
        return Ok(id);
    }

    let path_id = transform_path(ctx, info, dialect)?;
    let id = ctx.id_generator.generate_id("endpoint");
    let name = determine_endpoint_name(info, ctx.options);

    let own_parameters = transform_parameters(ctx, operation.get("parameters"), dialect)?;
    let parameters = merge_parameters(&ctx.data.path(path_id).parameters, own_parameters);

    let request_body = if dialect.body_parameters {
        openapi2::transform_body_parameter(ctx, info, dialect)?
    } else {
        openapi30::transform_request_body(ctx, info, dialect)?
    };
    let responses = transform_responses(ctx, info, dialect)?;

    let mut tags: Vec<String> = operation
        .get("tags")
        .map(|tags| {
            tags.elements()
                .iter()
                .filter_map(|tag| tag.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    if tags.is_empty() {
        tags.push(ctx.options.default_service_name.clone());
    }

    let endpoint_id = ctx.data.push_endpoint(ApiEndpoint {
        id,
        src: operation.src(),
        name,
        path: info.path.clone(),
        path_info: path_id,
        method: info.method,
        summary: operation.str("summary").map(str::to_string),
        description: operation.str("description").map(str::to_string),
        parameters,
        deprecated: operation.bool("deprecated").unwrap_or(false),
        request_body,
        responses,
        tags: tags.clone(),
        custom: get_custom_fields(operation),
    });
    ctx.endpoint_sources.insert(source_key, endpoint_id);

    for tag in &tags {
        let service = ctx.service(tag, None, None);
        let endpoints = &mut ctx.data.service_mut(service).endpoints;
        if !endpoints.contains(&endpoint_id) {
            endpoints.push(endpoint_id);
        }
    }
    ctx.data
        .path_mut(path_id)
        .endpoints
        .insert(info.method, endpoint_id);

    debug!("transformed endpoint {} {}", info.method, info.path);
    Ok(endpoint_id)
}

/// The path shared by every method of `info.path`, created on first use.
fn transform_path(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    dialect: &Dialect,
) -> Result<PathId, TransformError> {
    if let Some(id) = ctx.data.path_by_name(&info.path) {
        return Ok(id);
    }
    let id = ctx.id_generator.generate_id("path");
    let parameters = transform_parameters(ctx, info.path_item.get("parameters"), dialect)?;
    Ok(ctx.data.push_path(ApiPath {
        id,
        src: info.path_item.src(),
        summary: info.path_item.str("summary").map(str::to_string),
        description: info.path_item.str("description").map(str::to_string),
        path: info.path.clone(),
        parameters,
        endpoints: Default::default(),
    }))
}

/// Non-body parameters of a `parameters` list.
fn transform_parameters(
    ctx: &mut TransformerContext<'_>,
    list: Option<Node<'_>>,
    dialect: &Dialect,
) -> Result<Vec<ApiParameter>, TransformError> {
    let Some(list) = list else {
        return Ok(Vec::new());
    };
    let mut parameters = Vec::new();
    for parameter in list.elements() {
        let Some(location) = parameter.str("in") else {
            warn!("parameter without `in` at {}", parameter.src());
            continue;
        };
        if location == "body" {
            continue;
        }
        let Some(target) = ApiParameterTarget::parse(location) else {
            warn!("unknown parameter location {location:?} at {}", parameter.src());
            continue;
        };
        parameters.push(transform_parameter(ctx, &parameter, target, dialect)?);
    }
    Ok(parameters)
}

fn transform_parameter(
    ctx: &mut TransformerContext<'_>,
    parameter: &Node<'_>,
    target: ApiParameterTarget,
    dialect: &Dialect,
) -> Result<ApiParameter, TransformError> {
    let id = ctx.id_generator.generate_id("parameter");
    let schema = match parameter.get("schema").filter(Node::is_object) {
        Some(schema) => Some(transform_schema(ctx, &schema, dialect)?),
        None => match parameter.get("content") {
            Some(content) => first_content_schema(ctx, &content, dialect)?,
            None if parameter.has("type") => Some(transform_schema(ctx, parameter, dialect)?),
            None => None,
        },
    };
    Ok(ApiParameter {
        id,
        src: parameter.src(),
        name: parameter.str("name").unwrap_or_default().to_string(),
        target,
        description: parameter.str("description").map(str::to_string),
        required: parameter.bool("required").unwrap_or(false),
        deprecated: parameter.bool("deprecated").unwrap_or(false),
        allow_empty_value: parameter.bool("allowEmptyValue"),
        style: parameter.str("style").map(str::to_string),
        explode: parameter.bool("explode"),
        allow_reserved: parameter.bool("allowReserved"),
        schema,
        custom: get_custom_fields(parameter),
    })
}

fn first_content_schema(
    ctx: &mut TransformerContext<'_>,
    content: &Node<'_>,
    dialect: &Dialect,
) -> Result<Option<SchemaId>, TransformError> {
    let schema = content
        .entries()
        .into_iter()
        .next()
        .and_then(|(_, media_type)| media_type.get("schema"))
        .filter(Node::is_object);
    match schema {
        Some(schema) => transform_schema(ctx, &schema, dialect).map(Some),
        None => Ok(None),
    }
}

/// Path parameters followed by operation parameters; an operation parameter
/// replaces the path parameter with the same name in place.
pub(crate) fn merge_parameters(
    path_parameters: &[ApiParameter],
    operation_parameters: Vec<ApiParameter>,
) -> Vec<ApiParameter> {
    let mut merged = path_parameters.to_vec();
    for parameter in operation_parameters {
        match merged.iter().position(|existing| existing.name == parameter.name) {
            Some(index) => merged[index] = parameter,
            None => merged.push(parameter),
        }
    }
    merged
}

fn transform_responses(
    ctx: &mut TransformerContext<'_>,
    info: &EndpointInfo<'_>,
    dialect: &Dialect,
) -> Result<Vec<ApiResponse>, TransformError> {
    let Some(responses) = info.operation.get("responses") else {
        return Ok(Vec::new());
    };
    let mut transformed = Vec::new();
    for (status_code, response) in responses.entries() {
        if status_code.starts_with('$') || status_code.starts_with("x-") {
            continue;
        }
        let id = ctx.id_generator.generate_id("response");

        let mut headers = Vec::new();
        if let Some(header_map) = response.get("headers") {
            for (name, header) in header_map.entries() {
                headers.push(transform_header(ctx, name, &header, dialect)?);
            }
        }

        let content_options = if dialect.body_parameters {
            openapi2::transform_response_content(ctx, info, &response, dialect)?
        } else {
            transform_content(ctx, response.get("content"), dialect)?
        };

        transformed.push(ApiResponse {
            id,
            src: response.src(),
            status_code: status_code.to_string(),
            description: response.str("description").map(str::to_string),
            headers,
            content_options,
            custom: get_custom_fields(&response),
        });
    }
    Ok(transformed)
}

fn transform_header(
    ctx: &mut TransformerContext<'_>,
    name: &str,
    header: &Node<'_>,
    dialect: &Dialect,
) -> Result<ApiHeader, TransformError> {
    let id = ctx.id_generator.generate_id("header");
    let schema = match header.get("schema").filter(Node::is_object) {
        Some(schema) => Some(transform_schema(ctx, &schema, dialect)?),
        None if header.has("type") => Some(transform_schema(ctx, header, dialect)?),
        None => None,
    };
    Ok(ApiHeader {
        id,
        src: header.src(),
        name: name.to_string(),
        description: header.str("description").map(str::to_string),
        required: header.bool("required").unwrap_or(false),
        deprecated: header.bool("deprecated").unwrap_or(false),
        schema,
    })
}

/// Every media type of a 3.x `content` map.
pub(crate) fn transform_content(
    ctx: &mut TransformerContext<'_>,
    content: Option<Node<'_>>,
    dialect: &Dialect,
) -> Result<Vec<ApiContent>, TransformError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    let mut options = Vec::new();
    for (media_type, entry) in content.entries() {
        let id = ctx.id_generator.generate_id("content");
        let schema = match entry.get("schema").filter(Node::is_object) {
            Some(schema) => Some(transform_schema(ctx, &schema, dialect)?),
            None => None,
        };
        options.push(ApiContent {
            id,
            src: entry.src(),
            media_type: media_type.to_string(),
            schema,
        });
    }
    Ok(options)
}
