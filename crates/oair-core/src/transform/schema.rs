use indexmap::IndexSet;
use log::trace;
use serde_json::Value;

use super::Dialect;
use super::context::TransformerContext;
use super::discriminator::resolve_discriminator_mapping;
use super::helpers::{
    determine_schema_accessibility, determine_schema_kind, determine_schema_name,
    get_custom_fields, transform_additional_properties, transform_schema_properties,
};
use crate::error::TransformError;
use crate::ir::{
    ApiSchema, ApiSchemaDiscriminator, ApiSchemaKind, ArraySchema, MultiTypeSchema, NumberSchema,
    ObjectSchema, OneOfSchema, SchemaId, SchemaKind, StringSchema,
};
use crate::parse::Node;

/// Transform a schema node, returning the existing schema for its source key
/// when there is one.
pub(crate) fn transform_schema(
    ctx: &mut TransformerContext<'_>,
    node: &Node<'_>,
    dialect: &Dialect,
) -> Result<SchemaId, TransformError> {
    if !node.is_object() {
        return Err(TransformError::InvalidSchema(node.src().to_string()));
    }
    let key = node.key();
    if let Some(id) = ctx.lookup_schema(&key) {
        return Ok(id);
    }

    let (kind, types, mut nullable) = singularize(node);
    if dialect.nullable_keyword && node.bool("nullable") == Some(true) {
        nullable = true;
    }

    let id = ctx.id_generator.generate_id("schema");
    let name = determine_schema_name(node, &id);
    let mut schema = ApiSchema::new(id, node.src(), name.name, name.is_generated);
    schema.description = node.str("description").map(str::to_string);
    schema.deprecated = node.bool("deprecated").unwrap_or(false);
    schema.accessibility = determine_schema_accessibility(node);
    schema.enum_values = node.raw("enum").and_then(Value::as_array).cloned();
    schema.const_value = node.raw("const").cloned();
    schema.default = node.raw("default").cloned();
    schema.example = node.raw("example").cloned();
    schema.nullable = nullable;
    schema.required = node
        .raw("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(IndexSet::new);
    schema.custom = get_custom_fields(node);
    schema.discriminator = discriminator_of(node);

    let mapping = explicit_mapping(node);
    let id = ctx.begin_schema(key.clone(), schema);
    if !mapping.is_empty() {
        ctx.discriminator_targets
            .entry(id)
            .or_default()
            .extend(mapping.iter().map(|(_, target)| target.key()));
    }

    let ref_schema = match node.reference() {
        Some(target) => transform_child(ctx, Some(target.clone()), dialect)?,
        None => None,
    };
    let not = transform_child(ctx, node.get("not"), dialect)?;
    let payload = transform_kind(ctx, node, kind, types, dialect)?;

    let mut resolved = Vec::with_capacity(mapping.len());
    for (value, target) in &mapping {
        resolved.push((value.clone(), transform_schema(ctx, target, dialect)?));
    }

    let schema = ctx.data.schema_mut(id);
    schema.ref_schema = ref_schema;
    schema.not = not;
    schema.kind = payload;
    if let Some(discriminator) = schema.discriminator.as_mut() {
        for (value, target) in resolved {
            discriminator.mapping.insert(value, target);
        }
    }

    ctx.complete_schema(&key);
    trace!("transformed schema {key} as {}", kind.as_str());

    if dialect.link_inheritance {
        resolve_discriminator_mapping(ctx, id);
    }
    Ok(id)
}

/// Reduce a `type` array: `null` becomes the nullable flag, and a single
/// remaining type becomes the kind.
fn singularize(node: &Node<'_>) -> (SchemaKind, Vec<String>, bool) {
    let kind = determine_schema_kind(node);
    if kind != SchemaKind::MultiType {
        return (kind, Vec::new(), false);
    }
    let declared: Vec<&str> = node
        .raw("type")
        .and_then(Value::as_array)
        .map(|types| types.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let nullable = declared.contains(&"null");
    let types: Vec<String> = declared
        .into_iter()
        .filter(|name| *name != "null")
        .map(str::to_string)
        .collect();

    let kind = match types.as_slice() {
        [] if nullable => SchemaKind::Null,
        [] => SchemaKind::Unknown,
        [single] => SchemaKind::from_type(single),
        _ => SchemaKind::MultiType,
    };
    (kind, types, nullable)
}

/// The discriminator property, with an empty mapping filled in later. 2.0
/// declares the property name as a bare string.
///
/// Only a node's own `discriminator` counts. A `$ref` with siblings reaches
/// its discriminated base through `ref_schema`.
fn discriminator_of(node: &Node<'_>) -> Option<ApiSchemaDiscriminator> {
    let property_name = match node.raw_own("discriminator")? {
        Value::String(name) => name.clone(),
        Value::Object(_) => node
            .get_own("discriminator")
            .and_then(|discriminator| discriminator.str("propertyName").map(str::to_string))
            .unwrap_or_default(),
        _ => return None,
    };
    Some(ApiSchemaDiscriminator {
        property_name,
        mapping: Default::default(),
    })
}

fn explicit_mapping<'a>(node: &Node<'a>) -> Vec<(String, Node<'a>)> {
    let Some(mapping) = node
        .get_own("discriminator")
        .and_then(|discriminator| discriminator.get("mapping"))
    else {
        return Vec::new();
    };
    mapping
        .fields()
        .into_iter()
        .filter_map(|(value, reference)| {
            let target = node.resolve_reference(reference.as_str()?)?;
            target
                .is_object()
                .then(|| (value.to_string(), target))
        })
        .collect()
}

fn transform_child(
    ctx: &mut TransformerContext<'_>,
    node: Option<Node<'_>>,
    dialect: &Dialect,
) -> Result<Option<SchemaId>, TransformError> {
    match node {
        Some(node) if node.is_object() => transform_schema(ctx, &node, dialect).map(Some),
        _ => Ok(None),
    }
}

fn transform_list(
    ctx: &mut TransformerContext<'_>,
    node: Option<Node<'_>>,
    dialect: &Dialect,
) -> Result<Vec<SchemaId>, TransformError> {
    let Some(node) = node else {
        return Ok(Vec::new());
    };
    let mut schemas = Vec::new();
    for element in node.elements() {
        if element.is_object() {
            schemas.push(transform_schema(ctx, &element, dialect)?);
        }
    }
    Ok(schemas)
}

fn transform_kind(
    ctx: &mut TransformerContext<'_>,
    node: &Node<'_>,
    kind: SchemaKind,
    types: Vec<String>,
    dialect: &Dialect,
) -> Result<ApiSchemaKind, TransformError> {
    Ok(match kind {
        SchemaKind::OneOf => ApiSchemaKind::OneOf(OneOfSchema {
            one_of: transform_list(ctx, node.get("oneOf"), dialect)?,
        }),
        SchemaKind::MultiType => ApiSchemaKind::MultiType(MultiTypeSchema {
            types,
            object: object_schema(ctx, node, dialect)?,
            array: array_schema(ctx, node, dialect)?,
        }),
        SchemaKind::String => ApiSchemaKind::String(StringSchema {
            format: node.str("format").map(str::to_string),
            pattern: node.str("pattern").map(str::to_string),
            min_length: node.u64("minLength"),
            max_length: node.u64("maxLength"),
        }),
        SchemaKind::Number => ApiSchemaKind::Number(number_schema(node)),
        SchemaKind::Integer => ApiSchemaKind::Integer(number_schema(node)),
        SchemaKind::Array => ApiSchemaKind::Array(array_schema(ctx, node, dialect)?),
        SchemaKind::Boolean => ApiSchemaKind::Boolean,
        SchemaKind::Null => ApiSchemaKind::Null,
        SchemaKind::Object => ApiSchemaKind::Object(object_schema(ctx, node, dialect)?),
        SchemaKind::Combined => ApiSchemaKind::Combined(object_schema(ctx, node, dialect)?),
        SchemaKind::Unknown => ApiSchemaKind::Unknown(object_schema(ctx, node, dialect)?),
    })
}

fn number_schema(node: &Node<'_>) -> NumberSchema {
    let mut minimum = node.f64("minimum");
    let mut maximum = node.f64("maximum");
    let exclusive_minimum = match node.raw("exclusiveMinimum") {
        Some(Value::Bool(true)) => minimum.take(),
        Some(Value::Number(bound)) => bound.as_f64(),
        _ => None,
    };
    let exclusive_maximum = match node.raw("exclusiveMaximum") {
        Some(Value::Bool(true)) => maximum.take(),
        Some(Value::Number(bound)) => bound.as_f64(),
        _ => None,
    };
    NumberSchema {
        format: node.str("format").map(str::to_string),
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
        multiple_of: node.f64("multipleOf"),
    }
}

fn object_schema(
    ctx: &mut TransformerContext<'_>,
    node: &Node<'_>,
    dialect: &Dialect,
) -> Result<ObjectSchema, TransformError> {
    let properties =
        transform_schema_properties(ctx, node, |ctx, child| transform_schema(ctx, child, dialect))?;
    let additional_properties = transform_additional_properties(ctx, node, |ctx, child| {
        transform_schema(ctx, child, dialect)
    })?;
    Ok(ObjectSchema {
        properties,
        additional_properties,
        all_of: transform_list(ctx, node.get("allOf"), dialect)?,
        any_of: transform_list(ctx, node.get("anyOf"), dialect)?,
        min_properties: node.u64("minProperties"),
        max_properties: node.u64("maxProperties"),
    })
}

fn array_schema(
    ctx: &mut TransformerContext<'_>,
    node: &Node<'_>,
    dialect: &Dialect,
) -> Result<ArraySchema, TransformError> {
    let items = match node.get("items") {
        Some(items) if items.is_array() => transform_item_list(ctx, &items, dialect)?,
        items => transform_child(ctx, items, dialect)?,
    };
    Ok(ArraySchema {
        items,
        min_items: node.u64("minItems"),
        max_items: node.u64("maxItems"),
        unique_items: node.bool("uniqueItems").unwrap_or(false),
    })
}

/// `items` given as a list. 2.0 wraps several item schemas in a synthetic
/// `oneOf` schema; otherwise only the first entry is used.
fn transform_item_list(
    ctx: &mut TransformerContext<'_>,
    items: &Node<'_>,
    dialect: &Dialect,
) -> Result<Option<SchemaId>, TransformError> {
    let elements: Vec<Node<'_>> = items
        .elements()
        .into_iter()
        .filter(Node::is_object)
        .collect();
    if !dialect.tuple_items || elements.len() < 2 {
        return transform_child(ctx, elements.into_iter().next(), dialect);
    }

    let key = items.key();
    if let Some(id) = ctx.lookup_schema(&key) {
        return Ok(Some(id));
    }
    let id = ctx.id_generator.generate_id("schema");
    let name = determine_schema_name(items, &id);
    let wrapper = ApiSchema::new(id, items.src(), name.name, name.is_generated);
    let id = ctx.begin_schema(key.clone(), wrapper);

    let mut one_of = Vec::with_capacity(elements.len());
    for element in &elements {
        one_of.push(transform_schema(ctx, element, dialect)?);
    }
    ctx.data.schema_mut(id).kind = ApiSchemaKind::OneOf(OneOfSchema { one_of });
    ctx.complete_schema(&key);
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::CollectorData;
    use crate::parse::DocumentSet;
    use crate::transform::TransformOptions;
    use crate::transform::openapi2::OPENAPI_2_0;
    use crate::transform::openapi30::OPENAPI_3_0;
    use crate::transform::openapi31::OPENAPI_3_1;

    fn transform_named(
        file: &str,
        doc: &str,
        dialect: &Dialect,
        names: &[&str],
    ) -> (crate::ir::ApiData, Vec<SchemaId>) {
        let mut documents = DocumentSet::new();
        documents.add_yaml(file, doc).unwrap();
        let input = CollectorData::new();
        let options = TransformOptions::default();
        let mut ctx = TransformerContext::new(&input, &options);
        let root = documents.root(file).unwrap();
        let section = root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .or_else(|| root.get("definitions"))
            .unwrap();
        let ids: Vec<SchemaId> = names
            .iter()
            .map(|name| transform_schema(&mut ctx, &section.get(name).unwrap(), dialect).unwrap())
            .collect();
        (ctx.into_data(), ids)
    }

    #[test]
    fn test_nullable_type_arrays() {
        let doc = r#"
openapi: 3.1.0
info: {title: T, version: "1"}
components:
  schemas:
    Name:
      type: [string, "null"]
    Value:
      type: [string, number, "null"]
    Nothing:
      type: ["null"]
"#;
        let (data, ids) = transform_named("t.yaml", doc, &OPENAPI_3_1, &["Name", "Value", "Nothing"]);

        let name = data.schema(ids[0]);
        assert!(matches!(name.kind, ApiSchemaKind::String(_)));
        assert_eq!(name.type_names(), vec!["string"]);
        assert!(name.nullable);

        let value = data.schema(ids[1]);
        assert!(matches!(value.kind, ApiSchemaKind::MultiType(_)));
        assert_eq!(value.type_names(), vec!["string", "number"]);
        assert!(value.nullable);

        let nothing = data.schema(ids[2]);
        assert!(matches!(nothing.kind, ApiSchemaKind::Null));
        assert!(nothing.nullable);
    }

    #[test]
    fn test_nullable_keyword_only_in_3_0() {
        let doc = r#"
openapi: 3.0.3
info: {title: T, version: "1"}
components:
  schemas:
    Name:
      type: string
      nullable: true
"#;
        let (data, ids) = transform_named("a.yaml", doc, &OPENAPI_3_0, &["Name"]);
        assert!(data.schema(ids[0]).nullable);

        let (data, ids) = transform_named("b.yaml", doc, &OPENAPI_3_1, &["Name"]);
        assert!(!data.schema(ids[0]).nullable);
    }

    #[test]
    fn test_exclusive_bounds() {
        let doc = r#"
swagger: "2.0"
info: {title: T, version: "1"}
definitions:
  Legacy:
    type: integer
    minimum: 1
    exclusiveMinimum: true
    maximum: 10
  Modern:
    type: number
    exclusiveMaximum: 5.5
    multipleOf: 0.5
"#;
        let (data, ids) = transform_named("t.yaml", doc, &OPENAPI_2_0, &["Legacy", "Modern"]);
        let ApiSchemaKind::Integer(ref legacy) = data.schema(ids[0]).kind else {
            panic!("expected integer");
        };
        assert_eq!(legacy.minimum, None);
        assert_eq!(legacy.exclusive_minimum, Some(1.0));
        assert_eq!(legacy.maximum, Some(10.0));

        let ApiSchemaKind::Number(ref modern) = data.schema(ids[1]).kind else {
            panic!("expected number");
        };
        assert_eq!(modern.exclusive_maximum, Some(5.5));
        assert_eq!(modern.multiple_of, Some(0.5));
    }

    #[test]
    fn test_tuple_items() {
        let doc = r#"
swagger: "2.0"
info: {title: T, version: "1"}
definitions:
  Pair:
    type: array
    items:
      - type: string
      - type: integer
  Single:
    type: array
    items:
      - type: boolean
"#;
        let (data, ids) = transform_named("t.yaml", doc, &OPENAPI_2_0, &["Pair", "Single"]);

        let ApiSchemaKind::Array(ref pair) = data.schema(ids[0]).kind else {
            panic!("expected array");
        };
        let wrapper = data.schema(pair.items.unwrap());
        assert_eq!(wrapper.src.path, "/definitions/Pair/items");
        assert!(wrapper.is_name_generated);
        let ApiSchemaKind::OneOf(ref one_of) = wrapper.kind else {
            panic!("expected oneOf wrapper");
        };
        assert_eq!(one_of.one_of.len(), 2);
        assert!(matches!(data.schema(one_of.one_of[1]).kind, ApiSchemaKind::Integer(_)));

        let ApiSchemaKind::Array(ref single) = data.schema(ids[1]).kind else {
            panic!("expected array");
        };
        assert!(matches!(
            data.schema(single.items.unwrap()).kind,
            ApiSchemaKind::Boolean
        ));
    }

    #[test]
    fn test_non_object_is_invalid() {
        let mut documents = DocumentSet::new();
        documents
            .add_yaml("t.yaml", "openapi: 3.1.0\ninfo: {title: T, version: \"1\"}\n")
            .unwrap();
        let input = CollectorData::new();
        let options = TransformOptions::default();
        let mut ctx = TransformerContext::new(&input, &options);
        let title = documents
            .root("t.yaml")
            .and_then(|root| root.get("info"))
            .and_then(|info| info.get("title"))
            .unwrap();
        let err = transform_schema(&mut ctx, &title, &OPENAPI_3_1).unwrap_err();
        assert!(matches!(err, TransformError::InvalidSchema(at) if at == "t.yaml#/info/title"));
    }

    #[test]
    fn test_base_fields() {
        let doc = r#"
openapi: 3.1.0
info: {title: T, version: "1"}
components:
  schemas:
    Status:
      type: string
      description: Lifecycle state
      enum: [active, retired]
      default: active
      deprecated: true
      readOnly: true
      x-go-type: Status
    Point:
      type: object
      required: [x, y, x]
      properties:
        x: {type: number}
        y: {type: number}
      additionalProperties: false
"#;
        let (data, ids) = transform_named("t.yaml", doc, &OPENAPI_3_1, &["Status", "Point"]);

        let status = data.schema(ids[0]);
        assert_eq!(status.id, "schema-1");
        assert_eq!(status.name, "Status");
        assert!(!status.is_name_generated);
        assert_eq!(status.description.as_deref(), Some("Lifecycle state"));
        assert_eq!(status.enum_values.as_ref().map(Vec::len), Some(2));
        assert_eq!(status.default, Some(Value::from("active")));
        assert!(status.deprecated);
        assert_eq!(
            status.accessibility,
            crate::ir::ApiSchemaAccessibility::ReadOnly
        );
        assert_eq!(status.custom.get("go-type"), Some(&Value::from("Status")));

        let point = data.schema(ids[1]);
        assert_eq!(point.required.len(), 2);
        assert!(point.required.contains("y"));
        let object = point.object().unwrap();
        assert_eq!(
            object.properties.keys().collect::<Vec<_>>(),
            vec!["x", "y"]
        );
        assert_eq!(
            object.additional_properties,
            Some(crate::ir::AdditionalProperties::Allowed(false))
        );
    }

    #[test]
    fn test_sibling_ref_is_not_a_discriminated_base() {
        let doc = r##"
openapi: 3.1.0
info: {title: T, version: "1"}
components:
  schemas:
    Pet:
      type: object
      properties:
        petType: {type: string}
      discriminator:
        propertyName: petType
        mapping:
          dog: "#/components/schemas/Dog"
    Dog:
      $ref: "#/components/schemas/Pet"
      description: A dog
    Cat:
      allOf:
        - $ref: "#/components/schemas/Pet"
          description: Pet fields
        - type: object
          properties:
            purrs: {type: boolean}
"##;
        let (data, ids) = transform_named("t.yaml", doc, &OPENAPI_3_1, &["Pet", "Cat"]);
        let (pet, cat) = (ids[0], ids[1]);
        let dog = data.schema_by_name("Dog").unwrap();

        let mapping = &data.schema(pet).discriminator.as_ref().unwrap().mapping;
        assert_eq!(mapping.get("dog"), Some(&dog));
        assert_eq!(mapping.get("Cat"), Some(&cat));

        let dog = data.schema(dog);
        assert!(dog.discriminator.is_none());
        assert_eq!(dog.ref_schema, Some(pet));
        assert_eq!(dog.inherited_schemas, vec![pet]);

        let ApiSchemaKind::Combined(ref combined) = data.schema(cat).kind else {
            panic!("expected combined");
        };
        let wrapper = data.schema(combined.all_of[0]);
        assert!(wrapper.discriminator.is_none());
        assert!(wrapper.inherited_schemas.is_empty());
        assert_eq!(wrapper.ref_schema, Some(pet));
        assert_eq!(data.schema(cat).inherited_schemas, vec![pet]);
    }
}
