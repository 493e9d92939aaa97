//! Discovery of every schema and endpoint reachable from a set of documents.

use indexmap::IndexMap;
use log::debug;

use crate::ir::HttpMethod;
use crate::parse::document::is_json_schema;
use crate::parse::{DocumentSet, Node};

/// An operation together with the path item it was declared on.
#[derive(Debug, Clone)]
pub struct EndpointInfo<'a> {
    pub path: String,
    pub method: HttpMethod,
    pub path_item: Node<'a>,
    pub operation: Node<'a>,
}

/// Everything reachable from the collected documents, deduplicated by source key.
#[derive(Debug, Default)]
pub struct CollectorData<'a> {
    /// Root node of every collected document.
    pub documents: Vec<Node<'a>>,
    /// Schemas keyed by `"{file}:{path}"`.
    pub schemas: IndexMap<String, Node<'a>>,
    /// Endpoints keyed by the operation's `"{file}#{path}"`.
    pub endpoints: IndexMap<String, EndpointInfo<'a>>,
}

impl<'a> CollectorData<'a> {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
            schemas: IndexMap::new(),
            endpoints: IndexMap::new(),
        }
    }

    /// Collect one document. Collecting a document twice adds nothing.
    pub fn collect_document(&mut self, root: Node<'a>) {
        if !self.documents.iter().any(|document| document.key() == root.key()) {
            self.documents.push(root.clone());
        }

        collect_record(self, root.get("paths"), collect_path);

        let components = root.get("components");
        let section = |name: &str| components.as_ref().and_then(|c| c.get(name));

        collect_record(self, section("schemas"), |data, schema, _| {
            collect_schema(data, schema)
        });
        collect_record(self, root.get("definitions"), |data, schema, _| {
            collect_schema(data, schema)
        });
        for parameters in [section("parameters"), root.get("parameters")] {
            collect_record(self, parameters, |data, parameter, _| {
                collect_parameter(data, parameter)
            });
        }
        collect_record(self, section("requestBodies"), |data, body, _| {
            collect_request_body(data, body)
        });
        for responses in [section("responses"), root.get("responses")] {
            collect_record(self, responses, |data, response, _| {
                collect_response(data, response)
            });
        }
        collect_record(self, section("headers"), |data, header, _| {
            collect_header(data, header)
        });

        if is_json_schema(root.value()) {
            collect_schema(self, root.clone());
        }

        debug!(
            "collected {}: {} schemas, {} endpoints so far",
            root.document().file,
            self.schemas.len(),
            self.endpoints.len()
        );
    }
}

/// Collect every document of a set, in load order.
pub fn collect_openapi(documents: &DocumentSet) -> CollectorData<'_> {
    let mut data = CollectorData::new();
    for root in documents.roots() {
        data.collect_document(root);
    }
    data
}

/// Invoke `f` for a node, or for every element of an array node.
fn collect<'a>(
    data: &mut CollectorData<'a>,
    node: Option<Node<'a>>,
    mut f: impl FnMut(&mut CollectorData<'a>, Node<'a>),
) {
    let Some(node) = node else {
        return;
    };
    if node.is_array() {
        for element in node.elements() {
            f(data, element);
        }
    } else {
        f(data, node);
    }
}

/// Invoke `f` for every entry of a map node. Internal (`$`) and vendor
/// extension (`x-`) keys are skipped.
fn collect_record<'a>(
    data: &mut CollectorData<'a>,
    node: Option<Node<'a>>,
    mut f: impl FnMut(&mut CollectorData<'a>, Node<'a>, &'a str),
) {
    let Some(node) = node else {
        return;
    };
    for (key, value) in node.entries() {
        if key.starts_with('$') || key.starts_with("x-") {
            continue;
        }
        f(data, value, key);
    }
}

fn collect_path<'a>(data: &mut CollectorData<'a>, path_item: Node<'a>, path: &'a str) {
    collect(data, path_item.get("parameters"), collect_parameter);

    for method in HttpMethod::ALL {
        let Some(operation) = path_item.get(method.as_str()) else {
            continue;
        };
        if !operation.is_object() {
            continue;
        }
        let key = format!("{}#{}", operation.document().file, operation.path());
        if data.endpoints.contains_key(&key) {
            continue;
        }
        data.endpoints.insert(
            key,
            EndpointInfo {
                path: path.to_string(),
                method,
                path_item: path_item.clone(),
                operation: operation.clone(),
            },
        );

        collect(data, operation.get("parameters"), collect_parameter);
        collect(data, operation.get("requestBody"), collect_request_body);
        collect_record(data, operation.get("responses"), |data, response, _| {
            collect_response(data, response)
        });
    }
}

fn collect_parameter<'a>(data: &mut CollectorData<'a>, parameter: Node<'a>) {
    if let Some(schema) = parameter.get("schema") {
        collect_schema(data, schema);
    } else if parameter.has("type") {
        // 2.0 non-body parameters describe their type inline.
        collect_schema(data, parameter.clone());
    }
    collect_record(data, parameter.get("content"), |data, media_type, _| {
        collect_media_type(data, media_type)
    });
}

fn collect_request_body<'a>(data: &mut CollectorData<'a>, body: Node<'a>) {
    collect_record(data, body.get("content"), |data, media_type, _| {
        collect_media_type(data, media_type)
    });
}

fn collect_media_type<'a>(data: &mut CollectorData<'a>, media_type: Node<'a>) {
    collect(data, media_type.get("schema"), collect_schema);
}

fn collect_response<'a>(data: &mut CollectorData<'a>, response: Node<'a>) {
    collect(data, response.get("schema"), collect_schema);
    collect_record(data, response.get("content"), |data, media_type, _| {
        collect_media_type(data, media_type)
    });
    collect_record(data, response.get("headers"), |data, header, _| {
        collect_header(data, header)
    });
}

fn collect_header<'a>(data: &mut CollectorData<'a>, header: Node<'a>) {
    if let Some(schema) = header.get("schema") {
        collect_schema(data, schema);
    } else if header.has("type") {
        collect_schema(data, header.clone());
    }
    collect_record(data, header.get("content"), |data, media_type, _| {
        collect_media_type(data, media_type)
    });
}

fn collect_schema<'a>(data: &mut CollectorData<'a>, schema: Node<'a>) {
    if !schema.is_object() {
        return;
    }
    let key = schema.key();
    if data.schemas.contains_key(&key) {
        return;
    }
    // Registered before descending so that cycles terminate.
    data.schemas.insert(key, schema.clone());

    if let Some(target) = schema.reference() {
        collect_schema(data, target.clone());
    }

    for keyword in ["allOf", "anyOf", "oneOf", "items", "not"] {
        collect(data, schema.get(keyword), collect_schema);
    }
    for keyword in [
        "properties",
        "patternProperties",
        "dependencies",
        "definitions",
        "$defs",
    ] {
        collect_record(data, schema.get(keyword), |data, child, _| {
            collect_schema(data, child)
        });
    }
    for keyword in ["additionalProperties", "additionalItems"] {
        if let Some(child) = schema.get(keyword).filter(Node::is_object) {
            collect_schema(data, child);
        }
    }

    let mapping = schema
        .get_own("discriminator")
        .and_then(|discriminator| discriminator.get("mapping"))
        .filter(Node::is_object);
    if let Some(mapping) = mapping {
        for (_, value) in mapping.fields() {
            let target = value
                .as_str()
                .and_then(|reference| schema.resolve_reference(reference));
            if let Some(target) = target {
                collect_schema(data, target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"
openapi: 3.0.3
info: {title: Collect, version: "1"}
paths:
  /pets/{id}:
    parameters:
      - name: id
        in: path
        required: true
        schema: {type: string}
    get:
      operationId: getPet
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/Pet"
          headers:
            X-Rate-Limit:
              schema: {type: integer}
    x-internal:
      type: object
components:
  schemas:
    Pet:
      type: object
      properties:
        parent:
          $ref: "#/components/schemas/Pet"
        tags:
          type: array
          items: {type: string}
        x-hidden:
          type: string
      additionalProperties:
        $ref: "#/components/schemas/Extra"
    Extra:
      allOf:
        - $ref: "#/components/schemas/Pet"
"##;

    fn documents() -> DocumentSet {
        let mut documents = DocumentSet::new();
        documents.add_yaml("pets.yaml", DOC).unwrap();
        documents
    }

    #[test]
    fn test_collects_schemas_once_per_source() {
        let documents = documents();
        let data = collect_openapi(&documents);

        let keys: Vec<&str> = data.schemas.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "pets.yaml:/paths/~1pets~1{id}/parameters/0/schema",
                "pets.yaml:/components/schemas/Pet",
                "pets.yaml:/components/schemas/Pet/properties/tags",
                "pets.yaml:/components/schemas/Pet/properties/tags/items",
                "pets.yaml:/components/schemas/Extra",
                "pets.yaml:/paths/~1pets~1{id}/get/responses/200/headers/X-Rate-Limit/schema",
            ]
        );
    }

    #[test]
    fn test_collects_endpoints() {
        let documents = documents();
        let data = collect_openapi(&documents);

        assert_eq!(data.endpoints.len(), 1);
        let (key, info) = data.endpoints.first().unwrap();
        assert_eq!(key, "pets.yaml#/paths/~1pets~1{id}/get");
        assert_eq!(info.path, "/pets/{id}");
        assert_eq!(info.method, HttpMethod::Get);
        assert_eq!(info.operation.str("operationId"), Some("getPet"));
    }

    #[test]
    fn test_collecting_twice_adds_nothing() {
        let documents = documents();
        let mut data = collect_openapi(&documents);
        let schemas = data.schemas.len();
        let endpoints = data.endpoints.len();

        data.collect_document(documents.root("pets.yaml").unwrap());
        assert_eq!(data.schemas.len(), schemas);
        assert_eq!(data.endpoints.len(), endpoints);
        assert_eq!(data.documents.len(), 1);
    }

    #[test]
    fn test_bare_json_schema_document_is_a_schema() {
        let mut documents = DocumentSet::new();
        documents
            .add_json(
                "schema.json",
                r#"{"title": "Thing", "type": "object", "properties": {"id": {"type": "integer"}}}"#,
            )
            .unwrap();
        let data = collect_openapi(&documents);
        assert!(data.schemas.contains_key("schema.json:"));
        assert!(data.schemas.contains_key("schema.json:/properties/id"));
        assert!(data.endpoints.is_empty());
    }

    #[test]
    fn test_swagger_inline_parameter_and_header_types() {
        let mut documents = DocumentSet::new();
        documents
            .add_yaml(
                "legacy.yaml",
                r#"
swagger: "2.0"
info: {title: Legacy, version: "1"}
paths:
  /users:
    get:
      parameters:
        - name: limit
          in: query
          type: integer
      responses:
        "200":
          description: ok
          headers:
            X-Total:
              type: integer
          schema:
            type: array
            items: {type: string}
"#,
            )
            .unwrap();
        let data = collect_openapi(&documents);
        assert!(data.schemas.contains_key("legacy.yaml:/paths/~1users/get/parameters/0"));
        assert!(
            data.schemas
                .contains_key("legacy.yaml:/paths/~1users/get/responses/200/headers/X-Total")
        );
        assert!(
            data.schemas
                .contains_key("legacy.yaml:/paths/~1users/get/responses/200/schema/items")
        );
    }
}
