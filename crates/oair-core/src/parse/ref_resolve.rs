use std::collections::HashSet;

use log::warn;
use serde_json::Value;

use super::DocumentSet;
use super::document::{OpenApiDocument, OpenApiVersion};
use super::node::Node;

impl DocumentSet {
    /// Wrap `value` (found at `path` in `document`) in a [`Node`], following
    /// `$ref` chains until a real node is reached.
    pub(crate) fn dereference<'a>(
        &'a self,
        document: &'a OpenApiDocument,
        value: &'a Value,
        path: String,
    ) -> Node<'a> {
        let mut visited = HashSet::new();
        self.dereference_chain(document, value, path, &mut visited)
    }

    /// Resolve a `$ref` string against `document` and dereference the target.
    pub(crate) fn resolve<'a>(
        &'a self,
        document: &'a OpenApiDocument,
        reference: &str,
    ) -> Option<Node<'a>> {
        let (target_document, value, path) = self.locate(document, reference)?;
        Some(self.dereference(target_document, value, path))
    }

    fn dereference_chain<'a>(
        &'a self,
        document: &'a OpenApiDocument,
        value: &'a Value,
        path: String,
        visited: &mut HashSet<String>,
    ) -> Node<'a> {
        let node = Node {
            documents: self,
            document,
            value,
            path,
            reference: None,
        };
        let Some(reference) = value.get("$ref").and_then(Value::as_str) else {
            return node;
        };
        if !visited.insert(node.key()) {
            warn!("circular $ref chain through {}", node.src());
            return node;
        }
        let Some((target_document, target_value, target_path)) = self.locate(document, reference)
        else {
            warn!("unresolved $ref {reference:?} at {}", node.src());
            return node;
        };
        let target = self.dereference_chain(target_document, target_value, target_path, visited);

        let has_siblings = value.as_object().is_some_and(|map| map.len() > 1);
        if has_siblings {
            Node {
                reference: Some(Box::new(target)),
                ..node
            }
        } else {
            target
        }
    }

    fn locate<'a>(
        &'a self,
        document: &'a OpenApiDocument,
        reference: &str,
    ) -> Option<(&'a OpenApiDocument, &'a Value, String)> {
        let (file, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let target_document = if file.is_empty() {
            document
        } else {
            self.get(&resolve_relative_file(&document.file, file))?
        };
        let value = if pointer.is_empty() {
            &target_document.root
        } else {
            target_document.root.pointer(pointer)?
        };
        Some((target_document, value, pointer.to_string()))
    }
}

/// Turn a discriminator mapping value into a `$ref` string. Values that are
/// not references name a component schema.
pub(crate) fn normalize_reference(reference: &str, version: OpenApiVersion) -> String {
    if reference.contains('#') || reference.contains('/') {
        return reference.to_string();
    }
    match version {
        OpenApiVersion::V2_0 => format!("#/definitions/{}", escape_pointer_segment(reference)),
        _ => format!(
            "#/components/schemas/{}",
            escape_pointer_segment(reference)
        ),
    }
}

/// Resolve `relative` against the directory of `base`.
pub(crate) fn resolve_relative_file(base: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.contains("://") {
        return relative.to_string();
    }
    let mut segments: Vec<&str> = match base.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Escape a JSON pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Undo [`escape_pointer_segment`].
pub fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_segments() {
        assert_eq!(escape_pointer_segment("/pets/{id}"), "~1pets~1{id}");
        assert_eq!(escape_pointer_segment("a~b"), "a~0b");
        assert_eq!(unescape_pointer_segment("~1pets~1{id}"), "/pets/{id}");
        assert_eq!(unescape_pointer_segment("a~0b"), "a~b");
    }

    #[test]
    fn test_resolve_relative_file() {
        assert_eq!(resolve_relative_file("api.yaml", "models.yaml"), "models.yaml");
        assert_eq!(
            resolve_relative_file("specs/api.yaml", "./models.yaml"),
            "specs/models.yaml"
        );
        assert_eq!(
            resolve_relative_file("specs/v1/api.yaml", "../common/models.yaml"),
            "specs/common/models.yaml"
        );
        assert_eq!(
            resolve_relative_file("api.yaml", "../shared.yaml"),
            "../shared.yaml"
        );
        assert_eq!(
            resolve_relative_file("specs/api.yaml", "https://example.com/s.yaml"),
            "https://example.com/s.yaml"
        );
    }

    #[test]
    fn test_normalize_reference() {
        assert_eq!(
            normalize_reference("Dog", OpenApiVersion::V3_1),
            "#/components/schemas/Dog"
        );
        assert_eq!(
            normalize_reference("Dog", OpenApiVersion::V2_0),
            "#/definitions/Dog"
        );
        assert_eq!(
            normalize_reference("#/components/schemas/Dog", OpenApiVersion::V3_0),
            "#/components/schemas/Dog"
        );
        assert_eq!(
            normalize_reference("models.yaml#/Dog", OpenApiVersion::V3_0),
            "models.yaml#/Dog"
        );
    }

    #[test]
    fn test_cross_file_reference() {
        let mut documents = DocumentSet::new();
        documents
            .add_yaml(
                "specs/api.yaml",
                r#"
openapi: 3.0.0
info: {title: Api, version: "1"}
paths: {}
components:
  schemas:
    Order:
      type: object
      properties:
        item:
          $ref: "./models.yaml#/Item"
"#,
            )
            .unwrap();
        documents
            .add_yaml(
                "specs/models.yaml",
                "openapi: 3.0.0\ninfo: {title: Models, version: \"1\"}\nItem:\n  type: string\n",
            )
            .unwrap();

        let root = documents.root("specs/api.yaml").unwrap();
        let item = root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Order"))
            .and_then(|o| o.get("properties"))
            .and_then(|p| p.get("item"))
            .unwrap();
        assert_eq!(item.key(), "specs/models.yaml:/Item");
        assert_eq!(item.str("type"), Some("string"));
        assert_eq!(item.document().file, "specs/models.yaml");
    }
}
