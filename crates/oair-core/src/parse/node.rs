use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::DocumentSet;
use super::document::OpenApiDocument;
use super::ref_resolve::{escape_pointer_segment, normalize_reference};

/// Where a node was defined: the originating file plus a JSON pointer into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub path: String,
}

impl SourceLocation {
    /// The identity key used for deduplication: `"{file}:{path}"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.file, self.path)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.path)
    }
}

/// A dereferenced view of a value inside a loaded document.
///
/// Navigation resolves `$ref` transparently. A node consisting of nothing but
/// a `$ref` collapses onto the referenced node, so every reference to a schema
/// shares the target's [`SourceLocation`]. A node with `$ref` plus sibling keys
/// keeps its own location and exposes the target through [`Node::reference`];
/// lookups of keys it does not define itself fall through to the target.
///
/// JSON `null` is treated as absent everywhere.
#[derive(Clone)]
pub struct Node<'a> {
    pub(crate) documents: &'a DocumentSet,
    pub(crate) document: &'a OpenApiDocument,
    pub(crate) value: &'a Value,
    pub(crate) path: String,
    pub(crate) reference: Option<Box<Node<'a>>>,
}

impl<'a> Node<'a> {
    pub fn src(&self) -> SourceLocation {
        SourceLocation {
            file: self.document.file.clone(),
            path: self.path.clone(),
        }
    }

    /// Shorthand for `self.src().key()`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.document.file, self.path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn document(&self) -> &'a OpenApiDocument {
        self.document
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The node this one was dereferenced from, when it carried `$ref` next to
    /// other keys.
    pub fn reference(&self) -> Option<&Node<'a>> {
        self.reference.as_deref()
    }

    pub fn is_object(&self) -> bool {
        self.value.is_object()
    }

    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    /// The raw value stored under `key`, falling back to the referenced node.
    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.raw_own(key)
            .or_else(|| self.reference.as_ref().and_then(|r| r.raw(key)))
    }

    pub fn has(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.raw(key).and_then(Value::as_str)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.raw(key).and_then(Value::as_bool)
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.raw(key).and_then(Value::as_u64)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.raw(key).and_then(Value::as_f64)
    }

    /// The raw value under `key` on this node alone, without falling back to
    /// the referenced node.
    pub fn raw_own(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|value| !value.is_null())
    }

    /// Like [`Node::get`], but only for keys this node defines itself.
    pub fn get_own(&self, key: &str) -> Option<Node<'a>> {
        self.raw_own(key).map(|child| self.child(child, key))
    }

    /// Navigate to the child stored under `key`, dereferencing it.
    pub fn get(&self, key: &str) -> Option<Node<'a>> {
        match self.raw_own(key) {
            Some(child) => Some(self.child(child, key)),
            None => self.reference.as_ref().and_then(|r| r.get(key)),
        }
    }

    /// Dereferenced elements of an array node, skipping `null` entries.
    pub fn elements(&self) -> Vec<Node<'a>> {
        match self.value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| self.child(item, &index.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Dereferenced entries of an object node in document order. Keys defined
    /// only on the referenced node follow the node's own keys.
    pub fn entries(&self) -> Vec<(&'a str, Node<'a>)> {
        let mut entries: Vec<(&'a str, Node<'a>)> = match self.value {
            Value::Object(map) => map
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.as_str(), self.child(value, key)))
                .collect(),
            _ => Vec::new(),
        };
        if let Some(ref target) = self.reference {
            for (key, node) in target.entries() {
                if self.raw_own(key).is_none() {
                    entries.push((key, node));
                }
            }
        }
        entries
    }

    /// Raw key/value pairs, merged with the referenced node the same way as
    /// [`Node::entries`].
    pub fn fields(&self) -> Vec<(&'a str, &'a Value)> {
        let mut fields: Vec<(&'a str, &'a Value)> = match self.value {
            Value::Object(map) => map
                .iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.as_str(), value))
                .collect(),
            _ => Vec::new(),
        };
        if let Some(ref target) = self.reference {
            for (key, value) in target.fields() {
                if self.raw_own(key).is_none() {
                    fields.push((key, value));
                }
            }
        }
        fields
    }

    /// Resolve a reference string relative to this node's document. Bare
    /// names (as allowed in discriminator mappings) point at component schemas.
    pub fn resolve_reference(&self, reference: &str) -> Option<Node<'a>> {
        let normalized = normalize_reference(reference, self.document.version);
        self.documents.resolve(self.document, &normalized)
    }


    fn child(&self, value: &'a Value, segment: &str) -> Node<'a> {
        let path = format!("{}/{}", self.path, escape_pointer_segment(segment));
        self.documents.dereference(self.document, value, path)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Node");
        debug.field("src", &self.src());
        if let Some(ref target) = self.reference {
            debug.field("reference", &target.src());
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::DocumentSet;

    const DOC: &str = r##"
openapi: 3.1.0
info:
  title: Nodes
  version: "1"
components:
  schemas:
    Pet:
      type: object
      title: A pet
      properties:
        self:
          $ref: "#/components/schemas/Pet"
        nothing: null
    Alias:
      $ref: "#/components/schemas/Pet"
    Described:
      $ref: "#/components/schemas/Pet"
      description: Pet with docs
    LoopA:
      $ref: "#/components/schemas/LoopB"
    LoopB:
      $ref: "#/components/schemas/LoopA"
    Dangling:
      $ref: "#/components/schemas/Missing"
"##;

    fn documents() -> DocumentSet {
        let mut documents = DocumentSet::new();
        documents.add_yaml("pets.yaml", DOC).unwrap();
        documents
    }

    #[test]
    fn test_pure_ref_collapses_onto_target() {
        let documents = documents();
        let root = documents.root("pets.yaml").unwrap();
        let schemas = root.get("components").unwrap().get("schemas").unwrap();

        let pet = schemas.get("Pet").unwrap();
        let self_ref = pet.get("properties").unwrap().get("self").unwrap();
        assert_eq!(self_ref.key(), pet.key());
        assert_eq!(pet.path(), "/components/schemas/Pet");

        let alias = schemas.get("Alias").unwrap();
        assert_eq!(alias.key(), "pets.yaml:/components/schemas/Pet");
        assert!(alias.reference().is_none());
    }

    #[test]
    fn test_ref_with_siblings_keeps_location() {
        let documents = documents();
        let root = documents.root("pets.yaml").unwrap();
        let described = root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Described"))
            .unwrap();

        assert_eq!(described.path(), "/components/schemas/Described");
        assert_eq!(described.str("description"), Some("Pet with docs"));
        // Falls through to the referenced schema for keys it doesn't define.
        assert_eq!(described.str("type"), Some("object"));
        assert_eq!(described.str("title"), Some("A pet"));
        let target = described.reference().unwrap();
        assert_eq!(target.path(), "/components/schemas/Pet");

        let keys: Vec<&str> = described.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["$ref", "description", "type", "title", "properties"]);

        // Own-key lookups never reach the target.
        assert_eq!(
            described.raw_own("description").and_then(|v| v.as_str()),
            Some("Pet with docs")
        );
        assert!(described.raw_own("type").is_none());
        assert!(described.get_own("properties").is_none());
        assert!(described.get("properties").is_some());
    }

    #[test]
    fn test_null_values_are_absent() {
        let documents = documents();
        let root = documents.root("pets.yaml").unwrap();
        let properties = root
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get("Pet"))
            .and_then(|p| p.get("properties"))
            .unwrap();
        assert!(properties.get("nothing").is_none());
        assert_eq!(properties.entries().len(), 1);
    }

    #[test]
    fn test_ref_loops_and_dangling_refs_degrade() {
        let documents = documents();
        let root = documents.root("pets.yaml").unwrap();
        let schemas = root.get("components").unwrap().get("schemas").unwrap();

        let looped = schemas.get("LoopA").unwrap();
        assert!(looped.has("$ref"));

        let dangling = schemas.get("Dangling").unwrap();
        assert_eq!(dangling.path(), "/components/schemas/Dangling");
        assert!(dangling.reference().is_none());
    }

    #[test]
    fn test_resolve_reference_bare_name() {
        let documents = documents();
        let root = documents.root("pets.yaml").unwrap();
        let pet = root.resolve_reference("Pet").unwrap();
        assert_eq!(pet.path(), "/components/schemas/Pet");
        let pet = root.resolve_reference("#/components/schemas/Pet").unwrap();
        assert_eq!(pet.path(), "/components/schemas/Pet");
        assert!(root.resolve_reference("Nope").is_none());
    }
}
