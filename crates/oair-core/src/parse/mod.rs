pub mod document;
pub mod node;
pub mod ref_resolve;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ParseError;
pub use document::{OpenApiDocument, OpenApiVersion};
pub use node::{Node, SourceLocation};

/// Parse a document from YAML.
pub fn from_yaml(file: &str, input: &str) -> Result<OpenApiDocument, ParseError> {
    let root: Value = serde_yaml_ng::from_str(input)?;
    OpenApiDocument::from_value(file, root)
}

/// Parse a document from JSON.
pub fn from_json(file: &str, input: &str) -> Result<OpenApiDocument, ParseError> {
    let root: Value = serde_json::from_str(input)?;
    OpenApiDocument::from_value(file, root)
}

/// Every document of one run, indexed by file name so that cross-file `$ref`s
/// can be resolved.
#[derive(Debug, Default)]
pub struct DocumentSet {
    documents: Vec<OpenApiDocument>,
    index: HashMap<String, usize>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, document: OpenApiDocument) -> Result<&OpenApiDocument, ParseError> {
        if self.index.contains_key(&document.file) {
            return Err(ParseError::DuplicateDocument(document.file));
        }
        let position = self.documents.len();
        self.index.insert(document.file.clone(), position);
        self.documents.push(document);
        Ok(&self.documents[position])
    }

    pub fn add_yaml(&mut self, file: &str, input: &str) -> Result<&OpenApiDocument, ParseError> {
        self.add(from_yaml(file, input)?)
    }

    pub fn add_json(&mut self, file: &str, input: &str) -> Result<&OpenApiDocument, ParseError> {
        self.add(from_json(file, input)?)
    }

    pub fn get(&self, file: &str) -> Option<&OpenApiDocument> {
        self.index.get(file).map(|&position| &self.documents[position])
    }

    pub fn documents(&self) -> &[OpenApiDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The dereferenced root node of the document loaded as `file`.
    pub fn root(&self, file: &str) -> Option<Node<'_>> {
        self.get(file).map(|document| self.root_of(document))
    }

    /// Root nodes of every document, in load order.
    pub fn roots(&self) -> impl Iterator<Item = Node<'_>> {
        self.documents.iter().map(|document| self.root_of(document))
    }

    fn root_of<'a>(&'a self, document: &'a OpenApiDocument) -> Node<'a> {
        self.dereference(document, &document.root, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_and_yaml() {
        let json = from_json("a.json", r#"{"openapi": "3.0.0", "info": {"title": "A", "version": "1"}}"#)
            .unwrap();
        assert_eq!(json.version, OpenApiVersion::V3_0);
        assert_eq!(json.header.info.title, "A");

        let yaml = from_yaml("b.yaml", "swagger: \"2.0\"\ninfo:\n  title: B\n  version: \"1\"\n").unwrap();
        assert_eq!(yaml.version, OpenApiVersion::V2_0);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            from_json("a.json", "{not json"),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            from_yaml("a.yaml", "openapi: [unclosed"),
            Err(ParseError::Yaml(_))
        ));
    }

    #[test]
    fn test_duplicate_document() {
        let mut documents = DocumentSet::new();
        documents.add_json("a.json", r#"{"openapi": "3.1.0"}"#).unwrap();
        let err = documents.add_json("a.json", r#"{"openapi": "3.1.0"}"#).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateDocument(file) if file == "a.json"));
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn test_root_node() {
        let mut documents = DocumentSet::new();
        documents.add_json("a.json", r#"{"openapi": "3.1.0"}"#).unwrap();
        let root = documents.root("a.json").unwrap();
        assert_eq!(root.key(), "a.json:");
        assert!(documents.root("b.json").is_none());
        assert_eq!(documents.roots().count(), 1);
    }
}
