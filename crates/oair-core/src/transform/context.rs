use std::collections::{HashMap, HashSet};

use super::TransformOptions;
use super::id_generator::IdGenerator;
use crate::collect::CollectorData;
use crate::ir::{ApiData, ApiSchema, ApiService, EndpointId, SchemaId, ServiceId};
use crate::parse::SourceLocation;

/// Mutable state shared by every transform call of one run.
pub struct TransformerContext<'a> {
    pub(crate) id_generator: IdGenerator,
    pub(crate) input: &'a CollectorData<'a>,
    pub(crate) options: &'a TransformOptions,
    /// Schemas registered but still being filled in, by source key.
    pub(crate) incomplete_schemas: HashMap<String, SchemaId>,
    /// Source keys each discriminated schema maps explicitly.
    pub(crate) discriminator_targets: HashMap<SchemaId, HashSet<String>>,
    /// Endpoints by operation source key.
    pub(crate) endpoint_sources: HashMap<String, EndpointId>,
    pub(crate) data: ApiData,
}

impl<'a> TransformerContext<'a> {
    pub fn new(input: &'a CollectorData<'a>, options: &'a TransformOptions) -> Self {
        Self {
            id_generator: IdGenerator::new(),
            input,
            options,
            incomplete_schemas: HashMap::new(),
            discriminator_targets: HashMap::new(),
            endpoint_sources: HashMap::new(),
            data: ApiData::default(),
        }
    }

    pub fn data(&self) -> &ApiData {
        &self.data
    }

    pub fn into_data(self) -> ApiData {
        self.data
    }

    /// A schema for `key`, complete or still under construction.
    pub(crate) fn lookup_schema(&self, key: &str) -> Option<SchemaId> {
        self.data
            .schema_by_source(key)
            .or_else(|| self.incomplete_schemas.get(key).copied())
    }

    pub(crate) fn begin_schema(&mut self, key: String, schema: ApiSchema) -> SchemaId {
        let id = self.data.push_schema(schema);
        self.incomplete_schemas.insert(key, id);
        id
    }

    pub(crate) fn complete_schema(&mut self, key: &str) {
        if let Some(id) = self.incomplete_schemas.remove(key) {
            self.data.schema_index.insert(key.to_string(), id);
        }
    }

    pub(crate) fn maps_explicitly(&self, base: SchemaId, source_key: &str) -> bool {
        self.discriminator_targets
            .get(&base)
            .is_some_and(|targets| targets.contains(source_key))
    }

    /// Get or create the service for a tag.
    pub(crate) fn service(
        &mut self,
        name: &str,
        src: Option<SourceLocation>,
        description: Option<String>,
    ) -> ServiceId {
        if let Some(id) = self.data.service_by_name(name) {
            return id;
        }
        let id = self.id_generator.generate_id("service");
        self.data.push_service(ApiService {
            id,
            src,
            name: name.to_string(),
            description,
            endpoints: Vec::new(),
        })
    }
}
