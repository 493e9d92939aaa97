use indexmap::IndexMap;
use serde::Serialize;

use super::operations::{ApiEndpoint, ApiPath, ApiService, HttpMethod};
use super::schemas::ApiSchema;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in its [`ApiData`] arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to an [`ApiSchema`]. Two handles are equal exactly when they
    /// denote the same schema.
    SchemaId
);
arena_id!(
    /// Handle to an [`ApiEndpoint`].
    EndpointId
);
arena_id!(
    /// Handle to an [`ApiPath`].
    PathId
);
arena_id!(
    /// Handle to an [`ApiService`].
    ServiceId
);

/// The fully linked, version-agnostic IR of one transformation run.
///
/// Entities live in arenas in creation order and refer to each other through
/// handles, so cycles (a schema whose property is itself) are plain data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiData {
    pub services: Vec<ApiService>,
    pub paths: Vec<ApiPath>,
    pub endpoints: Vec<ApiEndpoint>,
    pub schemas: Vec<ApiSchema>,

    #[serde(skip)]
    pub(crate) service_index: IndexMap<String, ServiceId>,
    #[serde(skip)]
    pub(crate) path_index: IndexMap<String, PathId>,
    #[serde(skip)]
    pub(crate) endpoint_index: IndexMap<String, EndpointId>,
    #[serde(skip)]
    pub(crate) schema_index: IndexMap<String, SchemaId>,
}

impl ApiData {
    pub fn schema(&self, id: SchemaId) -> &ApiSchema {
        &self.schemas[id.0]
    }

    pub fn endpoint(&self, id: EndpointId) -> &ApiEndpoint {
        &self.endpoints[id.0]
    }

    pub fn path(&self, id: PathId) -> &ApiPath {
        &self.paths[id.0]
    }

    pub fn service(&self, id: ServiceId) -> &ApiService {
        &self.services[id.0]
    }

    pub(crate) fn schema_mut(&mut self, id: SchemaId) -> &mut ApiSchema {
        &mut self.schemas[id.0]
    }

    pub(crate) fn path_mut(&mut self, id: PathId) -> &mut ApiPath {
        &mut self.paths[id.0]
    }

    pub(crate) fn service_mut(&mut self, id: ServiceId) -> &mut ApiService {
        &mut self.services[id.0]
    }

    /// Look up a completed schema by its source key (`"{file}:{path}"`).
    pub fn schema_by_source(&self, key: &str) -> Option<SchemaId> {
        self.schema_index.get(key).copied()
    }

    /// Look up a schema by its resolved name. Names are not unique across a
    /// run; the first schema carrying the name wins.
    pub fn schema_by_name(&self, name: &str) -> Option<SchemaId> {
        self.schemas
            .iter()
            .position(|schema| schema.name == name)
            .map(SchemaId)
    }

    pub fn endpoint_by_route(&self, method: HttpMethod, path: &str) -> Option<EndpointId> {
        self.endpoint_index.get(&route_key(method, path)).copied()
    }

    pub fn endpoint_by_name(&self, name: &str) -> Option<EndpointId> {
        self.endpoints
            .iter()
            .position(|endpoint| endpoint.name == name)
            .map(EndpointId)
    }

    pub fn path_by_name(&self, path: &str) -> Option<PathId> {
        self.path_index.get(path).copied()
    }

    pub fn service_by_name(&self, name: &str) -> Option<ServiceId> {
        self.service_index.get(name).copied()
    }

    pub(crate) fn push_schema(&mut self, schema: ApiSchema) -> SchemaId {
        self.schemas.push(schema);
        SchemaId(self.schemas.len() - 1)
    }

    pub(crate) fn push_path(&mut self, path: ApiPath) -> PathId {
        let id = PathId(self.paths.len());
        self.path_index.insert(path.path.clone(), id);
        self.paths.push(path);
        id
    }

    pub(crate) fn push_endpoint(&mut self, endpoint: ApiEndpoint) -> EndpointId {
        let id = EndpointId(self.endpoints.len());
        self.endpoint_index
            .insert(route_key(endpoint.method, &endpoint.path), id);
        self.endpoints.push(endpoint);
        id
    }

    pub(crate) fn push_service(&mut self, service: ApiService) -> ServiceId {
        let id = ServiceId(self.services.len());
        self.service_index.insert(service.name.clone(), id);
        self.services.push(service);
        id
    }
}

/// The `"{method}:{path}"` key endpoints are indexed by.
pub fn route_key(method: HttpMethod, path: &str) -> String {
    format!("{}:{}", method.as_str(), path)
}
