use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::types::{EndpointId, PathId, SchemaId};
use crate::parse::SourceLocation;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Every method a path item can carry, in OpenAPI declaration order.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// The lowercase key used for this method in a path item.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of endpoints sharing an OpenAPI tag.
#[derive(Debug, Clone, Serialize)]
pub struct ApiService {
    pub id: String,
    pub src: Option<SourceLocation>,
    pub name: String,
    pub description: Option<String>,
    pub endpoints: Vec<EndpointId>,
}

/// A path template with its shared parameters and per-method endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ApiPath {
    pub id: String,
    pub src: SourceLocation,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub path: String,
    pub parameters: Vec<ApiParameter>,
    pub endpoints: IndexMap<HttpMethod, EndpointId>,
}

impl ApiPath {
    pub fn endpoint(&self, method: HttpMethod) -> Option<EndpointId> {
        self.endpoints.get(&method).copied()
    }
}

/// A single operation on a path.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEndpoint {
    pub id: String,
    pub src: SourceLocation,
    pub name: String,
    pub path: String,
    pub path_info: PathId,
    pub method: HttpMethod,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Path-level parameters merged with the operation's own; operation
    /// entries replace path entries of the same name.
    pub parameters: Vec<ApiParameter>,
    pub deprecated: bool,
    pub request_body: Option<ApiRequestBody>,
    pub responses: Vec<ApiResponse>,
    pub tags: Vec<String>,
    pub custom: IndexMap<String, Value>,
}

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiParameterTarget {
    Path,
    Query,
    Header,
    Cookie,
    /// OpenAPI 2.0 `formData`.
    FormData,
}

impl ApiParameterTarget {
    /// Parse an `in` value. `body` is not a parameter target.
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(ApiParameterTarget::Path),
            "query" => Some(ApiParameterTarget::Query),
            "header" => Some(ApiParameterTarget::Header),
            "cookie" => Some(ApiParameterTarget::Cookie),
            "formData" => Some(ApiParameterTarget::FormData),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiParameter {
    pub id: String,
    pub src: SourceLocation,
    pub name: String,
    pub target: ApiParameterTarget,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub allow_empty_value: Option<bool>,
    pub style: Option<String>,
    pub explode: Option<bool>,
    pub allow_reserved: Option<bool>,
    pub schema: Option<SchemaId>,
    pub custom: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestBody {
    pub id: String,
    pub src: SourceLocation,
    pub description: Option<String>,
    pub required: bool,
    pub content: Vec<ApiContent>,
    pub custom: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub id: String,
    pub src: SourceLocation,
    /// The response key: a status code, a range like `4XX`, or `default`.
    pub status_code: String,
    pub description: Option<String>,
    pub headers: Vec<ApiHeader>,
    pub content_options: Vec<ApiContent>,
    pub custom: IndexMap<String, Value>,
}

/// One media type of a request or response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiContent {
    pub id: String,
    pub src: SourceLocation,
    #[serde(rename = "type")]
    pub media_type: String,
    pub schema: Option<SchemaId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiHeader {
    pub id: String,
    pub src: SourceLocation,
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub schema: Option<SchemaId>,
}
