//! Collection and transformation of OpenAPI 2.0/3.0/3.1 documents into a
//! version-agnostic, fully linked IR.
//!
//! ```no_run
//! use oair_core::parse::DocumentSet;
//!
//! let mut documents = DocumentSet::new();
//! documents.add_yaml("petstore.yaml", &std::fs::read_to_string("petstore.yaml")?)?;
//! let api = oair_core::transform(&documents)?;
//! for service in &api.services {
//!     println!("{}: {} endpoints", service.name, service.endpoints.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod collect;
pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use collect::{CollectorData, EndpointInfo, collect_openapi};
pub use error::{ConfigError, ParseError, TransformError};
pub use ir::ApiData;
pub use transform::{TransformOptions, transform, transform_openapi, transform_with_options};
