//! webres - dependency-ordered, content-hashed web resources.
//!
//! Given a catalog of named scripts and styles, webres resolves the load
//! order of a request, builds each resource into a content-addressed
//! artifact (optionally minified and gzip-precompressed) and emits the
//! markup that references the artifacts.
//!
//! ```text
//! Catalog ─► DependencyResolver ─► EmissionEngine ─► ArtifactBuilder
//!                                        │
//!                                        └─► Fragment (+ translation table)
//! ```

pub mod logger;

pub mod artifact;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod manager;
pub mod markup;
pub mod provider;
pub mod resolve;
pub mod resource;
pub mod translate;
pub mod utils;

pub use artifact::{ArtifactBuilder, ArtifactRef, BuildOptions, BuildStats, Minifier};
pub use config::{ConfigError, WebresConfig};
pub use emit::{Emission, EmissionEngine, RequestContext};
pub use error::{Error, Result};
pub use manager::{ScriptManager, StyleManager};
pub use markup::{Element, Fragment, Node};
pub use provider::{ConfigProvider, ProviderRegistry, StaticProvider};
pub use resolve::{DependencyResolver, Resolution, ResolvedNode};
pub use resource::{
    AssetKind, Catalog, ResourceDefinition, ScriptCatalog, Sourced, StyleCatalog, StyleDefinition,
};
pub use translate::{Passthrough, TableTranslator, Translator};
