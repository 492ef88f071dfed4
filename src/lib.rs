//! OpenAPI reference internalization
//!
//! Turns an OpenAPI document whose `$ref` pointers reach into other
//! documents into a self-contained one. Every remote pointer that targets a
//! component (`other.yaml#/components/<type>/<name>`) is copied into the
//! root document's `components` registry and rewritten to a local pointer.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use openapi_internalize::{
//!     emit, internalize, load_document, location, CatalogConfig, Format, FsIndexProvider,
//! };
//!
//! let path = Path::new("spec.yaml");
//! let root = load_document(path).unwrap();
//! let provider = FsIndexProvider::new(CatalogConfig::new("."));
//!
//! let report = internalize(&root, &location::from_path(path), &provider).unwrap();
//! println!("merged {} components", report.mapping.len());
//! print!("{}", emit(&root, Format::Yaml).unwrap());
//! ```
//!
//! # How it works
//!
//! | Phase | What happens |
//! |-------|--------------|
//! | Index | Every pointer reachable from the root is followed, across documents |
//! | Merge | Each remote component target is appended to `components.<type>`, renamed with an `X` suffix on collision |
//! | Rewrite | Each non-local `$ref` whose target was merged is replaced with `#/components/<type>/<name>` |
//!
//! Merged nodes keep their identity, so pointers nested inside them are
//! resolved against the document they were written in, not the root.
//!
//! Remote pointers that do not target a component (path items, inline
//! schemas) are checked for resolvability and left as written.

mod catalog;
mod error;
mod format;
mod internalize;
pub mod location;
mod loader;
mod merge;
mod node;
mod path;
mod rewrite;
mod types;
mod walk;

pub use catalog::{
    Catalog, CatalogConfig, FsIndexProvider, IndexProvider, ReferenceIndex, UnresolvedReference,
};
pub use error::{CatalogError, InternalizeError, LoadError, PathError, WalkError};
pub use format::{emit, parse, parse_json, parse_yaml, Format};
pub use internalize::{internalize, internalized, Context, DefinitionMap, Report};
pub use loader::{load_document, load_document_auto, load_document_str};
pub use merge::{add_as_new_component, unique_name};
pub use node::{Node, NodeId, NodeKind, Scalar, ScalarStyle};
pub use path::{
    component_definition, find_nodes, find_one, fragment_to_path, parse_component_path,
    parse_path,
};
pub use rewrite::{rewrite_references, RewriteOutcome};
pub use types::{
    is_local_pointer, Reference, COMPONENTS_KEY, COMPONENT_TYPES, DISAMBIGUATION_SUFFIX, REF_KEY,
};
pub use walk::walk;

#[cfg(feature = "remote")]
pub use loader::load_document_url;
