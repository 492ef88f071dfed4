//! Core types shared by the catalog and the internalization pass.

use crate::node::Node;

/// Mapping key that marks a pointer.
pub const REF_KEY: &str = "$ref";

/// Root key of the component registry.
pub const COMPONENTS_KEY: &str = "components";

/// Component types an OpenAPI registry may hold.
pub const COMPONENT_TYPES: &[&str] = &[
    "schemas",
    "parameters",
    "responses",
    "examples",
    "requestBodies",
    "headers",
    "securitySchemes",
    "links",
    "callbacks",
];

/// Appended to a component name until it no longer collides.
pub const DISAMBIGUATION_SUFFIX: &str = "X";

/// True if a pointer stays within its own document (`#...`).
pub fn is_local_pointer(pointer: &str) -> bool {
    pointer.split('#').next().unwrap_or("").is_empty()
}

/// One resolved pointer occurrence.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Pointer text as written.
    pub definition: String,
    /// Absolute form: target document location plus fragment.
    pub full_definition: String,
    /// Dot-path of the target inside its document, e.g. `$.components.schemas.Foo`.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// The target node itself.
    pub node: Node,
    /// Absolute location of the document holding the target.
    pub location: String,
    /// Target document differs from the root document.
    pub is_remote: bool,
}
