//! Component merging: move a foreign definition into the root registry.

use std::collections::HashSet;

use tracing::debug;

use crate::error::InternalizeError;
use crate::node::Node;
use crate::path::{component_definition, find_one, join_path, parse_component_path};
use crate::types::{Reference, COMPONENTS_KEY, DISAMBIGUATION_SUFFIX};

/// Add the target of `reference` to the root's component registry.
///
/// The registry (`components` and `components.<type>`) is created when
/// missing. The target node is appended by identity under its original
/// name, suffixed until it no longer collides with an existing key. The
/// node's contents, nested pointers included, are left exactly as they
/// are.
///
/// Returns the reference the original should now be rewritten to.
///
/// # Errors
///
/// Returns `InternalizeError::Merge` wrapping the cause if the reference
/// is not a component path, a lookup is ambiguous, or the root or
/// registry is not a mapping.
pub fn add_as_new_component(
    root: &Node,
    reference: &Reference,
) -> Result<Reference, InternalizeError> {
    insert_component(root, reference).map_err(|source| InternalizeError::Merge {
        definition: reference.full_definition.clone(),
        source: Box::new(source),
    })
}

fn insert_component(root: &Node, reference: &Reference) -> Result<Reference, InternalizeError> {
    let (component_type, item_name) = parse_component_path(&reference.path)?;

    let top = root.document_child().unwrap_or_else(|| root.clone());
    let components = find_or_create(root, &top, COMPONENTS_KEY, &join_path(&[COMPONENTS_KEY]))?;

    let container_path = join_path(&[COMPONENTS_KEY, component_type.as_str()]);
    let container = find_or_create(root, &components, &component_type, &container_path)?;

    let keys = existing_keys(&container, &container_path)?;
    let name = unique_name(&item_name, &keys);
    container.push_pair(name.as_str(), reference.node.clone());

    let definition = component_definition(&component_type, &name);
    debug!(
        from = %reference.full_definition,
        to = %definition,
        "merged component"
    );

    Ok(Reference {
        definition: definition.clone(),
        full_definition: definition,
        path: join_path(&[COMPONENTS_KEY, component_type.as_str(), name.as_str()]),
        name,
        node: reference.node.clone(),
        location: reference.location.clone(),
        is_remote: false,
    })
}

/// The single node at `path`, or a new empty mapping appended to `parent`
/// under `key`.
fn find_or_create(
    root: &Node,
    parent: &Node,
    key: &str,
    path: &str,
) -> Result<Node, InternalizeError> {
    if let Some(found) = find_one(root, path)? {
        return Ok(found);
    }

    let created = Node::empty_mapping();
    if !parent.push_pair(key, created.clone()) {
        return Err(InternalizeError::NotAMapping {
            path: parent_path(path),
            kind: parent.kind_name(),
        });
    }
    debug!(path, "created registry mapping");
    Ok(created)
}

fn parent_path(path: &str) -> String {
    match path.rfind('.') {
        Some(idx) if idx > 1 => path[..idx].to_string(),
        _ => "$".to_string(),
    }
}

/// Keys of a registry mapping.
fn existing_keys(container: &Node, path: &str) -> Result<HashSet<String>, InternalizeError> {
    container
        .keys()
        .map(|keys| keys.into_iter().collect())
        .ok_or_else(|| InternalizeError::NotAMapping {
            path: path.to_string(),
            kind: container.kind_name(),
        })
}

/// Append the suffix until `name` is free.
pub fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    let mut candidate = name.to_string();
    while taken.contains(&candidate) {
        candidate.push_str(DISAMBIGUATION_SUFFIX);
    }
    candidate
}
