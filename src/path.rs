//! Dot-path utilities.
//!
//! Targets are located with dot-paths rooted at `$`, e.g.
//! `$.components.schemas.Foo`. Segments that contain a `.` are written in
//! bracket form (`$.components.schemas['a.b']`) so they never split.

use crate::error::{InternalizeError, PathError};
use crate::node::{Node, NodeKind};
use crate::types::COMPONENTS_KEY;

const ROOT_PREFIX: &str = "$.";
const COMPONENT_PREFIX: &str = "$.components.";

/// Split a component path into `(component_type, item_name)`.
///
/// Only `$.components.<type>.<name>` is accepted; anything deeper or
/// shallower is a [`PathError`].
pub fn parse_component_path(path: &str) -> Result<(String, String), PathError> {
    let rest = path
        .strip_prefix(COMPONENT_PREFIX)
        .ok_or_else(|| PathError::MissingPrefix {
            prefix: COMPONENT_PREFIX,
            path: path.to_string(),
        })?;

    let mut parts = split_segments(rest);
    match parts.len() {
        2 => {
            let item_name = parts.pop().unwrap_or_default();
            let component_type = parts.pop().unwrap_or_default();
            Ok((component_type, item_name))
        }
        _ => Err(PathError::NotAComponentPath {
            path: path.to_string(),
        }),
    }
}

/// Split a dot-path into its segments, dropping the leading `$`.
pub fn parse_path(path: &str) -> Result<Vec<String>, PathError> {
    let rest = path
        .strip_prefix(ROOT_PREFIX)
        .ok_or_else(|| PathError::MissingPrefix {
            prefix: ROOT_PREFIX,
            path: path.to_string(),
        })?;
    Ok(split_segments(rest))
}

/// Split on `.` while keeping bracketed `['...']` segments whole.
fn split_segments(rest: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut remaining = rest;
    while !remaining.is_empty() {
        if let Some(inner) = remaining.strip_prefix("['") {
            if let Some(end) = inner.find("']") {
                segments.push(inner[..end].to_string());
                remaining = inner[end + 2..].trim_start_matches('.');
                continue;
            }
        }
        match remaining.find(['.', '[']) {
            Some(0) => {
                // stray separator or unterminated bracket: take it literally
                let (head, tail) = remaining.split_at(1);
                segments.push(head.to_string());
                remaining = tail.trim_start_matches('.');
            }
            Some(idx) => {
                segments.push(remaining[..idx].to_string());
                remaining = remaining[idx..].trim_start_matches('.');
            }
            None => {
                segments.push(remaining.to_string());
                remaining = "";
            }
        }
    }
    segments
}

/// Render one segment, bracketing it if it would otherwise split.
fn render_segment(segment: &str) -> String {
    if segment.contains(['.', '[', ']']) {
        format!("['{}']", segment)
    } else {
        segment.to_string()
    }
}

/// Build a dot-path from segments.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut path = String::from("$");
    for segment in segments {
        let rendered = render_segment(segment.as_ref());
        if !rendered.starts_with('[') {
            path.push('.');
        }
        path.push_str(&rendered);
    }
    path
}

/// Decode a JSON pointer fragment (`#/a/b~1c`) into its segments.
pub fn fragment_segments(fragment: &str) -> Vec<String> {
    let pointer = fragment.trim_start_matches('#').trim_start_matches('/');
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .split('/')
        .map(|part| part.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Convert a JSON pointer fragment into a dot-path.
pub fn fragment_to_path(fragment: &str) -> String {
    join_path(&fragment_segments(fragment))
}

/// Local pointer for a component: `#/components/<type>/<name>`.
///
/// `type` and `name` are decoded segments; `~` and `/` are escaped back.
pub fn component_definition(component_type: &str, name: &str) -> String {
    format!(
        "#/{}/{}/{}",
        COMPONENTS_KEY,
        escape_segment(component_type),
        escape_segment(name)
    )
}

/// Encode one JSON pointer segment.
fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Every node reachable from `root` along `path`.
///
/// Documents are stepped through transparently. Duplicate keys fan out,
/// so a path can match several nodes.
pub fn find_nodes(root: &Node, path: &str) -> Result<Vec<Node>, PathError> {
    let segments = parse_path(path)?;
    let start = root.document_child().unwrap_or_else(|| root.clone());

    let mut current = vec![start];
    for segment in &segments {
        current = current.iter().flat_map(|node| step(node, segment)).collect();
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

/// Children of `node` addressed by one segment: every value under a
/// mapping key, or a sequence item by index.
fn step(node: &Node, segment: &str) -> Vec<Node> {
    match &*node.kind() {
        NodeKind::Mapping(_) => node.get_all(segment),
        NodeKind::Sequence(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx).cloned())
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// The single node at `path`, `None` if absent.
///
/// More than one match is an [`InternalizeError::AmbiguousLookup`].
pub fn find_one(root: &Node, path: &str) -> Result<Option<Node>, InternalizeError> {
    let mut found = find_nodes(root, path)?;
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        count => Err(InternalizeError::AmbiguousLookup {
            path: path.to_string(),
            count,
        }),
    }
}
