//! The internalization pass: merge remote components, then rewrite pointers.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{IndexProvider, ReferenceIndex};
use crate::error::InternalizeError;
use crate::merge::add_as_new_component;
use crate::node::Node;
use crate::path::parse_component_path;
use crate::rewrite::rewrite_references;

/// Old absolute definition to new local definition.
pub type DefinitionMap = BTreeMap<String, String>;

/// State shared by both phases of one run.
pub struct Context<'a, P: IndexProvider> {
    pub provider: &'a P,
    pub index: P::Index,
    pub mapping: DefinitionMap,
}

/// Summary of one internalization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Every merged component: old absolute definition to local pointer.
    pub mapping: DefinitionMap,
    /// Remote references that are not components and were not merged.
    pub skipped: Vec<String>,
    /// Pointers rewritten to local ones.
    pub rewritten: usize,
    /// Non-local pointers left as written.
    pub untouched: Vec<String>,
}

/// Internalize every remote component reference of `root` in place.
///
/// `location` is where `root` lives; relative pointers in it resolve
/// against its directory. All remote references that point at
/// `components.<type>.<name>` are merged into the root registry before any
/// pointer is rewritten.
///
/// On error the tree may already hold merged components; use
/// [`internalized`] to keep the input untouched.
///
/// # Errors
///
/// Any failure from the index, the merge or the rewrite aborts the run.
pub fn internalize<P: IndexProvider>(
    root: &Node,
    location: &str,
    provider: &P,
) -> Result<Report, InternalizeError> {
    let index = provider.build_index(root, location)?;
    let mut ctx = Context {
        provider,
        index,
        mapping: DefinitionMap::new(),
    };

    let skipped = merge_remote_components(root, &mut ctx)?;
    let outcome = rewrite_references(root, &ctx)?;

    debug!(
        merged = ctx.mapping.len(),
        skipped = skipped.len(),
        rewritten = outcome.rewritten,
        "internalized"
    );

    Ok(Report {
        mapping: ctx.mapping,
        skipped,
        rewritten: outcome.rewritten,
        untouched: outcome.untouched,
    })
}

/// Internalize a copy of `root`, returning it only if the whole run
/// succeeds. The input tree is never modified.
pub fn internalized<P: IndexProvider>(
    root: &Node,
    location: &str,
    provider: &P,
) -> Result<(Node, Report), InternalizeError> {
    let copy = root.deep_clone();
    let report = internalize(&copy, location, provider)?;
    Ok((copy, report))
}

/// Merge phase. Returns the remote references that were skipped.
fn merge_remote_components<P: IndexProvider>(
    root: &Node,
    ctx: &mut Context<'_, P>,
) -> Result<Vec<String>, InternalizeError> {
    let mut skipped = Vec::new();

    // references() is ordered by full definition, which fixes the order
    // names are claimed in
    for reference in ctx.index.references() {
        if !reference.is_remote {
            continue;
        }
        if let Err(e) = parse_component_path(&reference.path) {
            debug!(definition = %reference.full_definition, "skipping: {}", e);
            skipped.push(reference.full_definition.clone());
            continue;
        }

        let new_reference = add_as_new_component(root, reference)?;
        ctx.mapping
            .insert(reference.full_definition.clone(), new_reference.full_definition);
    }
    Ok(skipped)
}
