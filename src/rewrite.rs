//! Pointer rewriting, the second phase of internalization.

use tracing::{debug, warn};

use crate::catalog::{IndexProvider, ReferenceIndex};
use crate::error::InternalizeError;
use crate::internalize::Context;
use crate::location::resolve_definition;
use crate::node::{Node, NodeKind};
use crate::types::{is_local_pointer, REF_KEY};
use crate::walk::walk;

/// What the rewrite phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// Number of pointers replaced with local ones.
    pub rewritten: usize,
    /// Non-local pointers left as written, in traversal order.
    pub untouched: Vec<String>,
}

/// Rewrite every non-local `$ref` in `root` that the merge phase moved.
///
/// Each pointer is resolved against the origin of the mapping that holds
/// it, not against the root, so pointers inside relocated components still
/// resolve relative to the document they were written in. Pointers with no
/// entry in the context's mapping are checked with a throwaway index of
/// their own and left unchanged; a failed check is only logged.
///
/// # Errors
///
/// Returns `InternalizeError::OriginNotFound` if a mapping's document is
/// unknown to the index, and propagates walk failures.
pub fn rewrite_references<P: IndexProvider>(
    root: &Node,
    ctx: &Context<'_, P>,
) -> Result<RewriteOutcome, InternalizeError> {
    let mut outcome = RewriteOutcome::default();

    walk::<InternalizeError, _>(root, &mut |_, node| {
        for value in ref_values(node) {
            let Some(pointer) = value.as_str() else {
                continue;
            };
            if is_local_pointer(&pointer) {
                continue;
            }

            let origin = ctx
                .index
                .find_origin(node)
                .ok_or_else(|| InternalizeError::OriginNotFound {
                    pointer: pointer.clone(),
                })?;
            let full_definition = resolve_definition(origin, &pointer);

            match ctx.mapping.get(&full_definition) {
                Some(local) => {
                    debug!(from = %pointer, to = %local, "rewrote pointer");
                    value.set_str(local.as_str());
                    outcome.rewritten += 1;
                }
                None => {
                    check_resolvable(ctx.provider, origin, &pointer);
                    outcome.untouched.push(pointer);
                }
            }
        }
        Ok(())
    })?;

    Ok(outcome)
}

/// Value nodes stored under `$ref` in a mapping.
fn ref_values(node: &Node) -> Vec<Node> {
    match &*node.kind() {
        NodeKind::Mapping(pairs) => pairs
            .iter()
            .filter(|(key, _)| key.value == REF_KEY)
            .map(|(_, value)| value.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// Index the pointer on its own, resolved against its origin, and log
/// whether it resolves. Never changes the pointer and never fails the pass.
// TODO: internalize non-component remote targets (path items, inline
// schemas) instead of only checking that they resolve.
fn check_resolvable<P: IndexProvider>(provider: &P, origin: &str, pointer: &str) {
    let scoped_root = Node::document(Node::mapping(vec![(REF_KEY, Node::string(pointer))]));
    let scoped = match provider.build_index(&scoped_root, origin) {
        Ok(scoped) => scoped,
        Err(e) => {
            warn!(pointer, origin, "cannot check pointer: {}", e);
            return;
        }
    };

    let failure = scoped
        .resolve()
        .into_iter()
        .find(|unresolved| unresolved.definition == pointer);
    match failure {
        Some(unresolved) => {
            warn!(pointer, origin, reason = %unresolved.reason, "pointer does not resolve")
        }
        None => debug!(pointer, origin, "left non-component pointer in place"),
    }
}
