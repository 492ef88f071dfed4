//! Reference catalog: the index the internalization pass works from.
//!
//! The pass only needs two things from an index: every reference reachable
//! from the root (following pointers across documents as far as they go)
//! and, for any node, the location of the document it came from. Those are
//! the [`ReferenceIndex`] and [`IndexProvider`] traits. [`Catalog`] is the
//! implementation that reads documents from disk and, with the `remote`
//! feature, over HTTP.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use tracing::debug;

use crate::error::{CatalogError, WalkError};
use crate::loader::load_document;
use crate::location::{is_url, normalize, resolve_definition, split_pointer};
use crate::node::{Node, NodeId, NodeKind};
use crate::path::{fragment_segments, join_path};
use crate::types::{Reference, REF_KEY};
use crate::walk::walk;

#[cfg(feature = "remote")]
use crate::loader::load_document_url;

/// A pointer the catalog could not follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Pointer text as written.
    pub definition: String,
    /// Absolute form of the pointer.
    pub full_definition: String,
    /// Location of the document holding the pointer.
    pub origin: String,
    pub reason: String,
}

/// What the internalization pass needs from an index.
pub trait ReferenceIndex {
    /// Location of the root document.
    fn root_location(&self) -> &str;

    /// Every reference reachable from the root, ordered by `full_definition`.
    fn references(&self) -> &[Reference];

    /// Location of the document that physically holds `node`.
    fn find_origin(&self, node: &Node) -> Option<&str>;

    /// Pointers that could not be resolved.
    fn resolve(&self) -> Vec<UnresolvedReference>;
}

/// Builds indexes over document trees.
pub trait IndexProvider {
    type Index: ReferenceIndex;

    /// Index `root`, a document that lives at `location`.
    fn build_index(&self, root: &Node, location: &str) -> Result<Self::Index, CatalogError>;
}

/// Options for building a [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Location of the root document; relative pointers in it resolve
    /// against its directory.
    pub root_location: String,
    /// Load referenced documents from the filesystem.
    pub allow_file_lookup: bool,
    /// Load referenced documents over HTTP(S). Only effective with the
    /// `remote` feature.
    pub allow_remote_lookup: bool,
}

impl CatalogConfig {
    /// Create a config with file lookups enabled, and remote lookups
    /// enabled when the `remote` feature is.
    pub fn new(root_location: impl Into<String>) -> Self {
        Self {
            root_location: root_location.into(),
            allow_file_lookup: true,
            allow_remote_lookup: cfg!(feature = "remote"),
        }
    }

    /// Enable or disable filesystem lookups.
    pub fn file_lookup(mut self, allow: bool) -> Self {
        self.allow_file_lookup = allow;
        self
    }

    /// Enable or disable HTTP lookups.
    pub fn remote_lookup(mut self, allow: bool) -> Self {
        self.allow_remote_lookup = allow;
        self
    }

    /// Same lookup settings, different root.
    pub fn with_root_location(&self, root_location: impl Into<String>) -> Self {
        Self {
            root_location: root_location.into(),
            ..self.clone()
        }
    }
}

/// Index over a root document and every document its pointers reach.
#[derive(Debug)]
pub struct Catalog {
    config: CatalogConfig,
    root_location: String,
    /// Keeps every loaded document alive, which keeps node ids stable.
    documents: BTreeMap<String, Node>,
    origins: HashMap<NodeId, String>,
    scanned: HashSet<NodeId>,
    references: Vec<Reference>,
    unresolved: Vec<UnresolvedReference>,
}

impl Catalog {
    /// Index `root` and follow its pointers until no new targets appear.
    ///
    /// Referenced documents are loaded on demand. Only the subtrees that
    /// pointers actually reach are scanned for further pointers, so the
    /// result is the closure of what the root uses, not of every document
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotADocument` if `root` is not a document,
    /// `CatalogError::Load` if a referenced document cannot be read or
    /// parsed, and `CatalogError::Walk` if a document holds an alias.
    pub fn build(root: &Node, config: CatalogConfig) -> Result<Self, CatalogError> {
        if !root.is_document() {
            return Err(CatalogError::NotADocument {
                kind: root.kind_name(),
            });
        }

        let root_location = normalize(&config.root_location);
        let mut catalog = Catalog {
            config,
            root_location: root_location.clone(),
            documents: BTreeMap::new(),
            origins: HashMap::new(),
            scanned: HashSet::new(),
            references: Vec::new(),
            unresolved: Vec::new(),
        };
        catalog.register_document(&root_location, root.clone())?;

        let mut found: BTreeMap<String, Reference> = BTreeMap::new();
        let mut failed: BTreeMap<String, UnresolvedReference> = BTreeMap::new();
        let mut queue: VecDeque<(Node, String)> = VecDeque::new();
        queue.push_back((root.clone(), root_location));

        while let Some((subtree, location)) = queue.pop_front() {
            if catalog.scanned.contains(&subtree.id()) {
                continue;
            }
            for pointer in catalog.scan_pointers(&subtree)? {
                let full_definition = resolve_definition(&location, &pointer);
                if found.contains_key(&full_definition) || failed.contains_key(&full_definition) {
                    continue;
                }

                match catalog.follow(&pointer, &full_definition)? {
                    Ok(reference) => {
                        queue.push_back((reference.node.clone(), reference.location.clone()));
                        found.insert(full_definition, reference);
                    }
                    Err(reason) => {
                        debug!(pointer = %pointer, origin = %location, "unresolved: {}", reason);
                        failed.insert(
                            full_definition.clone(),
                            UnresolvedReference {
                                definition: pointer,
                                full_definition,
                                origin: location.clone(),
                                reason,
                            },
                        );
                    }
                }
            }
        }

        catalog.references = found.into_values().collect();
        catalog.unresolved = failed.into_values().collect();
        debug!(
            root = %catalog.root_location,
            documents = catalog.documents.len(),
            references = catalog.references.len(),
            unresolved = catalog.unresolved.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    /// Locations of every document the catalog holds, root included.
    pub fn document_locations(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Pointers that could not be followed.
    pub fn unresolved(&self) -> &[UnresolvedReference] {
        &self.unresolved
    }

    /// Record the origin of every node in a document.
    fn register_document(&mut self, location: &str, document: Node) -> Result<(), CatalogError> {
        let origins = &mut self.origins;
        walk::<WalkError, _>(&document, &mut |_, node| {
            origins
                .entry(node.id())
                .or_insert_with(|| location.to_string());
            Ok(())
        })?;
        self.documents.insert(location.to_string(), document);
        Ok(())
    }

    /// Collect the `$ref` strings in a subtree, marking it scanned.
    fn scan_pointers(&mut self, subtree: &Node) -> Result<Vec<String>, CatalogError> {
        let mut pointers = Vec::new();
        let scanned = &mut self.scanned;
        walk::<WalkError, _>(subtree, &mut |_, node| {
            scanned.insert(node.id());
            if let NodeKind::Mapping(pairs) = &*node.kind() {
                pointers.extend(
                    pairs
                        .iter()
                        .filter(|(key, _)| key.value == REF_KEY)
                        .filter_map(|(_, value)| value.as_str()),
                );
            }
            Ok(())
        })?;
        Ok(pointers)
    }

    /// Resolve one pointer to its target, loading its document if needed.
    ///
    /// The outer error is fatal; the inner one is a reason the pointer
    /// stays unresolved.
    fn follow(
        &mut self,
        pointer: &str,
        full_definition: &str,
    ) -> Result<Result<Reference, String>, CatalogError> {
        let (target_location, fragment) = split_pointer(full_definition);

        let document = match self.documents.get(target_location).cloned() {
            Some(document) => document,
            None => match self.load(target_location)? {
                Some(document) => {
                    self.register_document(target_location, document.clone())?;
                    document
                }
                None => return Ok(Err(format!("lookup of {} is disabled", target_location))),
            },
        };

        let segments = fragment_segments(fragment.unwrap_or(""));
        let Some(node) = navigate(&document, &segments) else {
            return Ok(Err(format!(
                "{} not found in {}",
                fragment.unwrap_or(""),
                target_location
            )));
        };

        Ok(Ok(Reference {
            definition: pointer.to_string(),
            full_definition: full_definition.to_string(),
            path: join_path(&segments),
            name: segments.last().cloned().unwrap_or_default(),
            node,
            location: target_location.to_string(),
            is_remote: target_location != self.root_location,
        }))
    }

    /// Load a document that is not in the catalog yet.
    ///
    /// `None` means the configuration forbids the lookup.
    fn load(&self, location: &str) -> Result<Option<Node>, CatalogError> {
        let wrap = |source| CatalogError::Load {
            location: location.to_string(),
            source,
        };

        if is_url(location) {
            if !self.config.allow_remote_lookup {
                return Ok(None);
            }
            debug!(location, "fetching remote document");
            #[cfg(feature = "remote")]
            {
                load_document_url(location).map(Some).map_err(wrap)
            }
            #[cfg(not(feature = "remote"))]
            {
                Ok(None)
            }
        } else {
            if !self.config.allow_file_lookup {
                return Ok(None);
            }
            debug!(location, "loading document");
            load_document(Path::new(location)).map(Some).map_err(wrap)
        }
    }
}

/// Follow decoded JSON pointer segments from a document's top node.
fn navigate(document: &Node, segments: &[String]) -> Option<Node> {
    let mut current = document.document_child().unwrap_or_else(|| document.clone());
    for segment in segments {
        let next = match &*current.kind() {
            NodeKind::Mapping(_) => current.get(segment),
            NodeKind::Sequence(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx).cloned()),
            _ => None,
        };
        current = next?;
    }
    Some(current)
}

impl ReferenceIndex for Catalog {
    fn root_location(&self) -> &str {
        &self.root_location
    }

    fn references(&self) -> &[Reference] {
        &self.references
    }

    fn find_origin(&self, node: &Node) -> Option<&str> {
        self.origins.get(&node.id()).map(String::as_str)
    }

    fn resolve(&self) -> Vec<UnresolvedReference> {
        self.unresolved.clone()
    }
}

/// Builds a [`Catalog`] per call, with fixed lookup settings.
#[derive(Debug, Clone)]
pub struct FsIndexProvider {
    config: CatalogConfig,
}

impl FsIndexProvider {
    /// The root location in `config` is replaced on every build.
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }
}

impl Default for FsIndexProvider {
    fn default() -> Self {
        Self::new(CatalogConfig::new("."))
    }
}

impl IndexProvider for FsIndexProvider {
    type Index = Catalog;

    fn build_index(&self, root: &Node, location: &str) -> Result<Catalog, CatalogError> {
        Catalog::build(root, self.config.with_root_location(location))
    }
}
