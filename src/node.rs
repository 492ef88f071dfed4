//! Document node model.
//!
//! A [`Node`] is a cheap handle to shared, mutable node data. Cloning a
//! handle never copies the node: both handles observe the same data and
//! compare equal under [`Node::ptr_eq`]. This is what lets a component be
//! moved into the root registry while its origin document still knows it.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Identity of a node, stable for as long as any handle to it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// How a scalar was written, so re-serialization keeps its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarStyle {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Null,
}

/// A scalar value: its text plus the style it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scalar {
    pub value: String,
    pub style: ScalarStyle,
}

impl Scalar {
    /// A plain string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            style: ScalarStyle::String,
        }
    }

    pub fn with_style(value: impl Into<String>, style: ScalarStyle) -> Self {
        Self {
            value: value.into(),
            style,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::string(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::string(value)
    }
}

/// The data behind a node handle.
#[derive(Debug)]
pub enum NodeKind {
    /// Top of a parsed document; always exactly one child.
    Document(Node),
    Sequence(Vec<Node>),
    /// Ordered key/value pairs. Duplicate keys are representable.
    Mapping(Vec<(Scalar, Node)>),
    Scalar(Scalar),
    /// Anchor alias. Carried so it can be rejected, never followed.
    Alias(String),
}

impl NodeKind {
    /// Human-readable kind name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document(_) => "document",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Alias(_) => "alias",
        }
    }
}

/// Shared handle to a document node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeKind>>);

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node(Rc::new(RefCell::new(kind)))
    }

    pub fn document(child: Node) -> Self {
        Node::new(NodeKind::Document(child))
    }

    pub fn sequence(items: Vec<Node>) -> Self {
        Node::new(NodeKind::Sequence(items))
    }

    pub fn mapping<K: Into<Scalar>>(pairs: Vec<(K, Node)>) -> Self {
        Node::new(NodeKind::Mapping(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn empty_mapping() -> Self {
        Node::new(NodeKind::Mapping(Vec::new()))
    }

    /// A string scalar node.
    pub fn string(value: impl Into<String>) -> Self {
        Node::new(NodeKind::Scalar(Scalar::string(value)))
    }

    pub fn scalar(scalar: Scalar) -> Self {
        Node::new(NodeKind::Scalar(scalar))
    }

    pub fn alias(anchor: impl Into<String>) -> Self {
        Node::new(NodeKind::Alias(anchor.into()))
    }

    /// Borrow the node data.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently borrowed mutably.
    pub fn kind(&self) -> Ref<'_, NodeKind> {
        self.0.borrow()
    }

    /// Mutably borrow the node data.
    ///
    /// # Panics
    ///
    /// Panics if the node is currently borrowed.
    pub fn kind_mut(&self) -> RefMut<'_, NodeKind> {
        self.0.borrow_mut()
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    /// True if both handles point at the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_document(&self) -> bool {
        matches!(*self.kind(), NodeKind::Document(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(*self.kind(), NodeKind::Mapping(_))
    }

    /// Scalar text, if this is a scalar.
    pub fn as_str(&self) -> Option<String> {
        match &*self.kind() {
            NodeKind::Scalar(s) => Some(s.value.clone()),
            _ => None,
        }
    }

    /// Replace the text of a scalar in place. Returns false for other kinds.
    pub fn set_str(&self, value: impl Into<String>) -> bool {
        match &mut *self.kind_mut() {
            NodeKind::Scalar(s) => {
                s.value = value.into();
                s.style = ScalarStyle::String;
                true
            }
            _ => false,
        }
    }

    /// The child of a document node.
    pub fn document_child(&self) -> Option<Node> {
        match &*self.kind() {
            NodeKind::Document(child) => Some(child.clone()),
            _ => None,
        }
    }

    /// First value stored under `key` in a mapping.
    pub fn get(&self, key: &str) -> Option<Node> {
        match &*self.kind() {
            NodeKind::Mapping(pairs) => pairs
                .iter()
                .find(|(k, _)| k.value == key)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Every value stored under `key` in a mapping, in order.
    pub fn get_all(&self, key: &str) -> Vec<Node> {
        match &*self.kind() {
            NodeKind::Mapping(pairs) => pairs
                .iter()
                .filter(|(k, _)| k.value == key)
                .map(|(_, v)| v.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Keys of a mapping, in order. `None` for other kinds.
    pub fn keys(&self) -> Option<Vec<String>> {
        match &*self.kind() {
            NodeKind::Mapping(pairs) => Some(pairs.iter().map(|(k, _)| k.value.clone()).collect()),
            _ => None,
        }
    }

    /// Append a pair to a mapping. Returns false for other kinds.
    pub fn push_pair(&self, key: impl Into<Scalar>, value: Node) -> bool {
        match &mut *self.kind_mut() {
            NodeKind::Mapping(pairs) => {
                pairs.push((key.into(), value));
                true
            }
            _ => false,
        }
    }

    /// Handles to the nodes a traversal descends into.
    ///
    /// Mapping keys are not nodes and are never returned.
    pub fn children(&self) -> Vec<Node> {
        match &*self.kind() {
            NodeKind::Document(child) => vec![child.clone()],
            NodeKind::Sequence(items) => items.clone(),
            NodeKind::Mapping(pairs) => pairs.iter().map(|(_, v)| v.clone()).collect(),
            NodeKind::Scalar(_) | NodeKind::Alias(_) => Vec::new(),
        }
    }

    /// Copy the whole subtree into fresh nodes.
    ///
    /// Shared subtrees are copied once per occurrence.
    pub fn deep_clone(&self) -> Node {
        let kind = match &*self.kind() {
            NodeKind::Document(child) => NodeKind::Document(child.deep_clone()),
            NodeKind::Sequence(items) => {
                NodeKind::Sequence(items.iter().map(Node::deep_clone).collect())
            }
            NodeKind::Mapping(pairs) => NodeKind::Mapping(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            NodeKind::Scalar(s) => NodeKind::Scalar(s.clone()),
            NodeKind::Alias(a) => NodeKind::Alias(a.clone()),
        };
        Node::new(kind)
    }

    /// Structural equality, ignoring identity.
    pub fn structurally_eq(&self, other: &Node) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (&*self.kind(), &*other.kind()) {
            (NodeKind::Document(a), NodeKind::Document(b)) => a.structurally_eq(b),
            (NodeKind::Sequence(a), NodeKind::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
            }
            (NodeKind::Mapping(a), NodeKind::Mapping(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.structurally_eq(vb))
            }
            (NodeKind::Scalar(a), NodeKind::Scalar(b)) => a == b,
            (NodeKind::Alias(a), NodeKind::Alias(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(kind) => kind.fmt(f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}
