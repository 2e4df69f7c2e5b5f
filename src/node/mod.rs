//! The tree algebra
//!
//! A node is an identifier, a literal, or a call of a target node on an
//! ordered argument list. Any node may carry an ordered list of attribute
//! nodes. Nodes are immutable and reference-counted; sharing a subtree is
//! free and the encoder exploits it.

mod literal;
mod symbol;

use std::fmt;
use std::sync::Arc;

pub use literal::{DecimalBits, FloatBits32, FloatBits64, Value};
pub use symbol::Symbol;

/// A shared, immutable tree node
pub type Node = Arc<NodeData>;

/// Payload of a node
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A symbolic name
    Id(Symbol),
    /// A typed primitive value
    Literal(Value),
    /// A target applied to an ordered argument list
    Call {
        /// The called node (often an identifier)
        target: Node,
        /// Arguments, in order
        args: Vec<Node>,
    },
}

/// One node of the tree
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    attrs: Vec<Node>,
    source: Option<Symbol>,
}

impl NodeData {
    /// Create an identifier node
    pub fn id(name: impl Into<Symbol>) -> Node {
        Arc::new(Self {
            kind: NodeKind::Id(name.into()),
            attrs: Vec::new(),
            source: None,
        })
    }

    /// Create a literal node
    pub fn literal(value: Value) -> Node {
        Arc::new(Self {
            kind: NodeKind::Literal(value),
            attrs: Vec::new(),
            source: None,
        })
    }

    /// Create a call node
    pub fn call(target: Node, args: Vec<Node>) -> Node {
        Arc::new(Self {
            kind: NodeKind::Call { target, args },
            attrs: Vec::new(),
            source: None,
        })
    }

    /// Create a call whose target is a bare identifier
    pub fn call_id(name: impl Into<Symbol>, args: Vec<Node>) -> Node {
        Self::call(Self::id(name), args)
    }

    /// A copy of this node with the given attribute list
    pub fn with_attrs(&self, attrs: Vec<Node>) -> Node {
        Arc::new(Self {
            kind: self.kind.clone(),
            attrs,
            source: self.source,
        })
    }

    /// A copy of this node with an empty attribute list
    pub fn without_attrs(&self) -> Node {
        self.with_attrs(Vec::new())
    }

    /// The node's payload
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node's attributes, in order
    pub fn attrs(&self) -> &[Node] {
        &self.attrs
    }

    /// Whether the node carries any attributes
    pub fn has_attrs(&self) -> bool {
        !self.attrs.is_empty()
    }

    /// The source label the node was decoded from, if any
    pub fn source(&self) -> Option<Symbol> {
        self.source
    }

    /// The identifier's name, if this is an identifier
    pub fn name(&self) -> Option<Symbol> {
        match &self.kind {
            NodeKind::Id(name) => Some(*name),
            _ => None,
        }
    }

    /// The literal's value, if this is a literal
    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// The call target, if this is a call
    pub fn target(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Call { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The call arguments, if this is a call
    pub fn args(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Call { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Is this an identifier?
    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, NodeKind::Id(_))
    }

    /// Is this a literal?
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    /// Is this a call?
    pub fn is_call(&self) -> bool {
        matches!(self.kind, NodeKind::Call { .. })
    }

    /// An attribute-free identifier: the one call-target shape that encodes
    /// as a symbol reference instead of a node reference
    pub fn is_bare_id(&self) -> bool {
        self.attrs.is_empty() && self.is_identifier()
    }

    /// A leaf is an attribute-free identifier or literal
    pub fn is_leaf(&self) -> bool {
        self.attrs.is_empty() && !self.is_call()
    }
}

/// Structural equality over `(kind, attrs)`; the source label does not
/// participate.
impl PartialEq for NodeData {
    fn eq(&self, other: &Self) -> bool {
        if self.attrs != other.attrs {
            return false;
        }
        match (&self.kind, &other.kind) {
            (NodeKind::Id(a), NodeKind::Id(b)) => a == b,
            (NodeKind::Literal(a), NodeKind::Literal(b)) => a == b,
            (
                NodeKind::Call { target: t1, args: a1 },
                NodeKind::Call { target: t2, args: a2 },
            ) => t1 == t2 && a1 == a2,
            _ => false,
        }
    }
}

impl Eq for NodeData {}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.attrs.is_empty() {
            f.write_str("@(")?;
            for (i, attr) in self.attrs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{attr}")?;
            }
            f.write_str(") ")?;
        }
        match &self.kind {
            NodeKind::Id(name) => write!(f, "{name}"),
            NodeKind::Literal(v) => write!(f, "{v:?}"),
            NodeKind::Call { target, args } => {
                write!(f, "{target}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Builds nodes on behalf of the decoder, tagging each with the source
/// label the stream was read under.
#[derive(Debug, Clone, Default)]
pub struct NodeFactory {
    source: Option<Symbol>,
}

impl NodeFactory {
    /// A factory tagging nodes with the given source label
    pub fn new(source: impl Into<Symbol>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }

    /// An identifier node
    pub fn id(&self, name: Symbol) -> Node {
        Arc::new(NodeData {
            kind: NodeKind::Id(name),
            attrs: Vec::new(),
            source: self.source,
        })
    }

    /// A literal node
    pub fn literal(&self, value: Value) -> Node {
        Arc::new(NodeData {
            kind: NodeKind::Literal(value),
            attrs: Vec::new(),
            source: self.source,
        })
    }

    /// A call node
    pub fn call(&self, target: Node, args: Vec<Node>) -> Node {
        Arc::new(NodeData {
            kind: NodeKind::Call { target, args },
            attrs: Vec::new(),
            source: self.source,
        })
    }

    /// The given node, decorated with attributes
    pub fn with_attrs(&self, base: &Node, attrs: Vec<Node>) -> Node {
        Arc::new(NodeData {
            kind: base.kind.clone(),
            attrs,
            source: self.source,
        })
    }
}
