//! Writer state: the node table builder
//!
//! `get_index` interns a node into the flat node table, registering every
//! child first so that all references point backwards. Interned nodes are
//! appended to runs grouped by encoding kind (and template, unless the
//! variable-template mode lets one run mix templates). The clustering
//! pre-pass registers descendant leaves up front, partitioned by kind, so
//! the table front-loads long homogeneous runs.

use rustc_hash::FxHashMap;

use crate::error::EncodeError;
use crate::node::{Node, NodeKind, Value};

use super::classify::{classify, literal_kind, EncodingKind};
use super::compare::NodeClassifier;
use super::symtab::SymbolTableBuilder;
use super::template::TemplateTableBuilder;

/// A contiguous group of node-table entries sharing an encoding kind
#[derive(Debug)]
pub struct Run {
    /// The run's kind tag
    pub kind: EncodingKind,
    /// Template index shared by the run's nodes, for templated kinds
    pub template: Option<u32>,
    /// The run's nodes, in table order
    pub nodes: Vec<Node>,
}

/// Work-stack phases for child-before-parent interning
enum Phase {
    Enter,
    Register,
}

/// Growing tables for one encode session
#[derive(Debug)]
pub struct WriterState {
    pub(crate) symbols: SymbolTableBuilder,
    pub(crate) templates: TemplateTableBuilder,
    classifier: NodeClassifier,
    /// Structural hash -> (node, table index) entries
    index: FxHashMap<u32, Vec<(Node, u32)>>,
    runs: Vec<Run>,
    node_count: u32,
    /// When set, a templated run may mix templates; the writer then emits
    /// it with per-node template references
    mixed_templates: bool,
}

impl WriterState {
    /// Create empty state. `mixed_templates` selects the run-splitting
    /// strategy for templated nodes.
    pub fn new(mixed_templates: bool) -> Self {
        Self {
            symbols: SymbolTableBuilder::new(),
            templates: TemplateTableBuilder::new(),
            classifier: NodeClassifier::new(),
            index: FxHashMap::default(),
            runs: Vec::new(),
            node_count: 0,
            mixed_templates,
        }
    }

    /// Number of interned nodes
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Take ownership of the finished runs
    pub fn take_runs(&mut self) -> Vec<Run> {
        std::mem::take(&mut self.runs)
    }

    /// The table index of an already-interned node, if any
    pub fn lookup(&mut self, node: &Node) -> Option<u32> {
        let h = self.classifier.hash_of(node);
        // Snapshot the bucket: probing borrows the classifier mutably.
        let candidates: Vec<(Node, u32)> = self.index.get(&h)?.clone();
        for (candidate, idx) in candidates {
            if self.classifier.eq(&candidate, node) {
                return Some(idx);
            }
        }
        None
    }

    /// Intern a node, returning its position in the flat node table.
    /// Children are interned first: attributes then the stripped node for
    /// decorated nodes; the target (unless a bare identifier, which interns
    /// a symbol instead) then the arguments for calls. Identifier names and
    /// string literal payloads intern into the symbol table.
    pub fn get_index(&mut self, node: &Node) -> Result<u32, EncodeError> {
        if let Some(idx) = self.lookup(node) {
            return Ok(idx);
        }

        let mut stack: Vec<(Node, Phase)> = vec![(node.clone(), Phase::Enter)];
        while let Some((n, phase)) = stack.pop() {
            match phase {
                Phase::Enter => {
                    if self.lookup(&n).is_some() {
                        continue;
                    }
                    stack.push((n.clone(), Phase::Register));
                    if n.has_attrs() {
                        stack.push((n.without_attrs(), Phase::Enter));
                        for attr in n.attrs().iter().rev() {
                            stack.push((attr.clone(), Phase::Enter));
                        }
                        continue;
                    }
                    match n.kind() {
                        NodeKind::Call { target, args } => {
                            for arg in args.iter().rev() {
                                stack.push((arg.clone(), Phase::Enter));
                            }
                            match target.name().filter(|_| target.is_bare_id()) {
                                Some(name) => {
                                    self.symbols.get_index(name);
                                }
                                None => stack.push((target.clone(), Phase::Enter)),
                            }
                        }
                        NodeKind::Id(name) => {
                            self.symbols.get_index(*name);
                        }
                        NodeKind::Literal(Value::String(s)) => {
                            self.symbols.get_index(*s);
                        }
                        NodeKind::Literal(_) => {}
                    }
                }
                Phase::Register => {
                    if self.lookup(&n).is_none() {
                        self.register(n);
                    }
                }
            }
        }

        self.lookup(node).ok_or_else(|| {
            EncodeError::InvalidState("node not interned after child registration".into())
        })
    }

    /// Append a node whose children are all interned
    fn register(&mut self, node: Node) {
        let (kind, template) = classify(&mut self.symbols, &node);
        let template_idx = template.map(|t| self.templates.get_index(t));

        let idx = self.node_count;
        self.node_count += 1;

        let split_on_template = !self.mixed_templates;
        let extend_tail = match self.runs.last() {
            Some(run) => {
                run.kind == kind && (!split_on_template || run.template == template_idx)
            }
            None => false,
        };
        if extend_tail {
            // The tail run's kind was just checked.
            if let Some(run) = self.runs.last_mut() {
                run.nodes.push(node.clone());
            }
        } else {
            self.runs.push(Run {
                kind,
                template: template_idx,
                nodes: vec![node.clone()],
            });
        }

        let h = self.classifier.hash_of(&node);
        self.index.entry(h).or_default().push((node, idx));
    }

    /// Clustering pre-pass: register every descendant leaf, grouped so the
    /// node table opens with homogeneous runs. Null literals first, then
    /// identifiers, then the remaining literals partitioned by kind in
    /// first-seen order. Bare-identifier call targets contribute a symbol,
    /// not a node, and are skipped.
    pub fn cluster_leaves(&mut self, top_level: &[Node]) -> Result<(), EncodeError> {
        let mut nulls: Vec<Node> = Vec::new();
        let mut ids: Vec<Node> = Vec::new();
        let mut groups: Vec<(EncodingKind, Vec<Node>)> = Vec::new();

        let mut stack: Vec<Node> = top_level.iter().rev().cloned().collect();
        while let Some(n) = stack.pop() {
            if n.is_leaf() {
                match n.kind() {
                    NodeKind::Literal(Value::Null) => nulls.push(n),
                    NodeKind::Id(_) => ids.push(n),
                    NodeKind::Literal(value) => {
                        let kind = literal_kind(value);
                        match groups.iter_mut().find(|(k, _)| *k == kind) {
                            Some((_, group)) => group.push(n),
                            None => groups.push((kind, vec![n])),
                        }
                    }
                    NodeKind::Call { .. } => {}
                }
                continue;
            }

            // Non-leaf: only its children contribute. A decorated
            // identifier or literal contributes its stripped variant; a
            // call contributes target and arguments.
            let mut children: Vec<Node> = Vec::new();
            children.extend(n.attrs().iter().cloned());
            match n.kind() {
                NodeKind::Call { target, args } => {
                    if !target.is_bare_id() {
                        children.push(target.clone());
                    }
                    children.extend(args.iter().cloned());
                }
                NodeKind::Id(_) | NodeKind::Literal(_) => {
                    children.push(n.without_attrs());
                }
            }
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }

        for leaf in nulls {
            self.get_index(&leaf)?;
        }
        for leaf in ids {
            self.get_index(&leaf)?;
        }
        for (_, group) in groups {
            for leaf in group {
                self.get_index(&leaf)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;

    #[test]
    fn test_leaf_interning_is_idempotent() {
        let mut state = WriterState::new(false);
        let a = NodeData::id("x");
        let b = NodeData::id("x");

        let ia = state.get_index(&a).unwrap();
        let ib = state.get_index(&b).unwrap();
        assert_eq!(ia, ib);
        assert_eq!(state.node_count(), 1);
    }

    #[test]
    fn test_children_before_parents() {
        let mut state = WriterState::new(false);
        let call = NodeData::call_id(
            "f",
            vec![NodeData::literal(Value::i32(1)), NodeData::id("x")],
        );
        let root = state.get_index(&call).unwrap();

        // Root is registered last.
        assert_eq!(root, state.node_count() - 1);

        let runs = state.take_runs();
        let flat: Vec<&Node> = runs.iter().flat_map(|r| r.nodes.iter()).collect();
        assert_eq!(flat.len(), 3);
        // Children occupy lower indices than the call.
        assert!(flat[2].is_call());
    }

    #[test]
    fn test_bare_id_target_interns_symbol_only() {
        let mut state = WriterState::new(false);
        let call = NodeData::call_id("f", vec![]);
        state.get_index(&call).unwrap();

        // Only the call itself is in the node table; "f" went to the
        // symbol table.
        assert_eq!(state.node_count(), 1);
        assert_eq!(state.symbols.len(), 1);
    }

    #[test]
    fn test_non_bare_target_is_a_node() {
        let mut state = WriterState::new(false);
        let target = NodeData::call_id("g", vec![]);
        let call = NodeData::call(target, vec![]);
        state.get_index(&call).unwrap();

        assert_eq!(state.node_count(), 2);
    }

    #[test]
    fn test_attrs_register_stripped_then_wrapper() {
        let mut state = WriterState::new(false);
        let node = NodeData::id("foo").with_attrs(vec![NodeData::id("a")]);
        let root = state.get_index(&node).unwrap();

        // attr, stripped foo, wrapper
        assert_eq!(state.node_count(), 3);
        assert_eq!(root, 2);

        let stripped = NodeData::id("foo");
        assert_eq!(state.lookup(&stripped), Some(1));
        assert_eq!(state.lookup(&NodeData::id("a")), Some(0));
    }

    #[test]
    fn test_runs_split_on_kind_change() {
        let mut state = WriterState::new(false);
        state.get_index(&NodeData::literal(Value::i32(1))).unwrap();
        state.get_index(&NodeData::literal(Value::i32(2))).unwrap();
        state.get_index(&NodeData::id("x")).unwrap();
        state.get_index(&NodeData::literal(Value::i32(3))).unwrap();

        let runs = state.take_runs();
        let kinds: Vec<EncodingKind> = runs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [EncodingKind::Int32, EncodingKind::Id, EncodingKind::Int32]
        );
        assert_eq!(runs[0].nodes.len(), 2);
    }

    #[test]
    fn test_runs_split_on_template_change() {
        let mut state = WriterState::new(false);
        let one = NodeData::literal(Value::i32(1));
        state
            .get_index(&NodeData::call_id("f", vec![one.clone()]))
            .unwrap();
        state
            .get_index(&NodeData::call_id("g", vec![one.clone()]))
            .unwrap();

        let runs = state.take_runs();
        let templated: Vec<&Run> = runs
            .iter()
            .filter(|r| r.kind == EncodingKind::Templated)
            .collect();
        assert_eq!(templated.len(), 2);
        assert_ne!(templated[0].template, templated[1].template);
    }

    #[test]
    fn test_mixed_template_run_is_shared() {
        let mut state = WriterState::new(true);
        let one = NodeData::literal(Value::i32(1));
        state
            .get_index(&NodeData::call_id("f", vec![one.clone()]))
            .unwrap();
        state
            .get_index(&NodeData::call_id("g", vec![one.clone()]))
            .unwrap();

        let runs = state.take_runs();
        let templated: Vec<&Run> = runs
            .iter()
            .filter(|r| r.kind == EncodingKind::Templated)
            .collect();
        assert_eq!(templated.len(), 1);
        assert_eq!(templated[0].nodes.len(), 2);
    }

    #[test]
    fn test_shared_subtree_single_entry() {
        let mut state = WriterState::new(false);
        let x = NodeData::call_id("baz", vec![]);
        let a = NodeData::call_id("bar", vec![x.clone(), x.clone()]);
        let b = NodeData::call_id("bar", vec![x.clone(), x.clone()]);

        let ia = state.get_index(&a).unwrap();
        let ib = state.get_index(&b).unwrap();
        assert_eq!(ia, ib);
        // x and bar(x, x), nothing else.
        assert_eq!(state.node_count(), 2);
    }

    #[test]
    fn test_cluster_groups_leaves_first() {
        let mut state = WriterState::new(false);
        let forest = vec![
            NodeData::call_id(
                "f",
                vec![
                    NodeData::literal(Value::i32(1)),
                    NodeData::id("x"),
                    NodeData::literal(Value::Null),
                ],
            ),
            NodeData::call_id(
                "g",
                vec![
                    NodeData::literal(Value::i32(2)),
                    NodeData::id("y"),
                    NodeData::literal(Value::bool(true)),
                ],
            ),
        ];

        state.cluster_leaves(&forest).unwrap();
        let runs = state.take_runs();
        let kinds: Vec<EncodingKind> = runs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                EncodingKind::Null,
                EncodingKind::Id,
                EncodingKind::Int32,
                EncodingKind::Bool,
            ]
        );
        // Both Int32 leaves share one run.
        assert_eq!(runs[2].nodes.len(), 2);
    }

    #[test]
    fn test_deep_tree_interning() {
        let mut state = WriterState::new(false);
        let mut node = NodeData::id("leaf");
        for _ in 0..10_000 {
            node = NodeData::call_id("wrap", vec![node]);
        }
        let idx = state.get_index(&node).unwrap();
        assert_eq!(idx, 10_000);
        assert_eq!(state.node_count(), 10_001);
    }
}
