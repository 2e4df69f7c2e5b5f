//! Classifying node comparator
//!
//! Structural equality over foreign tree nodes, accelerated two ways: hash
//! codes are memoized per node object, and once two nodes are proven equal
//! their union-find classes merge, so any pair of equal nodes is proven
//! equal at most once per encode session. Both side tables are keyed by
//! object identity (the `Arc` allocation address); the comparator pins every
//! node it has seen so addresses stay unique for the session's lifetime.
//!
//! All traversals use explicit work stacks; input trees may nest thousands
//! of levels deep.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::node::{Node, NodeData, NodeKind, Symbol, Value};

/// Fold a child hash into an accumulator
fn mix(h: u32, child: u32) -> u32 {
    (h << 1).wrapping_add(h) ^ child
}

fn hash_symbol(name: Symbol) -> u32 {
    let mut hasher = FxHasher::default();
    name.as_str().hash(&mut hasher);
    hasher.finish() as u32
}

/// Hash of a literal value; null hashes to zero
fn hash_value(value: &Value) -> u32 {
    if value.is_null() {
        return 0;
    }
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish() as u32
}

/// Equality and hashing state for one encode session
#[derive(Debug, Default)]
pub struct NodeClassifier {
    /// Object identity -> dense slot
    slots: FxHashMap<*const NodeData, u32>,
    /// Keeps slotted nodes alive so an address is never reused
    pinned: Vec<Node>,
    /// Union-find parent per slot
    parent: Vec<u32>,
    /// Union-find rank per slot
    rank: Vec<u8>,
    /// Memoized structural hash per slot
    hashes: Vec<Option<u32>>,
}

impl NodeClassifier {
    /// Create an empty comparator
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, node: &Node) -> u32 {
        let ptr = Arc::as_ptr(node);
        if let Some(&s) = self.slots.get(&ptr) {
            return s;
        }
        let s = self.parent.len() as u32;
        self.slots.insert(ptr, s);
        self.pinned.push(node.clone());
        self.parent.push(s);
        self.rank.push(0);
        self.hashes.push(None);
        s
    }

    fn find(&mut self, start: u32) -> u32 {
        let mut root = start;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut s = start;
        while self.parent[s as usize] != s {
            let next = self.parent[s as usize];
            self.parent[s as usize] = root;
            s = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less => self.parent[ra as usize] = rb,
            std::cmp::Ordering::Greater => self.parent[rb as usize] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb as usize] = ra;
                self.rank[ra as usize] += 1;
            }
        }
    }

    fn memo(&mut self, node: &Node) -> u32 {
        let s = self.slot(node);
        // Children are always hashed before their parent by the stack
        // discipline in hash_of.
        self.hashes[s as usize].expect("child hash computed before parent")
    }

    /// The node's structural hash, memoized by object identity.
    ///
    /// Identifier: hash of the name. Literal: hash of the value, zero for
    /// null. Call: argument hashes folded into the target hash. Attributes
    /// fold into the result with the same mix.
    pub fn hash_of(&mut self, node: &Node) -> u32 {
        let slot = self.slot(node);
        if let Some(h) = self.hashes[slot as usize] {
            return h;
        }

        let mut result = 0u32;
        let mut stack: Vec<(Node, bool)> = vec![(node.clone(), false)];
        while let Some((n, entered)) = stack.pop() {
            let s = self.slot(&n);
            if self.hashes[s as usize].is_some() {
                continue;
            }
            if !entered {
                stack.push((n.clone(), true));
                for attr in n.attrs() {
                    stack.push((attr.clone(), false));
                }
                if let NodeKind::Call { target, args } = n.kind() {
                    stack.push((target.clone(), false));
                    for arg in args {
                        stack.push((arg.clone(), false));
                    }
                }
            } else {
                let mut h = match n.kind() {
                    NodeKind::Id(name) => hash_symbol(*name),
                    NodeKind::Literal(value) => hash_value(value),
                    NodeKind::Call { target, args } => {
                        let mut h = self.memo(target);
                        for arg in args {
                            h = mix(h, self.memo(arg));
                        }
                        h
                    }
                };
                for attr in n.attrs() {
                    h = mix(h, self.memo(attr));
                }
                self.hashes[s as usize] = Some(h);
                result = h;
            }
        }
        result
    }

    /// Structural equality. Differing hashes refute without descending;
    /// a shared union-find root confirms without descending. On a proven
    /// match every compared pair of nodes is merged.
    pub fn eq(&mut self, a: &Node, b: &Node) -> bool {
        let mut pending: Vec<(Node, Node)> = vec![(a.clone(), b.clone())];
        let mut proven: Vec<(u32, u32)> = Vec::new();
        let mut seen: FxHashSet<(u32, u32)> = FxHashSet::default();

        while let Some((x, y)) = pending.pop() {
            if Arc::ptr_eq(&x, &y) {
                continue;
            }
            let sx = self.slot(&x);
            let sy = self.slot(&y);
            let rx = self.find(sx);
            let ry = self.find(sy);
            if rx == ry {
                continue;
            }
            if !seen.insert((rx.min(ry), rx.max(ry))) {
                continue;
            }
            if self.hash_of(&x) != self.hash_of(&y) {
                return false;
            }
            if x.attrs().len() != y.attrs().len() {
                return false;
            }
            match (x.kind(), y.kind()) {
                (NodeKind::Id(na), NodeKind::Id(nb)) => {
                    if na != nb {
                        return false;
                    }
                }
                (NodeKind::Literal(va), NodeKind::Literal(vb)) => {
                    if va != vb {
                        return false;
                    }
                }
                (
                    NodeKind::Call { target: tx, args: ax },
                    NodeKind::Call { target: ty, args: ay },
                ) => {
                    if ax.len() != ay.len() {
                        return false;
                    }
                    pending.push((tx.clone(), ty.clone()));
                    for (u, v) in ax.iter().zip(ay) {
                        pending.push((u.clone(), v.clone()));
                    }
                }
                _ => return false,
            }
            for (u, v) in x.attrs().iter().zip(y.attrs()) {
                pending.push((u.clone(), v.clone()));
            }
            proven.push((sx, sy));
        }

        for (sa, sb) in proven {
            self.union(sa, sb);
        }
        true
    }
}
