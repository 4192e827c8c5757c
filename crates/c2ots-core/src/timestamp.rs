//! # Timestamp Graph
//!
//! An arena of digest nodes connected by operation edges.
//!
//! ## Structure
//!
//! Each node holds its `message`, an insertion-ordered list of outgoing
//! `(Op, NodeId)` edges with unique operations, and a set of attestations.
//! Nodes may be shared: a Bitcoin Merkle tree joins two transaction leaves at
//! one concatenation node, so the graph is a DAG rather than a tree. Every
//! traversal therefore tracks visited nodes.
//!
//! ## Leaves
//!
//! A leaf is a node with no outgoing edges. Placeholder attestations are
//! attached at leaves; the "directly verified" leaves are those carrying at
//! least one [`Attestation::Unknown`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::attestation::Attestation;
use crate::digest::encode_hex;
use crate::error::GraphError;
use crate::op::Op;

/// Stable index of a node inside one [`TimestampGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    message: Vec<u8>,
    edges: Vec<(Op, NodeId)>,
    attestations: BTreeSet<Attestation>,
}

/// Arena-backed timestamp operation graph.
#[derive(Debug, Clone, Default)]
pub struct TimestampGraph {
    nodes: Vec<Node>,
}

impl TimestampGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding a single node for `message`.
    pub fn with_root(message: impl Into<Vec<u8>>) -> (Self, NodeId) {
        let mut graph = Self::new();
        let root = graph.add_node(message);
        (graph, root)
    }

    /// Insert a detached node.
    pub fn add_node(&mut self, message: impl Into<Vec<u8>>) -> NodeId {
        self.nodes.push(Node {
            message: message.into(),
            ..Node::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The message of `id`.
    pub fn message(&self, id: NodeId) -> Result<&[u8], GraphError> {
        Ok(&self.node(id)?.message)
    }

    /// Outgoing edges of `id`, in insertion order.
    pub fn edges(&self, id: NodeId) -> Result<&[(Op, NodeId)], GraphError> {
        Ok(&self.node(id)?.edges)
    }

    /// Attestations attached directly to `id`.
    pub fn attestations_of(&self, id: NodeId) -> Result<&BTreeSet<Attestation>, GraphError> {
        Ok(&self.node(id)?.attestations)
    }

    /// Whether `id` has no outgoing edges.
    pub fn is_leaf(&self, id: NodeId) -> Result<bool, GraphError> {
        Ok(self.node(id)?.edges.is_empty())
    }

    /// The child reached from `id` through an edge equal to `op`, if any.
    pub fn find_edge(&self, id: NodeId, op: &Op) -> Result<Option<NodeId>, GraphError> {
        Ok(self
            .node(id)?
            .edges
            .iter()
            .find(|(edge_op, _)| edge_op == op)
            .map(|(_, child)| *child))
    }

    /// Add an `op` edge from `node`, returning the child.
    ///
    /// Idempotent: if `node` already has an edge equal to `op`, the existing
    /// child is returned and nothing is inserted.
    pub fn add_edge(&mut self, node: NodeId, op: Op) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.find_edge(node, &op)? {
            return Ok(existing);
        }
        let message = op.apply(&self.node(node)?.message);
        let child = self.add_node(message);
        self.node_mut(node)?.edges.push((op, child));
        Ok(child)
    }

    /// Link `node` to an existing `child` through `op`.
    ///
    /// Fails with [`GraphError::EdgeMismatch`] unless
    /// `child.message == op.apply(node.message)`. If `node` already has an
    /// edge equal to `op`, that edge's child is returned unchanged.
    pub fn link(&mut self, node: NodeId, op: Op, child: NodeId) -> Result<NodeId, GraphError> {
        if let Some(existing) = self.find_edge(node, &op)? {
            return Ok(existing);
        }
        let expected = op.apply(&self.node(node)?.message);
        if self.node(child)?.message != expected {
            return Err(GraphError::EdgeMismatch {
                parent: node,
                op,
                child,
            });
        }
        self.node_mut(node)?.edges.push((op, child));
        Ok(child)
    }

    /// Attach `attestation` to `node` itself. Returns whether it was new.
    pub fn attest(&mut self, node: NodeId, attestation: Attestation) -> Result<bool, GraphError> {
        Ok(self.node_mut(node)?.attestations.insert(attestation))
    }

    /// Remove `attestation` from `node`. Returns whether it was present.
    pub fn remove_attestation(
        &mut self,
        node: NodeId,
        attestation: &Attestation,
    ) -> Result<bool, GraphError> {
        Ok(self.node_mut(node)?.attestations.remove(attestation))
    }

    /// Attach `attestation` at every leaf reachable from `node`.
    ///
    /// The leaves are the nodes without outgoing edges at the time of the
    /// call. Returns the number of insertions.
    pub fn attach_at_leaves(
        &mut self,
        node: NodeId,
        attestation: &Attestation,
    ) -> Result<usize, GraphError> {
        let mut inserted = 0;
        for leaf in self.leaves(node)? {
            if self.node_mut(leaf)?.attestations.insert(attestation.clone()) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Leaves reachable from `node`, in depth-first insertion order.
    pub fn leaves(&self, node: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut out = Vec::new();
        for id in self.walk(node)? {
            if self.node(id)?.edges.is_empty() {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Leaves reachable from `node` that carry at least one unknown
    /// attestation. These drive resolution fan-out.
    pub fn directly_verified(&self, node: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut out = Vec::new();
        for leaf in self.leaves(node)? {
            if self.node(leaf)?.attestations.iter().any(Attestation::is_unknown) {
                out.push(leaf);
            }
        }
        Ok(out)
    }

    /// Every attestation reachable from `node`, paired with the node it is
    /// attached to, in depth-first order.
    pub fn all_attestations(&self, node: NodeId) -> Result<Vec<(NodeId, Attestation)>, GraphError> {
        let mut out = Vec::new();
        for id in self.walk(node)? {
            for att in &self.node(id)?.attestations {
                out.push((id, att.clone()));
            }
        }
        Ok(out)
    }

    /// Stitch the chain starting at `appended` onto every leaf of `node`.
    ///
    /// Each leaf's (empty) edge list is replaced with `appended`'s edges, so
    /// both chains share the continuation. Every leaf must carry the same
    /// message as `appended`. Returns the number of leaves joined.
    pub fn concat(&mut self, node: NodeId, appended: NodeId) -> Result<usize, GraphError> {
        let leaves: Vec<NodeId> = self
            .leaves(node)?
            .into_iter()
            .filter(|leaf| *leaf != appended)
            .collect();
        for leaf in &leaves {
            self.replace_edges(*leaf, appended)?;
        }
        Ok(leaves.len())
    }

    /// Replace the edges of `target` with the edges of `source`.
    ///
    /// Both nodes must carry the same message, which keeps the edge
    /// invariant intact for the copied edges.
    pub fn replace_edges(&mut self, target: NodeId, source: NodeId) -> Result<(), GraphError> {
        let source_node = self.node(source)?;
        let target_message = &self.node(target)?.message;
        if *target_message != source_node.message {
            return Err(GraphError::MessageMismatch {
                node: target,
                expected: encode_hex(&source_node.message),
                found: encode_hex(target_message),
            });
        }
        let edges = source_node.edges.clone();
        self.node_mut(target)?.edges = edges;
        Ok(())
    }

    /// Import the sub-graph of `fragment` reachable from `fragment_root`
    /// onto `target`.
    ///
    /// `target` and `fragment_root` must carry the same message. Edges merge
    /// with [`add_edge`](Self::add_edge) semantics: an operation already
    /// present on a node is followed instead of duplicated. Attestations are
    /// copied onto the corresponding nodes.
    pub fn graft(
        &mut self,
        target: NodeId,
        fragment: &TimestampGraph,
        fragment_root: NodeId,
    ) -> Result<(), GraphError> {
        let root_message = fragment.message(fragment_root)?;
        let target_message = self.message(target)?;
        if target_message != root_message {
            return Err(GraphError::MessageMismatch {
                node: target,
                expected: encode_hex(root_message),
                found: encode_hex(target_message),
            });
        }

        let mut mapped: HashMap<NodeId, NodeId> = HashMap::new();
        mapped.insert(fragment_root, target);

        for frag_id in fragment.walk(fragment_root)? {
            let local = mapped
                .get(&frag_id)
                .copied()
                .ok_or(GraphError::UnknownNode(frag_id))?;
            let frag_node = fragment.node(frag_id)?;
            for att in &frag_node.attestations {
                self.node_mut(local)?.attestations.insert(att.clone());
            }
            for (op, frag_child) in &frag_node.edges {
                let local_child = match (self.find_edge(local, op)?, mapped.get(frag_child)) {
                    (Some(existing), _) => existing,
                    (None, Some(already)) => self.link(local, op.clone(), *already)?,
                    (None, None) => self.add_edge(local, op.clone())?,
                };
                mapped.entry(*frag_child).or_insert(local_child);
            }
        }
        Ok(())
    }

    /// Render the graph below `root` as indented text.
    ///
    /// Messages are shown as `# <hex>` comments, attestations as
    /// `verify <attestation>`. A node with several edges indents each branch
    /// behind a `->` marker.
    pub fn render_tree(&self, root: NodeId) -> Result<String, GraphError> {
        enum Item<'a> {
            Node(NodeId, usize),
            Edge(&'a Op, usize, bool),
        }

        let mut out = String::new();
        let mut stack = vec![Item::Node(root, 0)];
        let mut seen = HashSet::new();

        while let Some(item) = stack.pop() {
            match item {
                Item::Edge(op, depth, branching) => {
                    let pad = "    ".repeat(depth);
                    let marker = if branching { "-> " } else { "" };
                    out.push_str(&format!("{pad}{marker}{op}\n"));
                }
                Item::Node(id, depth) => {
                    let node = self.node(id)?;
                    let pad = "    ".repeat(depth);
                    if !seen.insert(id) {
                        out.push_str(&format!("{pad}# {} (shared)\n", encode_hex(&node.message)));
                        continue;
                    }
                    out.push_str(&format!("{pad}# {}\n", encode_hex(&node.message)));
                    for att in &node.attestations {
                        out.push_str(&format!("{pad}verify {att}\n"));
                    }
                    let branching = node.edges.len() > 1;
                    let child_depth = if branching { depth + 1 } else { depth };
                    for (op, child) in node.edges.iter().rev() {
                        stack.push(Item::Node(*child, child_depth));
                        stack.push(Item::Edge(op, depth, branching));
                    }
                }
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.nodes.get(id.0).ok_or(GraphError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes.get_mut(id.0).ok_or(GraphError::UnknownNode(id))
    }

    /// Pre-order walk from `root` over distinct nodes, edges visited in
    /// insertion order.
    fn walk(&self, root: NodeId) -> Result<Vec<NodeId>, GraphError> {
        self.node(root)?;
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            let node = self.node(id)?;
            for (_, child) in node.edges.iter().rev() {
                if !seen.contains(child) {
                    stack.push(*child);
                }
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::sha256;

    fn chain(graph: &mut TimestampGraph, from: NodeId, ops: &[Op]) -> NodeId {
        let mut node = from;
        for op in ops {
            node = graph.add_edge(node, op.clone()).unwrap();
        }
        node
    }

    #[test]
    fn add_edge_computes_child_message() {
        let (mut g, root) = TimestampGraph::with_root(b"abc".to_vec());
        let child = g.add_edge(root, Op::Sha256).unwrap();
        assert_eq!(g.message(child).unwrap(), &sha256(b"abc")[..]);
        assert_eq!(g.edges(root).unwrap().len(), 1);
    }

    #[test]
    fn add_edge_is_idempotent() {
        let (mut g, root) = TimestampGraph::with_root(vec![1]);
        let a = g.add_edge(root, Op::Append(vec![2])).unwrap();
        let b = g.add_edge(root, Op::Append(vec![2])).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.edges(root).unwrap().len(), 1);
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn link_rejects_edge_invariant_violation() {
        let mut g = TimestampGraph::new();
        let parent = g.add_node(vec![1]);
        let wrong = g.add_node(vec![9, 9]);
        let err = g.link(parent, Op::Append(vec![2]), wrong).unwrap_err();
        assert!(matches!(err, GraphError::EdgeMismatch { .. }));
        assert!(g.is_leaf(parent).unwrap());
    }

    #[test]
    fn link_shares_an_existing_child() {
        let mut g = TimestampGraph::new();
        let left = g.add_node(vec![1]);
        let right = g.add_node(vec![2]);
        let joined = g.add_edge(left, Op::Append(vec![2])).unwrap();
        let via_right = g.link(right, Op::Prepend(vec![1]), joined).unwrap();
        assert_eq!(joined, via_right);
        assert_eq!(g.leaves(left).unwrap(), vec![joined]);
        assert_eq!(g.leaves(right).unwrap(), vec![joined]);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let (g, _) = TimestampGraph::with_root(vec![0]);
        assert_eq!(
            g.message(NodeId(7)).unwrap_err(),
            GraphError::UnknownNode(NodeId(7))
        );
    }

    #[test]
    fn attach_at_leaves_skips_interior_nodes() {
        let (mut g, root) = TimestampGraph::with_root(vec![0]);
        let a = chain(&mut g, root, &[Op::Append(vec![1]), Op::Sha256]);
        let b = chain(&mut g, root, &[Op::Prepend(vec![2])]);
        let att = Attestation::BitcoinBlockHeader { height: 1 };

        assert_eq!(g.attach_at_leaves(root, &att).unwrap(), 2);
        assert!(g.attestations_of(a).unwrap().contains(&att));
        assert!(g.attestations_of(b).unwrap().contains(&att));
        assert!(g.attestations_of(root).unwrap().is_empty());
        // Set semantics: a second call inserts nothing.
        assert_eq!(g.attach_at_leaves(root, &att).unwrap(), 0);
    }

    #[test]
    fn directly_verified_only_returns_placeholder_leaves() {
        let (mut g, root) = TimestampGraph::with_root(vec![0]);
        let a = chain(&mut g, root, &[Op::Append(vec![1])]);
        let b = chain(&mut g, root, &[Op::Append(vec![2])]);
        g.attest(a, Attestation::bitcoin_op_return(vec![0xaa])).unwrap();
        g.attest(b, Attestation::BitcoinBlockHeader { height: 3 }).unwrap();
        // Interior placeholders are not leaves and are never returned.
        g.attest(root, Attestation::bitcoin_op_return(vec![0xbb])).unwrap();

        assert_eq!(g.directly_verified(root).unwrap(), vec![a]);
    }

    #[test]
    fn leaves_follow_insertion_order() {
        let (mut g, root) = TimestampGraph::with_root(vec![0]);
        let first = chain(&mut g, root, &[Op::Append(vec![1]), Op::Append(vec![1])]);
        let second = chain(&mut g, root, &[Op::Prepend(vec![2])]);
        let third = chain(&mut g, root, &[Op::Sha256]);
        assert_eq!(g.leaves(root).unwrap(), vec![first, second, third]);
    }

    #[test]
    fn concat_joins_chains_with_equal_boundary() {
        let (mut g, cal) = TimestampGraph::with_root(vec![0]);
        let cal_leaf = chain(&mut g, cal, &[Op::Append(vec![1]), Op::Sha256]);
        let boundary = g.message(cal_leaf).unwrap().to_vec();

        let btc = g.add_node(boundary);
        let btc_leaf = chain(&mut g, btc, &[Op::Prepend(vec![7]), Op::Sha256]);

        assert_eq!(g.concat(cal, btc).unwrap(), 1);
        assert_eq!(g.leaves(cal).unwrap(), vec![btc_leaf]);
    }

    #[test]
    fn concat_rejects_boundary_mismatch() {
        let (mut g, cal) = TimestampGraph::with_root(vec![0]);
        chain(&mut g, cal, &[Op::Sha256]);
        let other = g.add_node(vec![42]);
        chain(&mut g, other, &[Op::Sha256]);
        assert!(matches!(
            g.concat(cal, other),
            Err(GraphError::MessageMismatch { .. })
        ));
    }

    #[test]
    fn graft_imports_reachable_fragment_only() {
        let (mut main, root) = TimestampGraph::with_root(vec![5]);
        let leaf = chain(&mut main, root, &[Op::Sha256]);
        let att = Attestation::bitcoin_op_return(vec![1]);
        main.attest(leaf, att.clone()).unwrap();

        let (mut frag, frag_root) = TimestampGraph::with_root(main.message(leaf).unwrap().to_vec());
        let tip = chain(&mut frag, frag_root, &[Op::Append(vec![3]), Op::Sha256]);
        frag.attest(tip, Attestation::BitcoinBlockHeader { height: 9 }).unwrap();
        // Unreachable from frag_root, must not be imported.
        frag.add_node(vec![0xff]);

        let before = main.len();
        main.graft(leaf, &frag, frag_root).unwrap();
        main.remove_attestation(leaf, &att).unwrap();

        assert_eq!(main.len(), before + 2);
        let atts = main.all_attestations(root).unwrap();
        assert_eq!(atts.len(), 1);
        assert_eq!(atts[0].1, Attestation::BitcoinBlockHeader { height: 9 });
        assert!(main.directly_verified(root).unwrap().is_empty());
    }

    #[test]
    fn graft_merges_existing_edges() {
        let (mut main, root) = TimestampGraph::with_root(vec![1]);
        let existing = main.add_edge(root, Op::Append(vec![2])).unwrap();

        let (mut frag, frag_root) = TimestampGraph::with_root(vec![1]);
        let frag_tip = chain(&mut frag, frag_root, &[Op::Append(vec![2]), Op::Sha256]);
        frag.attest(frag_tip, Attestation::BitcoinBlockHeader { height: 2 }).unwrap();

        main.graft(root, &frag, frag_root).unwrap();
        assert_eq!(main.edges(root).unwrap().len(), 1);
        let tip = main.find_edge(existing, &Op::Sha256).unwrap().unwrap();
        assert_eq!(main.message(tip).unwrap(), frag.message(frag_tip).unwrap());
    }

    #[test]
    fn graft_rejects_mismatched_target() {
        let (mut main, root) = TimestampGraph::with_root(vec![1]);
        let (frag, frag_root) = TimestampGraph::with_root(vec![2]);
        assert!(main.graft(root, &frag, frag_root).is_err());
    }

    #[test]
    fn render_tree_shows_ops_and_attestations() {
        let (mut g, root) = TimestampGraph::with_root(vec![0xab]);
        let a = g.add_edge(root, Op::Append(vec![0x01])).unwrap();
        g.add_edge(root, Op::Sha256).unwrap();
        g.attest(a, Attestation::BitcoinBlockHeader { height: 7 }).unwrap();

        let text = g.render_tree(root).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# ab");
        assert_eq!(lines[1], "-> append 01");
        assert_eq!(lines[2], "    # ab01");
        assert_eq!(lines[3], "    verify BitcoinBlockHeaderAttestation(7)");
        assert_eq!(lines[4], "-> sha256");
    }
}
