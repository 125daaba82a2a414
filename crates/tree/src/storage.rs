use stree_text::Text;

use crate::stats::TreeStats;
use crate::{leaf_depth, NodeId, NONE};

/// The mutable descent record threaded through the primitive operations.
///
/// `parent` is the branching node the descent currently stands on (or a
/// leaf right after descending onto one), `child` the candidate child of
/// the current edge, `prev_child` the preceding sibling (meaningful for
/// the linked back-end, where it doubles as the ordered insertion
/// point), and `position` the text cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    /// Current branching node.
    pub parent: NodeId,
    /// Candidate child, [`NONE`] when absent.
    pub child: NodeId,
    /// Sibling preceding `child` under `parent`, [`NONE`] when first.
    pub prev_child: NodeId,
    /// Text cursor.
    pub position: usize,
}

impl Walk {
    /// Starts a descent at a branching node and text position.
    pub fn new(parent: NodeId, position: usize) -> Self {
        Self {
            parent,
            child: NONE,
            prev_child: NONE,
            position,
        }
    }
}

/// Outcome of branching by one symbol from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStep {
    /// An edge starting with the symbol exists; `walk.child` holds its
    /// target.
    Edge,
    /// No such edge; for the linked back-end `walk.child`/`walk.prev_child`
    /// mark the ordered insertion point.
    Missing,
}

/// The capability surface the construction drivers and the traversal
/// build against, implemented by both storage back-ends.
pub trait Storage {
    /// Prepares the tables for a text, resetting any previous state.
    fn initialize(&mut self, text: &Text) -> anyhow::Result<()>;

    /// Number of branch records in use (the root included).
    fn branch_count(&self) -> usize;

    /// Number of branch records the table can hold before growing.
    fn branch_capacity(&self) -> usize;

    /// Grows the branch table to hold at least `desired` records, never
    /// beyond `text_len`.
    fn grow_branch_table(&mut self, desired: usize, text_len: usize) -> anyhow::Result<()>;

    /// Depth of a branching node.
    fn depth(&self, branch: NodeId) -> u32;

    /// Head position of a branching node.
    fn head_position(&self, branch: NodeId) -> u32;

    /// Suffix link of a branching node, [`NONE`] when unknown.
    fn suffix_link(&self, branch: NodeId) -> NodeId;

    /// Sets the suffix link of a branching node.
    fn set_suffix_link(&mut self, branch: NodeId, target: NodeId);

    /// Whether the back-end tracks parent pointers (the backward-pointer
    /// variant).
    fn backward(&self) -> bool;

    /// Parent of a node; only meaningful under [`Storage::backward`].
    fn parent_of(&self, node: NodeId) -> NodeId;

    /// Branches from `walk.parent` on the symbol at `walk.position`.
    fn branch_once(&self, walk: &mut Walk, text: &Text) -> anyhow::Result<BranchStep>;

    /// Child of `parent` following `current` in first-symbol order;
    /// [`NONE`] as `current` yields the first child.
    fn next_child(&self, parent: NodeId, current: NodeId, text: &Text) -> Option<NodeId>;

    /// Attaches a leaf at the descent point recorded in `walk`.
    fn create_leaf(&mut self, walk: &Walk, leaf: NodeId, text: &Text) -> anyhow::Result<()>;

    /// Splits the `walk.parent → walk.child` edge after `matched`
    /// symbols, creating a branching node with head position `new_head`.
    ///
    /// On return `walk.parent` is the new node and `walk.position` has
    /// advanced past the matched prefix. `child_first` carries the
    /// slow-scan orientation consumed by the linked back-end's ordered
    /// insertion.
    fn split_edge(
        &mut self,
        walk: &mut Walk,
        matched: u32,
        child_first: bool,
        new_head: u32,
        text: &Text,
    ) -> anyhow::Result<()>;

    /// Storage statistics for the report.
    fn stats(&self, text: &Text) -> TreeStats;

    /// Depth of any node against the scan frontier.
    fn node_depth(&self, node: NodeId, frontier: usize) -> u32 {
        if node > 0 {
            self.depth(node)
        } else {
            leaf_depth(node, frontier)
        }
    }
}

/// The largest power of two not exceeding `n`, at least 1.
///
/// Initial size of the branch tables.
pub(crate) fn initial_branch_capacity(n: usize) -> usize {
    let n = n.max(1);

    1 << (usize::BITS - 1 - n.leading_zeros())
}

/// Applies the halving growth-increment policy shared by the branch and
/// edge tables: each grow halves the increment, floored at 128.
pub(crate) fn next_growth_step(step: usize) -> usize {
    if step < 256 {
        128
    } else {
        step >> 1
    }
}
