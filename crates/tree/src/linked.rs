use core::cmp::Ordering;
use core::mem;

use stree_text::Text;

use crate::stats::TreeStats;
use crate::storage::{initial_branch_capacity, next_growth_step};
use crate::{suffix_start, BranchStep, NodeId, Storage, Walk, NONE};

/// A branch record of the linked-children back-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LinkedBranch {
    first_child: NodeId,
    next_sibling: NodeId,
    suffix_link: NodeId,
    depth: u32,
    head_position: u32,
}

/// The linked-children storage back-end.
///
/// Every branching node holds its first child and every node its next
/// sibling; siblings are kept in ascending order of their first edge
/// symbol, so a descent can stop at the first sibling sorting above the
/// looked-up symbol.
#[derive(Debug, Default, Clone)]
pub struct LinkedChildren {
    branches: Vec<LinkedBranch>,
    leaf_siblings: Vec<NodeId>,
    branch_parents: Vec<NodeId>,
    leaf_parents: Vec<NodeId>,
    branching_nodes: usize,
    capacity: usize,
    step: usize,
    backward: bool,
}

impl LinkedChildren {
    /// Creates an empty back-end; tables are allocated by
    /// [`Storage::initialize`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables parent tracking, switching suffix-link simulation to the
    /// bottom-up variant.
    pub fn with_backward_links(mut self) -> Self {
        self.backward = true;
        self
    }

    fn sibling(&self, node: NodeId) -> NodeId {
        if node > 0 {
            self.branches[node as usize].next_sibling
        } else {
            self.leaf_siblings[suffix_start(node)]
        }
    }

    fn set_sibling(&mut self, node: NodeId, sibling: NodeId) {
        if node > 0 {
            self.branches[node as usize].next_sibling = sibling;
        } else {
            self.leaf_siblings[suffix_start(node)] = sibling;
        }
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) {
        if node > 0 {
            self.branch_parents[node as usize] = parent;
        } else {
            self.leaf_parents[suffix_start(node)] = parent;
        }
    }

    /// Links `node` into the child slot recorded by the walk.
    fn link_at(&mut self, walk: &Walk, node: NodeId) {
        if walk.prev_child == NONE {
            self.branches[walk.parent as usize].first_child = node;
        } else {
            self.set_sibling(walk.prev_child, node);
        }
    }

    /// Compares the first symbol of the `parent → child` edge with the
    /// text symbol at `position`.
    fn fastscan(&self, parent: NodeId, child: NodeId, position: usize, text: &Text) -> Ordering {
        let depth = self.branches[parent as usize].depth as usize;

        let index = if child > 0 {
            self.branches[child as usize].head_position as usize + depth
        } else {
            suffix_start(child) + depth
        };

        text[index].cmp(&text[position])
    }
}

impl Storage for LinkedChildren {
    fn initialize(&mut self, text: &Text) -> anyhow::Result<()> {
        let len = text.len();
        let unit = initial_branch_capacity(len);

        self.branches = vec![LinkedBranch::default(); unit + 1];
        self.leaf_siblings = vec![NONE; len + 2];

        if self.backward {
            self.branch_parents = vec![NONE; unit + 1];
            self.leaf_parents = vec![NONE; len + 2];
        }

        self.branching_nodes = 1;
        self.capacity = unit;
        self.step = unit >> 1;

        tracing::debug!(
            branch_cells = unit + 1,
            leaf_cells = len + 2,
            backward = self.backward,
            "linked-children tables allocated"
        );

        Ok(())
    }

    fn branch_count(&self) -> usize {
        self.branching_nodes
    }

    fn branch_capacity(&self) -> usize {
        self.capacity
    }

    fn grow_branch_table(&mut self, desired: usize, text_len: usize) -> anyhow::Result<()> {
        let mut capacity = (self.capacity + self.step).max(desired).min(text_len);

        if capacity < self.capacity {
            capacity = self.capacity;
        }

        self.branches.resize(capacity + 1, LinkedBranch::default());

        if self.backward {
            self.branch_parents.resize(capacity + 1, NONE);
        }

        self.capacity = capacity;
        self.step = next_growth_step(self.step);

        tracing::debug!(capacity, "branch table grown");

        Ok(())
    }

    fn depth(&self, branch: NodeId) -> u32 {
        self.branches[branch as usize].depth
    }

    fn head_position(&self, branch: NodeId) -> u32 {
        self.branches[branch as usize].head_position
    }

    fn suffix_link(&self, branch: NodeId) -> NodeId {
        self.branches[branch as usize].suffix_link
    }

    fn set_suffix_link(&mut self, branch: NodeId, target: NodeId) {
        self.branches[branch as usize].suffix_link = target;
    }

    fn backward(&self) -> bool {
        self.backward
    }

    fn parent_of(&self, node: NodeId) -> NodeId {
        if node > 0 {
            self.branch_parents[node as usize]
        } else {
            self.leaf_parents[suffix_start(node)]
        }
    }

    fn branch_once(&self, walk: &mut Walk, text: &Text) -> anyhow::Result<BranchStep> {
        if walk.parent <= 0 {
            anyhow::bail!("cannot branch from the non-branching node {}", walk.parent);
        }

        walk.child = self.branches[walk.parent as usize].first_child;
        walk.prev_child = NONE;

        while walk.child != NONE {
            match self.fastscan(walk.parent, walk.child, walk.position, text) {
                Ordering::Less => {
                    walk.prev_child = walk.child;
                    walk.child = self.sibling(walk.child);
                }
                Ordering::Equal => return Ok(BranchStep::Edge),
                Ordering::Greater => return Ok(BranchStep::Missing),
            }
        }

        Ok(BranchStep::Missing)
    }

    fn next_child(&self, parent: NodeId, current: NodeId, _text: &Text) -> Option<NodeId> {
        let next = if current == NONE {
            self.branches[parent as usize].first_child
        } else {
            self.sibling(current)
        };

        (next != NONE).then_some(next)
    }

    fn create_leaf(&mut self, walk: &Walk, leaf: NodeId, _text: &Text) -> anyhow::Result<()> {
        if walk.parent <= 0 {
            anyhow::bail!(
                "cannot create a child of the non-branching node {}",
                walk.parent
            );
        }

        self.link_at(walk, leaf);
        self.leaf_siblings[suffix_start(leaf)] = walk.child;

        if self.backward {
            self.leaf_parents[suffix_start(leaf)] = walk.parent;
        }

        Ok(())
    }

    fn split_edge(
        &mut self,
        walk: &mut Walk,
        matched: u32,
        child_first: bool,
        new_head: u32,
        _text: &Text,
    ) -> anyhow::Result<()> {
        if walk.parent <= 0 {
            anyhow::bail!("cannot split below the non-branching node {}", walk.parent);
        }

        if walk.child == NONE {
            anyhow::bail!("cannot split an edge with no child");
        }

        if matched == 0 {
            anyhow::bail!("cannot split an edge at a zero-length match");
        }

        if self.branching_nodes == self.capacity {
            anyhow::bail!("branch table exhausted before the split");
        }

        self.branching_nodes += 1;

        let node = self.branching_nodes as NodeId;

        self.link_at(walk, node);

        self.branches[node as usize] = LinkedBranch {
            first_child: walk.child,
            next_sibling: self.sibling(walk.child),
            suffix_link: NONE,
            depth: self.branches[walk.parent as usize].depth + matched,
            head_position: new_head,
        };

        self.set_sibling(walk.child, NONE);

        if self.backward {
            self.branch_parents[node as usize] = walk.parent;
            self.set_parent(walk.child, node);
        }

        walk.parent = node;

        if child_first {
            walk.prev_child = walk.child;
            walk.child = NONE;
        } else {
            walk.prev_child = NONE;
        }

        walk.position += matched as usize;

        Ok(())
    }

    fn stats(&self, text: &Text) -> TreeStats {
        let parent_cells = self.branch_parents.len() + self.leaf_parents.len();

        TreeStats {
            text_length: text.len(),
            branching_nodes: self.branching_nodes,
            branch_capacity: self.capacity,
            branch_record_size: mem::size_of::<LinkedBranch>(),
            leaf_cells: self.leaf_siblings.len(),
            leaf_record_size: mem::size_of::<NodeId>(),
            edges: None,
            table_cells: None,
            edge_record_size: None,
            settings_bytes: 0,
            extra_bytes: parent_cells * mem::size_of::<NodeId>(),
        }
    }
}
