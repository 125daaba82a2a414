use core::cmp::Ordering;

use stree_text::Text;

use crate::{BranchStep, NodeId, Storage, Walk, NONE, ROOT};

/// Outcome of a slow scan along one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// The whole edge label matched; the payload is its length.
    Full(u32),
    /// Every symbol up to the frontier matched but the label continues.
    Truncated(u32),
    /// A mismatch after `matched` symbols. `child_first` is set when the
    /// edge symbol sorted below the text symbol, which tells the linked
    /// back-end on which side of the old child the new leaf belongs.
    Partial {
        /// Number of matching symbols before the mismatch.
        matched: u32,
        /// Whether the old child keeps the first sibling slot.
        child_first: bool,
    },
}

/// Compares the label of the `parent → child` edge with the text at
/// `position`, symbol by symbol, never reading past the frontier.
pub(crate) fn edge_slowscan<S: Storage>(
    store: &S,
    parent: NodeId,
    child: NodeId,
    mut position: usize,
    frontier: usize,
    text: &Text,
) -> anyhow::Result<Scan> {
    if child == NONE {
        anyhow::bail!("cannot scan an edge with no child");
    }

    let parent_depth = store.depth(parent) as usize;

    let start = if child > 0 {
        store.head_position(child) as usize + parent_depth
    } else {
        crate::suffix_start(child) + parent_depth
    };

    let mut end = if child > 0 {
        store.head_position(child) as usize + store.depth(child) as usize
    } else {
        frontier + 1
    };

    let mut comparing_all = true;

    if frontier < position + (end - start) - 1 {
        end = start + frontier + 1 - position;
        comparing_all = false;
    }

    let mut index = start;

    while text[index] == text[position] {
        index += 1;
        position += 1;

        if index == end {
            let matched = (end - start) as u32;

            return Ok(if comparing_all {
                Scan::Full(matched)
            } else {
                Scan::Truncated(matched)
            });
        }
    }

    Ok(Scan::Partial {
        matched: (index - start) as u32,
        child_first: text[index] < text[position],
    })
}

/// Compares a child's depth with a target depth, leaves measured against
/// the frontier.
pub(crate) fn edge_depthscan<S: Storage>(
    store: &S,
    child: NodeId,
    target_depth: u32,
    frontier: usize,
) -> Ordering {
    store.node_depth(child, frontier).cmp(&target_depth)
}

/// Moves the walk down through its current child, advancing the text
/// cursor by the edge length.
pub(crate) fn edge_descend<S: Storage>(
    store: &S,
    walk: &mut Walk,
    frontier: usize,
) -> anyhow::Result<()> {
    if walk.child == NONE {
        anyhow::bail!("cannot descend into a nonexisting child");
    }

    walk.position = walk.position - store.depth(walk.parent) as usize
        + store.node_depth(walk.child, frontier) as usize;
    walk.parent = walk.child;
    walk.child = NONE;
    walk.prev_child = NONE;

    Ok(())
}

/// Outcome of a top-down descent to a target depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GoDown {
    /// A branching node of exactly the target depth.
    Exact(NodeId),
    /// The target depth falls inside an edge; the payload is the
    /// branching node above it.
    SplitHere(NodeId),
}

/// Descends from `from` with single-symbol comparisons until the target
/// depth is reached or spanned.
///
/// The caller guarantees the path exists, so only the first symbol of
/// each edge is ever compared; reaching a leaf early is an invariant
/// violation.
pub(crate) fn go_down<S: Storage>(
    store: &S,
    from: NodeId,
    target_depth: u32,
    position: usize,
    frontier: usize,
    text: &Text,
) -> anyhow::Result<GoDown> {
    if from <= 0 {
        anyhow::bail!("cannot descend from the non-branching node {from}");
    }

    if store.depth(from) == target_depth {
        return Ok(GoDown::Exact(from));
    }

    let mut walk = Walk::new(from, position);

    loop {
        match store.branch_once(&mut walk, text)? {
            BranchStep::Edge => {}
            BranchStep::Missing => {
                anyhow::bail!("branching failed before the target depth was reached")
            }
        }

        match edge_depthscan(store, walk.child, target_depth, frontier) {
            Ordering::Less => {
                edge_descend(store, &mut walk, frontier)?;

                if walk.parent < 0 {
                    anyhow::bail!("reached a leaf below the target depth");
                }
            }
            Ordering::Equal => return Ok(GoDown::Exact(walk.child)),
            Ordering::Greater => return Ok(GoDown::SplitHere(walk.parent)),
        }
    }
}

/// Outcome of a bottom-up climb to a target depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GoUp {
    /// A branching node of exactly the target depth.
    Exact(NodeId),
    /// The target depth falls inside an edge; the payload is the
    /// branching node above it.
    StopEdge(NodeId),
}

/// Moves one edge up through the parent pointers (backward-pointer
/// variant).
pub(crate) fn edge_climb<S: Storage>(
    store: &S,
    parent: &mut NodeId,
    child: &mut NodeId,
) -> anyhow::Result<()> {
    if *parent < 2 {
        anyhow::bail!("cannot climb above the root");
    }

    *child = *parent;
    *parent = store.parent_of(*parent);

    Ok(())
}

/// Climbs parent pointers from `from` until the target depth is reached
/// or spanned. Only available with backward links.
pub(crate) fn go_up<S: Storage>(
    store: &S,
    from: NodeId,
    target_depth: u32,
) -> anyhow::Result<GoUp> {
    if from == NONE {
        anyhow::bail!("cannot climb from a nonexisting node");
    }

    let mut child = from;
    let mut parent = store.parent_of(from);

    loop {
        if parent <= 0 {
            anyhow::bail!("climbed out of the tree before the target depth was reached");
        }

        match store.depth(parent).cmp(&target_depth) {
            Ordering::Equal => return Ok(GoUp::Exact(parent)),
            Ordering::Less => return Ok(GoUp::StopEdge(parent)),
            Ordering::Greater => {}
        }

        edge_climb(store, &mut parent, &mut child)?;
    }
}

/// A suffix link recorded at a split but not yet pointing anywhere.
///
/// The link of a node created by a split resolves either immediately
/// (the simulation lands on an existing node) or at the very next split,
/// which must then happen at exactly the recorded depth.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingLink {
    /// Node whose link is pending, [`NONE`] when nothing is.
    pub source: NodeId,
    /// Depth its target will have.
    pub target_depth: u32,
}

impl PendingLink {
    /// Arms the pending link for a freshly split node.
    pub fn arm(&mut self, source: NodeId, target_depth: u32) {
        self.source = source;
        self.target_depth = target_depth;
    }

    /// Clears the pending state after a resolution.
    pub fn clear(&mut self) {
        self.source = NONE;
        self.target_depth = 0;
    }

    /// Resolves the pending link to a node just created by a split.
    ///
    /// The split is the last opportunity: it must have happened at
    /// exactly the recorded depth, anything else is a builder bug.
    pub fn resolve_to<S: Storage>(
        &self,
        store: &mut S,
        node: NodeId,
        start: usize,
        position: usize,
    ) -> anyhow::Result<()> {
        if self.source == NONE {
            return Ok(());
        }

        if position != start + self.target_depth as usize {
            anyhow::bail!(
                "the last opportunity to set the suffix link of node {} was missed",
                self.source
            );
        }

        store.set_suffix_link(self.source, node);

        Ok(())
    }
}

/// Outcome of a suffix-link simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinkSim {
    /// The link was set; the payload is its target, the next active
    /// node.
    Resolved(NodeId),
    /// The target depth falls inside an edge that the next split will
    /// create a node on; the payload is the node the descent stopped at.
    Pending(NodeId),
}

/// Top-down suffix-link simulation.
///
/// From the pre-split parent, follow its suffix link (or start below the
/// root) and rescan down to the target depth; an exact landing resolves
/// the pending link of `source`.
pub(crate) fn simulate_link_top_down<S: Storage>(
    store: &mut S,
    grandpa: NodeId,
    source: NodeId,
    target_depth: u32,
    starting_position: usize,
    frontier: usize,
    text: &Text,
) -> anyhow::Result<LinkSim> {
    if grandpa <= 0 {
        anyhow::bail!("the pre-split parent {grandpa} is not a branching node");
    }

    let mut from = grandpa;
    let mut position = starting_position + 1;

    if from > ROOT {
        position = starting_position + store.depth(from) as usize;
        from = store.suffix_link(from);
    }

    match go_down(store, from, target_depth, position, frontier, text)? {
        GoDown::Exact(target) => {
            store.set_suffix_link(source, target);

            Ok(LinkSim::Resolved(target))
        }
        GoDown::SplitHere(stop) => Ok(LinkSim::Pending(stop)),
    }
}

/// Bottom-up suffix-link simulation (backward-pointer variant).
///
/// The suffix-link image of the split edge's old child is already linked
/// into the tree: a branching child contributes its suffix link, a leaf
/// the leaf of the next suffix. Climbing from it reaches the target
/// depth without rescanning from above.
pub(crate) fn simulate_link_bottom_up<S: Storage>(
    store: &mut S,
    latest_child: NodeId,
    source: NodeId,
    target_depth: u32,
) -> anyhow::Result<LinkSim> {
    if latest_child == NONE {
        anyhow::bail!("the split edge had no child to climb from");
    }

    let image = if latest_child > 0 {
        store.suffix_link(latest_child)
    } else {
        latest_child - 1
    };

    match go_up(store, image, target_depth)? {
        GoUp::Exact(target) => {
            store.set_suffix_link(source, target);

            Ok(LinkSim::Resolved(target))
        }
        GoUp::StopEdge(stop) => Ok(LinkSim::Pending(stop)),
    }
}
