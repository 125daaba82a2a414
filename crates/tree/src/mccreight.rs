use stree_text::Text;

use crate::ops::{
    edge_descend, edge_slowscan, simulate_link_bottom_up, simulate_link_top_down, LinkSim,
    PendingLink, Scan,
};
use crate::{leaf_for, BranchStep, NodeId, Storage, Walk, ROOT};

/// Build state threaded between suffix insertions.
#[derive(Debug, Clone, Copy)]
struct BuildState {
    /// Node the next insertion starts from.
    active: NodeId,
    /// Suffix link recorded at the previous split, if unresolved.
    link: PendingLink,
}

/// Builds the tree by McCreight's algorithm: suffixes inserted longest
/// first, each starting from the suffix-link image of the previous head.
pub(crate) fn build<S: Storage>(store: &mut S, text: &Text) -> anyhow::Result<()> {
    let mut state = BuildState {
        active: ROOT,
        link: PendingLink::default(),
    };

    tracing::info!(length = text.len(), "building with McCreight's algorithm");

    for position in 1..=text.len() + 1 {
        insert_suffix(store, &mut state, position, text)
            .map_err(|e| e.context(format!("could not insert suffix {position}")))?;
    }

    Ok(())
}

/// Builds the tree by the simple McCreight-style baseline: every suffix
/// is inserted by a full descent from the root, with no suffix links.
pub(crate) fn build_simple<S: Storage>(store: &mut S, text: &Text) -> anyhow::Result<()> {
    tracing::info!(
        length = text.len(),
        "building with the simple McCreight-style algorithm"
    );

    for position in 1..=text.len() + 1 {
        insert_suffix_simple(store, position, text)
            .map_err(|e| e.context(format!("could not insert suffix {position}")))?;
    }

    Ok(())
}

fn grow_if_full<S: Storage>(store: &mut S, text: &Text) -> anyhow::Result<()> {
    let capacity = store.branch_capacity();

    if capacity == store.branch_count() && capacity < text.len() {
        store.grow_branch_table(capacity + 1, text.len())?;
    }

    Ok(())
}

fn insert_suffix<S: Storage>(
    store: &mut S,
    state: &mut BuildState,
    start: usize,
    text: &Text,
) -> anyhow::Result<()> {
    grow_if_full(store, text)?;

    let frontier = text.frontier();
    let mut walk = Walk::new(state.active, start + store.depth(state.active) as usize);

    loop {
        if store.branch_once(&mut walk, text)? == BranchStep::Missing {
            // fell off the tree: the head of this suffix ends exactly at
            // the current branching node
            store.create_leaf(&walk, leaf_for(start), text)?;

            if walk.parent > ROOT {
                state.active = store.suffix_link(walk.parent);
            } else {
                state.active = walk.parent;
            }

            return Ok(());
        }

        match edge_slowscan(store, walk.parent, walk.child, walk.position, frontier, text)? {
            Scan::Full(_) => {
                edge_descend(store, &mut walk, frontier)?;

                if walk.parent < 0 {
                    anyhow::bail!("suffix {start} already has a leaf in the tree");
                }
            }

            Scan::Truncated(_) => {
                anyhow::bail!("scan truncated outside an on-line construction round")
            }

            Scan::Partial {
                matched,
                child_first,
            } => {
                let grandpa = walk.parent;
                let old_child = walk.child;

                store.split_edge(&mut walk, matched, child_first, start as u32, text)?;

                let node = walk.parent;

                store.create_leaf(&walk, leaf_for(start), text)?;
                state.link.resolve_to(store, node, start, walk.position)?;
                state.link.arm(node, store.depth(node) - 1);

                let simulated = if store.backward() {
                    simulate_link_bottom_up(store, old_child, node, state.link.target_depth)?
                } else {
                    simulate_link_top_down(
                        store,
                        grandpa,
                        node,
                        state.link.target_depth,
                        start,
                        frontier,
                        text,
                    )?
                };

                match simulated {
                    LinkSim::Resolved(target) => {
                        state.active = target;
                        state.link.clear();
                    }
                    LinkSim::Pending(stop) => state.active = stop,
                }

                return Ok(());
            }
        }
    }
}

fn insert_suffix_simple<S: Storage>(
    store: &mut S,
    start: usize,
    text: &Text,
) -> anyhow::Result<()> {
    grow_if_full(store, text)?;

    let frontier = text.frontier();
    let mut walk = Walk::new(ROOT, start);

    loop {
        if store.branch_once(&mut walk, text)? == BranchStep::Missing {
            store.create_leaf(&walk, leaf_for(start), text)?;

            return Ok(());
        }

        match edge_slowscan(store, walk.parent, walk.child, walk.position, frontier, text)? {
            Scan::Full(_) => {
                edge_descend(store, &mut walk, frontier)?;

                if walk.parent < 0 {
                    anyhow::bail!("suffix {start} already has a leaf in the tree");
                }
            }

            Scan::Truncated(_) => {
                anyhow::bail!("scan truncated outside an on-line construction round")
            }

            Scan::Partial {
                matched,
                child_first,
            } => {
                store.split_edge(&mut walk, matched, child_first, start as u32, text)?;
                store.create_leaf(&walk, leaf_for(start), text)?;

                return Ok(());
            }
        }
    }
}

