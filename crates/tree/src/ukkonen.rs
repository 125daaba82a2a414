use stree_text::Text;

use crate::ops::{
    edge_descend, edge_slowscan, simulate_link_bottom_up, simulate_link_top_down, LinkSim,
    PendingLink, Scan,
};
use crate::{leaf_for, BranchStep, NodeId, Storage, Walk, ROOT};

/// The active point threaded between extensions and rounds.
#[derive(Debug, Clone, Copy)]
struct ActivePoint {
    /// Branching node the next extension starts from.
    node: NodeId,
    /// Text offset just past the portion already spelled from `node`.
    index: usize,
}

/// Outcome of one suffix extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prolong {
    /// A leaf was created; the next suffix is up.
    Done,
    /// The suffix is empty at this prefix end.
    Empty,
    /// The extension was implicit; every longer-started suffix of this
    /// round is implicit too, so the round stops.
    Stop,
}

/// Builds the tree by Ukkonen's on-line algorithm: the implicit tree for
/// each prefix is extended by one symbol per round, touching only the
/// suffixes that are not yet explicit.
pub(crate) fn build<S: Storage>(store: &mut S, text: &Text) -> anyhow::Result<()> {
    let mut active = ActivePoint {
        node: ROOT,
        index: 1,
    };
    let mut start = 1;

    tracing::info!(length = text.len(), "building with Ukkonen's algorithm");

    for ending in 2..=text.len() + 2 {
        round(store, &mut active, &mut start, ending, text)
            .map_err(|e| e.context(format!("could not extend the tree to prefix {}", ending - 1)))?;
    }

    Ok(())
}

/// Builds the tree by the simple Ukkonen-style baseline: every extension
/// descends from the root, with no suffix links.
pub(crate) fn build_simple<S: Storage>(store: &mut S, text: &Text) -> anyhow::Result<()> {
    let mut start = 1;

    tracing::info!(
        length = text.len(),
        "building with the simple Ukkonen-style algorithm"
    );

    for ending in 2..=text.len() + 2 {
        round_simple(store, &mut start, ending, text)
            .map_err(|e| e.context(format!("could not extend the tree to prefix {}", ending - 1)))?;
    }

    Ok(())
}

/// One round: extends suffixes `start..` to the prefix ending right
/// before `ending`, stopping at the first implicit extension.
fn round<S: Storage>(
    store: &mut S,
    active: &mut ActivePoint,
    start: &mut usize,
    ending: usize,
    text: &Text,
) -> anyhow::Result<()> {
    let mut link = PendingLink::default();

    // every explicit extension of the round adds at most one branching
    // node, so one grow up front covers the whole round
    let most = store.branch_count() + (ending - *start) - 1;
    let capacity = store.branch_capacity();

    if capacity < most && capacity < text.len() {
        store.grow_branch_table(most, text.len())?;
    }

    let mut outcome = prolong(store, active, &mut link, *start, ending, text)?;

    while outcome == Prolong::Empty {
        *start += 1;
        outcome = prolong(store, active, &mut link, *start, ending, text)?;
    }

    while outcome == Prolong::Done {
        *start += 1;
        outcome = prolong(store, active, &mut link, *start, ending, text)?;
    }

    Ok(())
}

/// Extends the suffix starting at `start` so the tree spells it up to
/// the prefix end `ending - 1`.
fn prolong<S: Storage>(
    store: &mut S,
    active: &mut ActivePoint,
    link: &mut PendingLink,
    start: usize,
    ending: usize,
    text: &Text,
) -> anyhow::Result<Prolong> {
    if start == ending {
        return Ok(Prolong::Empty);
    }

    let frontier = ending - 1;
    let mut walk = Walk::new(active.node, active.index);

    loop {
        if store.branch_once(&mut walk, text)? == BranchStep::Missing {
            store.create_leaf(&walk, leaf_for(start), text)?;

            active.node = if walk.parent > ROOT {
                store.suffix_link(walk.parent)
            } else {
                walk.parent
            };
            active.index = start + 1 + store.depth(active.node) as usize;

            return Ok(Prolong::Done);
        }

        match edge_slowscan(store, walk.parent, walk.child, walk.position, frontier, text)? {
            Scan::Full(_) => {
                let above = walk.parent;

                edge_descend(store, &mut walk, frontier)?;

                if walk.parent < 0 {
                    // the suffix ends at a leaf, which stretches to the
                    // frontier on its own
                    active.node = if above != ROOT {
                        store.suffix_link(above)
                    } else {
                        above
                    };
                    active.index = start + 1 + store.depth(active.node) as usize;

                    return Ok(Prolong::Stop);
                }

                if start + store.depth(walk.parent) as usize == ending {
                    // an existing branching node completes the suffix
                    active.node = walk.parent;
                    active.index = start + store.depth(walk.parent) as usize;

                    return Ok(Prolong::Stop);
                }
            }

            Scan::Truncated(_) => {
                // the suffix ends inside the edge
                active.node = walk.parent;
                active.index = start + store.depth(walk.parent) as usize;

                return Ok(Prolong::Stop);
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
                link.resolve_to(store, node, start, walk.position)?;
                link.arm(node, store.depth(node) - 1);

                let simulated = if store.backward() {
                    simulate_link_bottom_up(store, old_child, node, link.target_depth)?
                } else {
                    simulate_link_top_down(
                        store,
                        grandpa,
                        node,
                        link.target_depth,
                        start,
                        frontier,
                        text,
                    )?
                };

                match simulated {
                    LinkSim::Resolved(target) => {
                        active.node = target;
                        link.clear();
                    }
                    LinkSim::Pending(stop) => active.node = stop,
                }

                active.index = start + 1 + store.depth(active.node) as usize;

                return Ok(Prolong::Done);
            }
        }
    }
}

/// One round of the simple baseline.
fn round_simple<S: Storage>(
    store: &mut S,
    start: &mut usize,
    ending: usize,
    text: &Text,
) -> anyhow::Result<()> {
    let mut outcome = prolong_simple(store, *start, ending, text)?;

    while outcome == Prolong::Empty {
        *start += 1;
        outcome = prolong_simple(store, *start, ending, text)?;
    }

    while outcome == Prolong::Done {
        *start += 1;
        outcome = prolong_simple(store, *start, ending, text)?;
    }

    Ok(())
}

fn prolong_simple<S: Storage>(
    store: &mut S,
    start: usize,
    ending: usize,
    text: &Text,
) -> anyhow::Result<Prolong> {
    let capacity = store.branch_capacity();

    if capacity == store.branch_count() && capacity < text.len() {
        store.grow_branch_table(capacity + 1, text.len())?;
    }

    if start == ending {
        return Ok(Prolong::Empty);
    }

    let frontier = ending - 1;
    let mut walk = Walk::new(ROOT, start);

    loop {
        if store.branch_once(&mut walk, text)? == BranchStep::Missing {
            store.create_leaf(&walk, leaf_for(start), text)?;

            return Ok(Prolong::Done);
        }

        match edge_slowscan(store, walk.parent, walk.child, walk.position, frontier, text)? {
            Scan::Full(_) => {
                edge_descend(store, &mut walk, frontier)?;

                if walk.position == ending {
                    return Ok(Prolong::Stop);
                }

                if walk.parent < 0 {
                    anyhow::bail!("descended onto a leaf short of the prefix end");
                }
            }

            Scan::Truncated(_) => return Ok(Prolong::Stop),

            Scan::Partial {
                matched,
                child_first,
            } => {
                store.split_edge(&mut walk, matched, child_first, start as u32, text)?;
                store.create_leaf(&walk, leaf_for(start), text)?;

                return Ok(Prolong::Done);
            }
        }
    }
}
