use std::io;

use serde::{Deserialize, Serialize};
use stree_text::{Sym, Text, TERMINATOR};

use crate::{suffix_start, NodeId, Storage, SuffixTree, NONE, ROOT};

/// Traversal log format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalKind {
    /// One line per edge with node ids and suffix links.
    #[default]
    Detailed,
    /// The format shared by all back-ends: branch ids and suffix links
    /// replaced by `?`.
    Simple,
}

/// Labels longer than this many symbols are elided in the log.
const LABEL_ELISION_LIMIT: u32 = 32;

impl<S: Storage> SuffixTree<S> {
    /// Walks the tree depth first and writes one line per edge.
    ///
    /// Children are visited in the back-end's order: sibling order for
    /// linked children, increasing first-symbol order for hashed edges.
    pub fn traverse<W: io::Write>(
        &self,
        text: &Text,
        kind: TraversalKind,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let widths = Widths {
            branch: decimal_width(self.store().branch_count()),
            leaf: decimal_width(text.len() + 1),
        };

        match kind {
            TraversalKind::Detailed => writeln!(out, "Suffix tree traversal BEGIN")?,
            TraversalKind::Simple => writeln!(out, "Simple suffix tree traversal BEGIN")?,
        }

        visit_from(self.store(), ROOT, kind, widths, text, out)?;

        match kind {
            TraversalKind::Detailed => writeln!(out, "Suffix tree traversal END")?,
            TraversalKind::Simple => writeln!(out, "Simple suffix tree traversal END")?,
        }

        Ok(())
    }
}

#[derive(Clone, Copy)]
struct Widths {
    branch: usize,
    leaf: usize,
}

/// Decimal digits needed for the largest id of a table.
fn decimal_width(mut count: usize) -> usize {
    let mut width = 1;

    while count > 9 {
        width += 1;
        count /= 10;
    }

    width
}

fn visit_from<S: Storage, W: io::Write>(
    store: &S,
    node: NodeId,
    kind: TraversalKind,
    widths: Widths,
    text: &Text,
    out: &mut W,
) -> anyhow::Result<()> {
    let parent_depth = store.depth(node);
    let mut child = store.next_child(node, NONE, text);

    while let Some(current) = child {
        if store.backward() && store.parent_of(current) != node {
            anyhow::bail!(
                "child {current} records parent {} while being visited from {node}",
                store.parent_of(current)
            );
        }

        write_edge(store, node, current, parent_depth, kind, widths, text, out)?;

        if current > 0 {
            visit_from(store, current, kind, widths, text, out)?;
        }

        child = store.next_child(node, current, text);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_edge<S: Storage, W: io::Write>(
    store: &S,
    parent: NodeId,
    child: NodeId,
    parent_depth: u32,
    kind: TraversalKind,
    widths: Widths,
    text: &Text,
    out: &mut W,
) -> anyhow::Result<()> {
    let frontier = text.frontier();
    let child_depth = store.node_depth(child, frontier);

    if child_depth < parent_depth {
        anyhow::bail!(
            "child {child} at depth {child_depth} is shallower than its parent \
             {parent} at depth {parent_depth}"
        );
    }

    let offset = if child > 0 {
        store.head_position(child) as usize
    } else {
        suffix_start(child)
    };

    match kind {
        TraversalKind::Detailed => {
            write!(out, "P({parent:0width$})[{parent_depth}]", width = widths.branch)?
        }
        TraversalKind::Simple => write!(out, "P(?)[{parent_depth}]")?,
    }

    let length = child_depth - parent_depth;
    let first = offset + parent_depth as usize;
    let last = offset + child_depth as usize;

    if length <= LABEL_ELISION_LIMIT {
        let label: String = (first..last).map(|i| render(text[i])).collect();

        write!(out, "--\"{label}\"({length})-->")?;
    } else {
        let head: String = (first..first + 15).map(|i| render(text[i])).collect();
        let tail: String = (last - 15..last).map(|i| render(text[i])).collect();

        write!(out, "--\"{head}...{tail}\"({length})-->")?;
    }

    match (kind, child > 0) {
        (TraversalKind::Detailed, true) => {
            write!(out, "C({child:0width$})[{child_depth}]", width = widths.branch)?
        }
        (TraversalKind::Simple, true) => write!(out, "C(?)[{child_depth}]")?,
        (_, false) => write!(out, "C({child:0width$})[{child_depth}]", width = widths.leaf)?,
    }

    let link = if child > 0 { store.suffix_link(child) } else { NONE };

    if kind == TraversalKind::Detailed && link != NONE {
        writeln!(out, "{{{link:0width$}}}", width = widths.branch)?;
    } else {
        writeln!(out)?;
    }

    Ok(())
}

/// Renders one symbol for the log, the terminator as `$`.
fn render(symbol: Sym) -> char {
    if symbol == TERMINATOR {
        '$'
    } else {
        char::from(symbol)
    }
}
