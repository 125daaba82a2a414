//! Shared helpers for the construction tests: edge collection, path
//! walking, and the universal tree invariants.
#![allow(dead_code)]

use std::collections::BTreeSet;

use stree_text::{Text, TERMINATOR};
use stree_tree::{leaf_depth, suffix_start, Algorithm, NodeId, Storage, SuffixTree, NONE, ROOT};

/// One edge of a built tree, with enough context for the invariants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    /// Depth of the parent.
    pub parent_depth: u32,
    /// Depth of the child.
    pub child_depth: u32,
    /// Path label of the child (from the root).
    pub path: String,
    /// The child itself.
    pub child: NodeId,
    /// The parent.
    pub parent: NodeId,
    /// The child's suffix link, [`NONE`] for leaves and unset links.
    pub suffix_link: NodeId,
}

fn render(symbol: u8) -> char {
    if symbol == TERMINATOR {
        '$'
    } else {
        char::from(symbol)
    }
}

fn collect<S: Storage>(
    store: &S,
    node: NodeId,
    prefix: &str,
    text: &Text,
    edges: &mut Vec<Edge>,
) {
    let frontier = text.frontier();
    let parent_depth = store.depth(node);
    let mut child = store.next_child(node, NONE, text);

    while let Some(current) = child {
        let child_depth = store.node_depth(current, frontier);

        let offset = if current > 0 {
            store.head_position(current) as usize
        } else {
            suffix_start(current)
        };

        let label: String = (offset + parent_depth as usize..offset + child_depth as usize)
            .map(|i| render(text[i]))
            .collect();
        let path = format!("{prefix}{label}");

        edges.push(Edge {
            parent_depth,
            child_depth,
            path: path.clone(),
            child: current,
            parent: node,
            suffix_link: if current > 0 {
                store.suffix_link(current)
            } else {
                NONE
            },
        });

        if current > 0 {
            collect(store, current, &path, text, edges);
        }

        child = store.next_child(node, current, text);
    }
}

/// Every edge of the tree, depth first.
pub fn edges<S: Storage>(tree: &SuffixTree<S>, text: &Text) -> Vec<Edge> {
    let mut edges = Vec::new();

    collect(tree.store(), ROOT, "", text, &mut edges);

    edges
}

/// The traversal-equivalence key: the multiset of (depth, label) edges.
pub fn edge_multiset<S: Storage>(tree: &SuffixTree<S>, text: &Text) -> Vec<(u32, u32, String)> {
    let mut keys: Vec<_> = edges(tree, text)
        .into_iter()
        .map(|e| (e.parent_depth, e.child_depth, e.path))
        .collect();

    keys.sort();
    keys
}

/// Asserts the universal invariants T1–T4 on a built tree.
///
/// `expect_links` is set for the full McCreight/Ukkonen algorithms,
/// which leave every non-root branching node with a resolved suffix
/// link; the simple baselines keep none.
pub fn check_invariants<S: Storage>(tree: &SuffixTree<S>, text: &Text, expect_links: bool) {
    let store = tree.store();
    let frontier = text.frontier();
    let all = edges(tree, text);

    // T1: exactly N + 1 leaves, one per non-empty suffix
    let leaves: BTreeSet<NodeId> = all.iter().map(|e| e.child).filter(|&c| c < 0).collect();
    let expected: BTreeSet<NodeId> = (1..=text.len() + 1).map(|p| -(p as NodeId)).collect();

    assert_eq!(leaves, expected, "leaf identities");

    // T2: each leaf spells its suffix from the root
    for edge in all.iter().filter(|e| e.child < 0) {
        let start = suffix_start(edge.child);
        let suffix: String = (start..=frontier).map(|i| render(text[i])).collect();

        assert_eq!(edge.path, suffix, "label of leaf {}", edge.child);
        assert_eq!(edge.child_depth, leaf_depth(edge.child, frontier));
    }

    // T3: every branching node has at least two children with distinct
    // first symbols, and children are deeper than their parents
    for node in 1..=store.branch_count() as NodeId {
        let mut first_symbols = BTreeSet::new();
        let mut count = 0;
        let mut child = store.next_child(node, NONE, text);

        while let Some(current) = child {
            count += 1;

            let offset = if current > 0 {
                store.head_position(current) as usize
            } else {
                suffix_start(current)
            };

            assert!(
                store.node_depth(current, frontier) > store.depth(node),
                "child {current} of {node} is not deeper"
            );
            assert!(
                first_symbols.insert(text[offset + store.depth(node) as usize]),
                "children of {node} share a first symbol"
            );

            child = store.next_child(node, current, text);
        }

        if node != ROOT {
            assert!(count >= 2, "branching node {node} has {count} children");
        }
    }

    // T4: suffix links of branching nodes point one level up the suffix
    // chain
    for edge in all.iter().filter(|e| e.child > 0) {
        let link = edge.suffix_link;

        if expect_links && edge.child != ROOT {
            assert_ne!(link, NONE, "node {} has no suffix link", edge.child);
        }

        if link != NONE {
            assert_eq!(
                store.depth(link) + 1,
                edge.child_depth,
                "suffix link of {} lands at the wrong depth",
                edge.child
            );

            let linked = all
                .iter()
                .find(|e| e.child == link)
                .map(|e| e.path.as_str())
                .unwrap_or("");

            assert_eq!(linked, &edge.path[1..], "suffix link label of {}", edge.child);
        }
    }
}

/// Finds the branching node whose path label is exactly `path`.
pub fn node_at_path<S: Storage>(tree: &SuffixTree<S>, text: &Text, path: &str) -> Option<NodeId> {
    edges(tree, text)
        .into_iter()
        .find(|e| e.child > 0 && e.path == path)
        .map(|e| e.child)
}

/// Number of children of a branching node.
pub fn child_count<S: Storage>(tree: &SuffixTree<S>, node: NodeId, text: &Text) -> usize {
    let store = tree.store();
    let mut count = 0;
    let mut child = store.next_child(node, NONE, text);

    while let Some(current) = child {
        count += 1;
        child = store.next_child(node, current, text);
    }

    count
}

/// Builds one configuration and checks T1–T4, returning the
/// equivalence key.
pub fn build_checked<S: Storage>(
    store: S,
    algorithm: Algorithm,
    text: &Text,
) -> Vec<(u32, u32, String)> {
    let tree = SuffixTree::build(algorithm, store, text).expect("build");

    check_invariants(&tree, text, algorithm.uses_suffix_links());

    edge_multiset(&tree, text)
}
