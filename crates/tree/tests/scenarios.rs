//! Literal construction scenarios with hand-verified trees, each
//! checked through two independent configurations.

mod common;

use common::{build_checked, check_invariants, child_count, edge_multiset, edges, node_at_path};
use stree_text::{Encoding, Text};
use stree_tree::{
    Algorithm, HashedEdges, LinkedChildren, Resolution, Storage, SuffixTree, NONE, ROOT,
};

#[test]
fn single_symbol_text() -> anyhow::Result<()> {
    let text = Text::from("a");

    let linked = SuffixTree::mccreight(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::ukkonen(HashedEdges::new().with_seed(1), &text)?;

    for all in [edges(&linked, &text), edges(&hashed, &text)] {
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|e| e.parent == ROOT));

        let labels: Vec<_> = all.iter().map(|e| (e.child, e.path.as_str())).collect();

        assert!(labels.contains(&(-1, "a$")));
        assert!(labels.contains(&(-2, "$")));
    }

    check_invariants(&linked, &text, true);
    check_invariants(&hashed, &text, true);

    Ok(())
}

#[test]
fn abab_has_one_internal_node_with_a_link() -> anyhow::Result<()> {
    let text = Text::from("abab");

    let linked = SuffixTree::ukkonen(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::mccreight(HashedEdges::new().with_seed(2), &text)?;

    check_invariants(&linked, &text, true);
    check_invariants(&hashed, &text, true);

    let ab = node_at_path(&linked, &text, "ab").expect("branching node `ab`");
    let b = node_at_path(&linked, &text, "b").expect("branching node `b`");

    let store = linked.store();

    assert_eq!(store.depth(ab), 2);
    assert_eq!(store.suffix_link(ab), b);
    assert_eq!(store.suffix_link(b), ROOT);

    // the head position spells the node's label
    let head = store.head_position(ab) as usize;

    assert_eq!(&text.symbols()[head..head + 2], b"ab");

    // the root branches on `a`, `b` and the terminator
    assert_eq!(child_count(&linked, ROOT, &text), 3);
    assert_eq!(linked.store().branch_count(), 3);

    assert_eq!(edge_multiset(&linked, &text), edge_multiset(&hashed, &text));

    Ok(())
}

#[test]
fn aaa_builds_a_suffix_link_chain() -> anyhow::Result<()> {
    let text = Text::from("aaa");

    let linked = SuffixTree::mccreight(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::ukkonen(HashedEdges::new().with_seed(3), &text)?;

    check_invariants(&linked, &text, true);
    check_invariants(&hashed, &text, true);

    let b1 = node_at_path(&linked, &text, "a").expect("branching node `a`");
    let b2 = node_at_path(&linked, &text, "aa").expect("branching node `aa`");
    let store = linked.store();

    assert_eq!(store.depth(b1), 1);
    assert_eq!(store.depth(b2), 2);
    assert_eq!(store.suffix_link(b2), b1);
    assert_eq!(store.suffix_link(b1), ROOT);

    // the literal leaf placement, as (path label, leaf) pairs
    let placement: Vec<_> = edges(&linked, &text)
        .into_iter()
        .filter(|e| e.child < 0)
        .map(|e| (e.path, e.parent))
        .collect();

    assert!(placement.contains(&("aaa$".into(), b2)));
    assert!(placement.contains(&("aa$".into(), b2)));
    assert!(placement.contains(&("a$".into(), b1)));
    assert!(placement.contains(&("$".into(), ROOT)));

    assert_eq!(edge_multiset(&linked, &text), edge_multiset(&hashed, &text));

    Ok(())
}

#[test]
fn mississippi_branches_twice_under_issi() -> anyhow::Result<()> {
    let text = Text::from("mississippi");

    let linked = SuffixTree::mccreight(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::ukkonen(HashedEdges::new().with_seed(4), &text)?;

    check_invariants(&linked, &text, true);
    check_invariants(&hashed, &text, true);

    assert_eq!(edge_multiset(&linked, &text), edge_multiset(&hashed, &text));

    let issi = node_at_path(&linked, &text, "issi").expect("branching node `issi`");

    assert_eq!(child_count(&linked, issi, &text), 2);

    let issi = node_at_path(&hashed, &text, "issi").expect("branching node `issi`");

    assert_eq!(child_count(&hashed, issi, &text), 2);

    Ok(())
}

#[test]
fn empty_text_has_a_single_leaf() -> anyhow::Result<()> {
    let text = Text::from_bytes(b"", Encoding::Ascii)?;

    let linked = SuffixTree::ukkonen(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::mccreight(HashedEdges::new().with_seed(5), &text)?;

    for tree_edges in [edges(&linked, &text), edges(&hashed, &text)] {
        assert_eq!(tree_edges.len(), 1);
        assert_eq!(tree_edges[0].child, -1);
        assert_eq!(tree_edges[0].path, "$");
    }

    assert_eq!(linked.store().branch_count(), 1);
    assert_eq!(hashed.store().branch_count(), 1);

    Ok(())
}

#[test]
fn repetitive_text_chains_suffix_links_by_depth() -> anyhow::Result<()> {
    let n = 40;
    let text = Text::from("a".repeat(n).as_str());

    let linked = SuffixTree::mccreight(LinkedChildren::new(), &text)?;

    check_invariants(&linked, &text, true);

    let store = linked.store();

    // N branching nodes: the root plus the chain b_1 … b_{N-1}
    assert_eq!(store.branch_count(), n);

    for depth in 1..n as u32 {
        let node = node_at_path(&linked, &text, &"a".repeat(depth as usize))
            .expect("chain node");
        let link = store.suffix_link(node);

        assert_eq!(store.depth(node), depth);

        if depth == 1 {
            assert_eq!(link, ROOT);
        } else {
            assert_eq!(store.depth(link), depth - 1);
        }
    }

    Ok(())
}

#[test]
fn full_alphabet_round_trips() -> anyhow::Result<()> {
    // every symbol the one-byte width admits, each exactly once
    let bytes: Vec<u8> = (0u8..=254).collect();
    let text = Text::from_bytes(&bytes, Encoding::Latin1)?;

    let linked = SuffixTree::ukkonen(LinkedChildren::new(), &text)?;
    let hashed = SuffixTree::mccreight(
        HashedEdges::new().with_resolution(Resolution::Double).with_seed(6),
        &text,
    )?;

    // no repeats, so the root is the only branching node
    assert_eq!(linked.store().branch_count(), 1);
    assert_eq!(child_count(&linked, ROOT, &text), 256);
    assert_eq!(child_count(&hashed, ROOT, &text), 256);

    Ok(())
}

#[test]
fn all_algorithms_agree_on_a_small_text() {
    let text = Text::from("abracadabra");

    let keys = [
        build_checked(LinkedChildren::new(), Algorithm::SimpleMcCreight, &text),
        build_checked(LinkedChildren::new(), Algorithm::McCreight, &text),
        build_checked(LinkedChildren::new(), Algorithm::SimpleUkkonen, &text),
        build_checked(LinkedChildren::new(), Algorithm::Ukkonen, &text),
        build_checked(
            LinkedChildren::new().with_backward_links(),
            Algorithm::McCreight,
            &text,
        ),
        build_checked(
            LinkedChildren::new().with_backward_links(),
            Algorithm::Ukkonen,
            &text,
        ),
        build_checked(HashedEdges::new().with_seed(7), Algorithm::McCreight, &text),
        build_checked(HashedEdges::new().with_seed(7), Algorithm::Ukkonen, &text),
        build_checked(
            HashedEdges::new().with_backward_links().with_seed(7),
            Algorithm::McCreight,
            &text,
        ),
        build_checked(
            HashedEdges::new().with_resolution(Resolution::Double).with_seed(7),
            Algorithm::SimpleUkkonen,
            &text,
        ),
    ];

    for key in &keys[1..] {
        assert_eq!(key, &keys[0]);
    }
}

#[test]
fn backward_variant_rejects_simple_algorithms() {
    let text = Text::from("abc");

    let result = SuffixTree::build(
        Algorithm::SimpleMcCreight,
        LinkedChildren::new().with_backward_links(),
        &text,
    );

    assert!(result.is_err());
}

#[test]
fn suffix_links_exist_after_full_builds() -> anyhow::Result<()> {
    let text = Text::from("bananaban");
    let tree = SuffixTree::mccreight(LinkedChildren::new(), &text)?;
    let store = tree.store();

    for node in 2..=store.branch_count() as i32 {
        assert_ne!(store.suffix_link(node), NONE);
    }

    Ok(())
}
