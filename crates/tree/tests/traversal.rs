//! Traversal log format: the exact line grammar, both modes, and label
//! elision.

use stree_text::Text;
use stree_tree::{LinkedChildren, SuffixTree, TraversalKind};

fn log(text: &Text, kind: TraversalKind) -> String {
    let tree = SuffixTree::mccreight(LinkedChildren::new(), text).expect("build");
    let mut out = Vec::new();

    tree.traverse(text, kind, &mut out).expect("traverse");

    String::from_utf8(out).expect("utf-8 log")
}

#[test]
fn detailed_log_of_a_single_symbol_text() {
    let text = Text::from("a");

    assert_eq!(
        log(&text, TraversalKind::Detailed),
        "Suffix tree traversal BEGIN\n\
         P(1)[0]--\"a$\"(2)-->C(-1)[2]\n\
         P(1)[0]--\"$\"(1)-->C(-2)[1]\n\
         Suffix tree traversal END\n"
    );
}

#[test]
fn detailed_log_of_abab_shows_suffix_links() {
    let text = Text::from("abab");

    assert_eq!(
        log(&text, TraversalKind::Detailed),
        "Suffix tree traversal BEGIN\n\
         P(1)[0]--\"ab\"(2)-->C(2)[2]{3}\n\
         P(2)[2]--\"ab$\"(3)-->C(-1)[5]\n\
         P(2)[2]--\"$\"(1)-->C(-3)[3]\n\
         P(1)[0]--\"b\"(1)-->C(3)[1]{1}\n\
         P(3)[1]--\"ab$\"(3)-->C(-2)[4]\n\
         P(3)[1]--\"$\"(1)-->C(-4)[2]\n\
         P(1)[0]--\"$\"(1)-->C(-5)[1]\n\
         Suffix tree traversal END\n"
    );
}

#[test]
fn simple_log_hides_branch_ids_and_links() {
    let text = Text::from("abab");

    assert_eq!(
        log(&text, TraversalKind::Simple),
        "Simple suffix tree traversal BEGIN\n\
         P(?)[0]--\"ab\"(2)-->C(?)[2]\n\
         P(?)[2]--\"ab$\"(3)-->C(-1)[5]\n\
         P(?)[2]--\"$\"(1)-->C(-3)[3]\n\
         P(?)[0]--\"b\"(1)-->C(?)[1]\n\
         P(?)[1]--\"ab$\"(3)-->C(-2)[4]\n\
         P(?)[1]--\"$\"(1)-->C(-4)[2]\n\
         P(?)[0]--\"$\"(1)-->C(-5)[1]\n\
         Simple suffix tree traversal END\n"
    );
}

#[test]
fn long_labels_are_elided() {
    let text = Text::from(format!("x{}", "a".repeat(40)).as_str());
    let rendered = log(&text, TraversalKind::Detailed);

    assert!(
        rendered.contains("--\"xaaaaaaaaaaaaaa...aaaaaaaaaaaaaa$\"(42)-->"),
        "missing the elided leaf edge in:\n{rendered}"
    );

    // short edges stay verbatim
    assert!(rendered.contains("--\"a\"(1)-->"));
}

#[test]
fn ids_are_padded_to_the_table_width() {
    // a run of twelve equal symbols chains up twelve branching nodes,
    // so branch ids get two digits
    let text = Text::from("aaaaaaaaaaaa");
    let rendered = log(&text, TraversalKind::Detailed);

    assert!(
        rendered.contains("P(01)[0]--\"a\"(1)-->C(12)[1]{01}"),
        "log was:\n{rendered}"
    );
    assert!(
        rendered.contains("P(03)[10]--\"a\"(1)-->C(02)[11]{03}"),
        "log was:\n{rendered}"
    );
}
