use serde::{Deserialize, Serialize};
use stree_text::Text;

use crate::{mccreight, ukkonen, Storage};

/// Construction algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Simple McCreight-style baseline, quadratic, no suffix links.
    SimpleMcCreight,
    /// McCreight's linear algorithm.
    McCreight,
    /// Simple Ukkonen-style baseline, quadratic, no suffix links.
    SimpleUkkonen,
    /// Ukkonen's on-line linear algorithm.
    Ukkonen,
}

impl Algorithm {
    /// Human-readable name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleMcCreight => "simple McCreight's style",
            Self::McCreight => "McCreight's",
            Self::SimpleUkkonen => "simple Ukkonen's style",
            Self::Ukkonen => "Ukkonen's",
        }
    }

    /// Whether the algorithm maintains suffix links, which the
    /// backward-pointer variant simulates bottom-up.
    pub fn uses_suffix_links(&self) -> bool {
        matches!(self, Self::McCreight | Self::Ukkonen)
    }
}

/// A suffix tree built over a borrowed text.
///
/// The storage back-end owns every table; the text is only borrowed for
/// the duration of construction and traversal calls.
#[derive(Debug, Clone)]
pub struct SuffixTree<S: Storage> {
    store: S,
}

impl<S: Storage> SuffixTree<S> {
    /// Builds the suffix tree of `text` with the selected algorithm.
    pub fn build(algorithm: Algorithm, mut store: S, text: &Text) -> anyhow::Result<Self> {
        if store.backward() && !algorithm.uses_suffix_links() {
            anyhow::bail!(
                "the backward-pointer variant is not compatible with the {} algorithm",
                algorithm.name()
            );
        }

        store.initialize(text)?;

        match algorithm {
            Algorithm::SimpleMcCreight => mccreight::build_simple(&mut store, text)?,
            Algorithm::McCreight => mccreight::build(&mut store, text)?,
            Algorithm::SimpleUkkonen => ukkonen::build_simple(&mut store, text)?,
            Algorithm::Ukkonen => ukkonen::build(&mut store, text)?,
        }

        tracing::info!(
            branching_nodes = store.branch_count(),
            "suffix tree built"
        );

        Ok(Self { store })
    }

    /// Builds with McCreight's algorithm.
    pub fn mccreight(store: S, text: &Text) -> anyhow::Result<Self> {
        Self::build(Algorithm::McCreight, store, text)
    }

    /// Builds with Ukkonen's algorithm.
    pub fn ukkonen(store: S, text: &Text) -> anyhow::Result<Self> {
        Self::build(Algorithm::Ukkonen, store, text)
    }

    /// The storage back-end holding the tree.
    pub fn store(&self) -> &S {
        &self.store
    }
}
