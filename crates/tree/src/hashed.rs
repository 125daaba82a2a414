use core::mem;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use stree_text::{Sym, Text, TERMINATOR};

use crate::stats::TreeStats;
use crate::storage::{initial_branch_capacity, next_growth_step};
use crate::table::{edge_key, HashSettings};
use crate::{suffix_start, BranchStep, EdgeRecord, NodeId, Resolution, Storage, Walk, NONE};

/// Bound on consecutive rebuild attempts before the table gives up.
const MAX_REBUILD_ATTEMPTS: usize = 16;

/// A branch record of the hashed-edges back-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HashedBranch {
    suffix_link: NodeId,
    depth: u32,
    head_position: u32,
}

/// The hashed-edges storage back-end.
///
/// Outgoing edges live in one global open-addressed table keyed by
/// `(source branching node, first edge symbol)`, resolved by Cuckoo
/// hashing (default) or double hashing. Collisions of distinct keys on
/// one slot are disambiguated by re-deriving the stored edge's first
/// symbol from the text.
#[derive(Debug, Clone)]
pub struct HashedEdges {
    branches: Vec<HashedBranch>,
    branch_parents: Vec<NodeId>,
    leaf_parents: Vec<NodeId>,
    branching_nodes: usize,
    capacity: usize,
    branch_step: usize,

    table: Vec<EdgeRecord>,
    settings: HashSettings,
    edges: usize,
    table_step: usize,

    resolution: Resolution,
    functions: usize,
    initial_table_size: Option<usize>,
    load_ceiling: f64,
    seed: Option<u64>,
    backward: bool,
    rng: SmallRng,
}

impl Default for HashedEdges {
    fn default() -> Self {
        Self {
            branches: Vec::new(),
            branch_parents: Vec::new(),
            leaf_parents: Vec::new(),
            branching_nodes: 0,
            capacity: 0,
            branch_step: 0,
            table: Vec::new(),
            settings: HashSettings::unallocated(),
            edges: 0,
            table_step: 0,
            resolution: Resolution::default(),
            functions: crate::CUCKOO_FUNCTIONS_DEFAULT,
            initial_table_size: None,
            load_ceiling: 0.5,
            seed: None,
            backward: false,
            rng: SmallRng::seed_from_u64(0),
        }
    }
}

impl HashedEdges {
    /// Creates an empty back-end; tables are allocated by
    /// [`Storage::initialize`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the collision resolution technique.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Sets the number of Cuckoo hash functions (minimum 2; smaller
    /// values fall back to the default of 8).
    pub fn with_functions(mut self, functions: usize) -> Self {
        self.functions = functions;
        self
    }

    /// Overrides the initial edge-table size (default: twice the text
    /// length).
    pub fn with_table_size(mut self, cells: usize) -> Self {
        self.initial_table_size = Some(cells);
        self
    }

    /// Sets the double-hashing load-factor ceiling (default 0.5).
    pub fn with_load_factor(mut self, ceiling: f64) -> Self {
        self.load_ceiling = ceiling;
        self
    }

    /// Seeds the PRNG behind the hash parameters, making the build
    /// fully deterministic.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables parent tracking, switching suffix-link simulation to the
    /// bottom-up variant.
    pub fn with_backward_links(mut self) -> Self {
        self.backward = true;
        self
    }

    /// Number of edges currently stored in the table.
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Number of cells in the edge table.
    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// The live records of the table, tombstones excluded, in slot
    /// order.
    pub fn live_records(&self) -> Vec<EdgeRecord> {
        self.table
            .iter()
            .filter(|record| !record.is_vacant())
            .copied()
            .collect()
    }

    /// First symbol of a live record's edge, re-derived from the text.
    pub fn record_first_symbol(&self, record: EdgeRecord, text: &Text) -> Sym {
        record_letter(&self.branches, record, text)
    }

    fn record_matches(&self, source: NodeId, letter: Sym, record: EdgeRecord, text: &Text) -> bool {
        record.source == source && record_letter(&self.branches, record, text) == letter
    }

    /// Finds the target of the `(source, letter)` edge, if present.
    pub fn lookup(&self, source: NodeId, letter: Sym, text: &Text) -> Option<NodeId> {
        let key = edge_key(source, letter);

        match self.settings.resolution() {
            Resolution::Double => {
                let cells = self.table.len();
                let shift = self.settings.secondary(key);
                let mut slot = self.settings.primary(key);

                for _ in 0..cells {
                    let record = self.table[slot];

                    if record.is_empty() {
                        return None;
                    }

                    if !record.is_vacant() && self.record_matches(source, letter, record, text) {
                        return Some(record.target);
                    }

                    slot = (slot + shift) % cells;
                }

                None
            }

            Resolution::Cuckoo => {
                for f in 0..self.settings.functions() {
                    let record = self.table[self.settings.cuckoo(f, key)];

                    if !record.is_empty() && self.record_matches(source, letter, record, text) {
                        return Some(record.target);
                    }
                }

                None
            }
        }
    }

    /// Inserts the `(source, letter) → target` edge, overwriting the
    /// target of an existing key.
    ///
    /// With `rehash_allowed` the table grows at the load-factor ceiling
    /// (double hashing) or rebuilds itself with fresh parameters when a
    /// Cuckoo eviction chain exceeds its bound; without it, a placement
    /// failure is an error.
    pub fn insert(
        &mut self,
        source: NodeId,
        letter: Sym,
        target: NodeId,
        rehash_allowed: bool,
        text: &Text,
    ) -> anyhow::Result<()> {
        match self.settings.resolution() {
            Resolution::Double => self.insert_double(source, letter, target, rehash_allowed, text),
            Resolution::Cuckoo => self.insert_cuckoo(source, letter, target, rehash_allowed, text),
        }
    }

    fn insert_double(
        &mut self,
        source: NodeId,
        letter: Sym,
        target: NodeId,
        rehash_allowed: bool,
        text: &Text,
    ) -> anyhow::Result<()> {
        for _ in 0..2 {
            let cells = self.table.len();

            if rehash_allowed && (self.edges + 1) as f64 > self.load_ceiling * cells as f64 {
                self.grow_table(text)?;
                continue;
            }

            let key = edge_key(source, letter);
            let shift = self.settings.secondary(key);
            let mut slot = self.settings.primary(key);
            let mut vacant = None;

            for _ in 0..cells {
                let record = self.table[slot];

                if record.is_empty() {
                    self.table[vacant.unwrap_or(slot)] = EdgeRecord { source, target };
                    self.edges += 1;

                    return Ok(());
                }

                if record.is_vacant() {
                    vacant.get_or_insert(slot);
                } else if self.record_matches(source, letter, record, text) {
                    self.table[slot].target = target;

                    return Ok(());
                }

                slot = (slot + shift) % cells;
            }

            if let Some(slot) = vacant {
                self.table[slot] = EdgeRecord { source, target };
                self.edges += 1;

                return Ok(());
            }

            if !rehash_allowed {
                anyhow::bail!("edge table is full during a rebuild");
            }

            self.grow_table(text)?;
        }

        anyhow::bail!("edge table insertion failed after growing")
    }

    fn insert_cuckoo(
        &mut self,
        source: NodeId,
        letter: Sym,
        target: NodeId,
        rehash_allowed: bool,
        text: &Text,
    ) -> anyhow::Result<()> {
        let key = edge_key(source, letter);
        let functions = self.settings.functions();

        for f in 0..functions {
            let slot = self.settings.cuckoo(f, key);
            let record = self.table[slot];

            if !record.is_empty() && self.record_matches(source, letter, record, text) {
                self.table[slot].target = target;

                return Ok(());
            }
        }

        self.edges += 1;

        for f in 0..functions {
            let slot = self.settings.cuckoo(f, key);

            if self.table[slot].is_empty() {
                self.table[slot] = EdgeRecord { source, target };

                return Ok(());
            }
        }

        let mut record = EdgeRecord { source, target };
        let mut slot = self.settings.cuckoo(0, key);
        let bound = eviction_bound(self.table.len());

        for _ in 0..bound {
            mem::swap(&mut self.table[slot], &mut record);

            if record.is_empty() {
                return Ok(());
            }

            let letter = record_letter(&self.branches, record, text);
            let key = edge_key(record.source, letter);

            let held = (0..functions)
                .find(|&f| self.settings.cuckoo(f, key) == slot)
                .ok_or_else(|| anyhow::anyhow!("evicted edge hashes to no candidate slot"))?;

            slot = self.settings.cuckoo((held + 1) % functions, key);
        }

        if !rehash_allowed {
            self.edges -= 1;

            anyhow::bail!("cuckoo insertion did not converge during a rebuild");
        }

        tracing::debug!(bound, "cuckoo eviction bound exceeded, rebuilding the edge table");

        self.rehash(self.table.len(), Some(record), text)
    }

    /// Removes the `(source, letter)` edge.
    ///
    /// Double hashing leaves a vacant tombstone so longer probe chains
    /// stay intact; Cuckoo deletion clears the slot directly.
    pub fn delete(&mut self, source: NodeId, letter: Sym, text: &Text) -> anyhow::Result<()> {
        let key = edge_key(source, letter);

        match self.settings.resolution() {
            Resolution::Double => {
                let cells = self.table.len();
                let shift = self.settings.secondary(key);
                let mut slot = self.settings.primary(key);

                for _ in 0..cells {
                    let record = self.table[slot];

                    if record.is_empty() {
                        break;
                    }

                    if !record.is_vacant() && self.record_matches(source, letter, record, text) {
                        self.table[slot].source = 0;
                        self.edges -= 1;

                        return Ok(());
                    }

                    slot = (slot + shift) % cells;
                }
            }

            Resolution::Cuckoo => {
                for f in 0..self.settings.functions() {
                    let slot = self.settings.cuckoo(f, key);
                    let record = self.table[slot];

                    if !record.is_empty() && self.record_matches(source, letter, record, text) {
                        self.table[slot] = EdgeRecord::default();
                        self.edges -= 1;

                        return Ok(());
                    }
                }
            }
        }

        anyhow::bail!("no edge to delete for node {source} on symbol {letter:#04x}")
    }

    /// Rebuilds the table with at least `desired` cells, regenerating
    /// the hash parameters and re-inserting every live record (plus the
    /// optional in-hand record of a failed eviction chain).
    fn rehash(
        &mut self,
        desired: usize,
        extra: Option<EdgeRecord>,
        text: &Text,
    ) -> anyhow::Result<()> {
        let mut live: Vec<EdgeRecord> = self
            .table
            .iter()
            .filter(|record| !record.is_vacant())
            .copied()
            .collect();

        live.extend(extra);

        let mut want = desired.max(live.len() + 1);

        for attempt in 0..MAX_REBUILD_ATTEMPTS {
            let mut cells = want;
            let settings =
                HashSettings::generate(self.resolution, self.functions, &mut cells, &mut self.rng);
            let mut fresh = vec![EdgeRecord::default(); cells];

            let placed = live
                .iter()
                .all(|&record| place(&mut fresh, &settings, &self.branches, record, text));

            if placed {
                tracing::debug!(cells, live = live.len(), attempt, "edge table rebuilt");

                self.table = fresh;
                self.settings = settings;

                return Ok(());
            }

            tracing::debug!(cells, attempt, "edge table rebuild did not converge, enlarging");

            want = cells + (cells >> 1).max(1);
        }

        anyhow::bail!("edge table rebuild did not converge after {MAX_REBUILD_ATTEMPTS} attempts")
    }

    /// Grows the table by the current increment and halves the
    /// increment, floored at 128.
    fn grow_table(&mut self, text: &Text) -> anyhow::Result<()> {
        let desired = self.table.len() + self.table_step;

        self.rehash(desired, None, text)?;
        self.table_step = next_growth_step(self.table_step);

        Ok(())
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) {
        if node > 0 {
            self.branch_parents[node as usize] = parent;
        } else {
            self.leaf_parents[suffix_start(node)] = parent;
        }
    }
}

impl Storage for HashedEdges {
    fn initialize(&mut self, text: &Text) -> anyhow::Result<()> {
        let len = text.len();
        let unit = initial_branch_capacity(len);

        self.rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        self.branches = vec![HashedBranch::default(); unit + 1];
        self.branching_nodes = 1;
        self.capacity = unit;
        self.branch_step = unit >> 1;

        if self.backward {
            self.branch_parents = vec![NONE; unit + 1];
            self.leaf_parents = vec![NONE; len + 2];
        }

        let mut cells = self.initial_table_size.unwrap_or(2 * len);

        self.settings =
            HashSettings::generate(self.resolution, self.functions, &mut cells, &mut self.rng);
        self.table = vec![EdgeRecord::default(); cells];
        self.edges = 0;
        self.table_step = cells >> 1;

        tracing::debug!(
            branch_cells = unit + 1,
            table_cells = cells,
            resolution = ?self.resolution,
            backward = self.backward,
            "hashed-edges tables allocated"
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
        let mut capacity = (self.capacity + self.branch_step)
            .max(desired)
            .min(text_len);

        if capacity < self.capacity {
            capacity = self.capacity;
        }

        self.branches.resize(capacity + 1, HashedBranch::default());

        if self.backward {
            self.branch_parents.resize(capacity + 1, NONE);
        }

        self.capacity = capacity;
        self.branch_step = next_growth_step(self.branch_step);

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

        walk.prev_child = NONE;

        match self.lookup(walk.parent, text[walk.position], text) {
            Some(target) => {
                walk.child = target;

                Ok(BranchStep::Edge)
            }
            None => {
                walk.child = NONE;

                Ok(BranchStep::Missing)
            }
        }
    }

    fn next_child(&self, parent: NodeId, current: NodeId, text: &Text) -> Option<NodeId> {
        let mut letter = if current == NONE {
            if let Some(target) = self.lookup(parent, 0, text) {
                return Some(target);
            }

            0u16
        } else {
            let record = EdgeRecord {
                source: parent,
                target: current,
            };

            record_letter(&self.branches, record, text) as u16
        };

        while letter < TERMINATOR as u16 {
            letter += 1;

            if let Some(target) = self.lookup(parent, letter as Sym, text) {
                return Some(target);
            }
        }

        None
    }

    fn create_leaf(&mut self, walk: &Walk, leaf: NodeId, text: &Text) -> anyhow::Result<()> {
        if walk.parent <= 0 {
            anyhow::bail!(
                "cannot create a child of the non-branching node {}",
                walk.parent
            );
        }

        self.insert(walk.parent, text[walk.position], leaf, true, text)?;

        if self.backward {
            self.leaf_parents[suffix_start(leaf)] = walk.parent;
        }

        Ok(())
    }

    fn split_edge(
        &mut self,
        walk: &mut Walk,
        matched: u32,
        _child_first: bool,
        new_head: u32,
        text: &Text,
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

        let child_head = if walk.child > 0 {
            self.branches[walk.child as usize].head_position as usize
        } else {
            suffix_start(walk.child)
        };

        self.branching_nodes += 1;

        let node = self.branching_nodes as NodeId;

        self.branches[node as usize] = HashedBranch {
            suffix_link: NONE,
            depth: self.branches[walk.parent as usize].depth + matched,
            head_position: new_head,
        };

        // redirect the old edge to the new node, then hang the old
        // child below it
        self.insert(walk.parent, text[walk.position], node, true, text)?;

        let below = text[child_head + self.branches[node as usize].depth as usize];

        self.insert(node, below, walk.child, true, text)?;

        if self.backward {
            self.branch_parents[node as usize] = walk.parent;
            self.set_parent(walk.child, node);
        }

        walk.parent = node;
        walk.child = NONE;
        walk.prev_child = NONE;
        walk.position += matched as usize;

        Ok(())
    }

    fn stats(&self, text: &Text) -> TreeStats {
        let parent_cells = self.branch_parents.len() + self.leaf_parents.len();

        TreeStats {
            text_length: text.len(),
            branching_nodes: self.branching_nodes,
            branch_capacity: self.capacity,
            branch_record_size: mem::size_of::<HashedBranch>(),
            leaf_cells: if self.backward { text.len() + 2 } else { 0 },
            leaf_record_size: if self.backward {
                mem::size_of::<NodeId>()
            } else {
                0
            },
            edges: Some(self.edges),
            table_cells: Some(self.table.len()),
            edge_record_size: Some(mem::size_of::<EdgeRecord>()),
            settings_bytes: self.settings.allocated_bytes(),
            extra_bytes: parent_cells * mem::size_of::<NodeId>(),
        }
    }
}

/// First symbol of a stored edge, re-derived from the text.
fn record_letter(branches: &[HashedBranch], record: EdgeRecord, text: &Text) -> Sym {
    let depth = branches[record.source as usize].depth as usize;

    let index = if record.target > 0 {
        branches[record.target as usize].head_position as usize + depth
    } else {
        suffix_start(record.target) + depth
    };

    text[index]
}

/// Displacements allowed to a Cuckoo insertion before a rebuild.
fn eviction_bound(cells: usize) -> usize {
    8 * cells.max(2).ilog2() as usize
}

/// Places a record into a fresh table, without growing it.
fn place(
    table: &mut [EdgeRecord],
    settings: &HashSettings,
    branches: &[HashedBranch],
    record: EdgeRecord,
    text: &Text,
) -> bool {
    let letter = record_letter(branches, record, text);
    let key = edge_key(record.source, letter);

    match settings.resolution() {
        Resolution::Double => {
            let cells = table.len();
            let shift = settings.secondary(key);
            let mut slot = settings.primary(key);

            for _ in 0..cells {
                if table[slot].is_empty() {
                    table[slot] = record;

                    return true;
                }

                slot = (slot + shift) % cells;
            }

            false
        }

        Resolution::Cuckoo => {
            let functions = settings.functions();

            for f in 0..functions {
                let slot = settings.cuckoo(f, key);

                if table[slot].is_empty() {
                    table[slot] = record;

                    return true;
                }
            }

            let mut record = record;
            let mut slot = settings.cuckoo(0, key);

            for _ in 0..eviction_bound(table.len()) {
                mem::swap(&mut table[slot], &mut record);

                if record.is_empty() {
                    return true;
                }

                let letter = record_letter(branches, record, text);
                let key = edge_key(record.source, letter);

                let held = match (0..functions).find(|&f| settings.cuckoo(f, key) == slot) {
                    Some(f) => f,
                    None => return false,
                };

                slot = settings.cuckoo((held + 1) % functions, key);
            }

            false
        }
    }
}
