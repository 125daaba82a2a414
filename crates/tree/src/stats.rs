use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};
use stree_text::Text;

use crate::{Storage, SuffixTree};

/// Storage statistics of a built suffix tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Number of input characters.
    pub text_length: usize,
    /// Branch records in use, the root included.
    pub branching_nodes: usize,
    /// Branch records allocated.
    pub branch_capacity: usize,
    /// Bytes per branch record.
    pub branch_record_size: usize,
    /// Leaf cells allocated.
    pub leaf_cells: usize,
    /// Bytes per leaf record.
    pub leaf_record_size: usize,
    /// Edges stored in the hash table, when one is used.
    pub edges: Option<usize>,
    /// Hash table cells, when one is used.
    pub table_cells: Option<usize>,
    /// Bytes per edge record, when a hash table is used.
    pub edge_record_size: Option<usize>,
    /// Bytes held by the hash settings.
    pub settings_bytes: usize,
    /// Bytes held by auxiliary tables (parent pointers).
    pub extra_bytes: usize,
}

impl TreeStats {
    /// Total bytes allocated for the tree.
    pub fn allocated_bytes(&self) -> usize {
        self.leaf_cells * self.leaf_record_size
            + (self.branch_capacity + 1) * self.branch_record_size
            + self.table_cells.unwrap_or(0) * self.edge_record_size.unwrap_or(0)
            + self.settings_bytes
            + self.extra_bytes
    }

    /// Total bytes used by live records.
    pub fn used_bytes(&self) -> usize {
        (self.text_length + 1) * self.leaf_record_size
            + self.branching_nodes * self.branch_record_size
            + self.edges.unwrap_or(0) * self.edge_record_size.unwrap_or(0)
            + self.settings_bytes
            + self.extra_bytes
    }
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Suffix tree statistics:")?;
        writeln!(f, "-----------------------")?;
        writeln!(f, "The leaf record size: {} bytes", self.leaf_record_size)?;

        if let Some(size) = self.edge_record_size {
            writeln!(f, "The edge record size: {size} bytes")?;
        }

        writeln!(f, "The branch record size: {} bytes", self.branch_record_size)?;
        writeln!(f, "The text length: {}", self.text_length)?;
        writeln!(
            f,
            "Size of the leaf table: {} cells of {} bytes ({})",
            self.leaf_cells,
            self.leaf_record_size,
            human_size(self.leaf_cells * self.leaf_record_size)
        )?;

        if let (Some(edges), Some(cells), Some(size)) =
            (self.edges, self.table_cells, self.edge_record_size)
        {
            writeln!(f, "Number of edges: {edges}")?;
            writeln!(
                f,
                "Size of the edge table: {} cells of {} bytes ({})",
                cells,
                size,
                human_size(cells * size)
            )?;
            writeln!(
                f,
                "Edges load factor: {:.2}%",
                100.0 * edges as f64 / cells as f64
            )?;
        }

        writeln!(f, "Number of branching nodes: {}", self.branching_nodes)?;
        writeln!(
            f,
            "Size of the branch table: {} cells of {} bytes ({})",
            self.branch_capacity,
            self.branch_record_size,
            human_size(self.branch_capacity * self.branch_record_size)
        )?;
        writeln!(
            f,
            "Branching nodes load factor: {:.2}%",
            100.0 * self.branching_nodes as f64 / self.branch_capacity.max(1) as f64
        )?;

        if self.extra_bytes > 0 {
            writeln!(
                f,
                "Auxiliary table size: {} bytes ({})",
                self.extra_bytes,
                human_size(self.extra_bytes)
            )?;
        }

        let allocated = self.allocated_bytes();
        let used = self.used_bytes();
        let per_character = |bytes: usize| bytes as f64 / self.text_length.max(1) as f64;

        writeln!(
            f,
            "Total amount of memory allocated: {allocated} bytes ({}), {:.3} bytes per character",
            human_size(allocated),
            per_character(allocated)
        )?;
        writeln!(
            f,
            "Total amount of memory used: {used} bytes ({}), {:.3} bytes per character",
            human_size(used),
            per_character(used)
        )?;
        write!(
            f,
            "Memory load factor: {:.2}%",
            100.0 * used as f64 / allocated.max(1) as f64
        )
    }
}

impl<S: Storage> SuffixTree<S> {
    /// Storage statistics of this tree.
    pub fn stats(&self, text: &Text) -> TreeStats {
        self.store().stats(text)
    }
}

/// Renders a byte count with binary-unit prefixes, `12.345 MiB` style.
pub fn human_size(bytes: usize) -> String {
    const PREFIXES: [char; 9] = [' ', 'K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

    let mut order = 0;
    let mut whole = bytes;

    while whole > 1023 {
        whole >>= 10;
        order += 1;
    }

    if order == 0 {
        return format!("{whole} B");
    }

    let unit = 1usize << (10 * order);
    let mut fraction = (0.5 + (bytes % unit) as f64 / unit as f64 * 1000.0) as usize;

    if fraction == 1000 {
        whole += 1;
        fraction = 0;
    }

    format!("{whole}.{fraction:03} {}iB", PREFIXES[order])
}

/// Renders a duration in the benchmark report style, millisecond based.
pub fn human_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    let mut rendered = String::new();

    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1000 % 60;
    let millis = ms % 1000;

    if hours != 0 {
        rendered.push_str(&format!("{hours} hours, "));
    }

    if minutes != 0 {
        rendered.push_str(&format!("{minutes} minutes, "));
    }

    if seconds != 0 {
        let centis = (millis + 5) / 10;
        rendered.push_str(&format!("{seconds}.{centis:02} seconds ({ms} ms)"));
    } else {
        rendered.push_str(&format!("{millis} milliseconds ({ms} ms)"));
    }

    rendered
}
