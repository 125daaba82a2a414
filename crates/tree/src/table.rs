use core::mem;

use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use stree_primes::next_prime;
use stree_text::Sym;

use crate::NodeId;

/// A single record of the global edge hash table.
///
/// An empty slot has both nodes zero; a vacant slot (a tombstone left by
/// double-hashing deletion) has a zero source but a nonzero target, so
/// every empty record is vacant but not the other way around.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    /// The branching node the edge leaves.
    pub source: NodeId,
    /// The node the edge enters.
    pub target: NodeId,
}

impl EdgeRecord {
    /// Whether the slot holds no record at all.
    pub fn is_empty(&self) -> bool {
        self.source == 0 && self.target == 0
    }

    /// Whether the slot is free for insertion (empty or a tombstone).
    pub fn is_vacant(&self) -> bool {
        self.source == 0
    }
}

/// Collision resolution technique of the edge hash table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Cuckoo hashing with K candidate slots per key.
    #[default]
    Cuckoo,
    /// Double hashing over a prime-sized table.
    Double,
}

/// Default number of Cuckoo hash functions.
pub const CUCKOO_FUNCTIONS_DEFAULT: usize = 8;

/// The largest prime fitting 32 bits; the hashing universe modulus.
pub const UNIVERSE_PRIME: u64 = 4_294_967_291;

/// Combines an edge key from its source node and first edge symbol.
pub(crate) fn edge_key(source: NodeId, letter: Sym) -> u64 {
    (source as u64) ^ ((letter as u64) << 32)
}

/// Parameters of the edge hash table.
///
/// For double hashing this is the pair of division moduli; for Cuckoo
/// hashing, the K prime-sized partitions with their random affine
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HashSettings {
    resolution: Resolution,
    phf_max: u64,
    shf_max: u64,
    functions: usize,
    mul: Vec<u64>,
    add: Vec<u64>,
    offsets: Vec<usize>,
    sizes: Vec<usize>,
}

impl HashSettings {
    /// Settings of a back-end whose tables have not been allocated yet.
    pub fn unallocated() -> Self {
        Self {
            resolution: Resolution::Cuckoo,
            phf_max: 1,
            shf_max: 1,
            functions: 0,
            mul: Vec::new(),
            add: Vec::new(),
            offsets: Vec::new(),
            sizes: Vec::new(),
        }
    }

    /// Derives settings for the desired table size, adjusting it to the
    /// actually usable size (prime, or a sum of prime partitions).
    pub fn generate(
        resolution: Resolution,
        functions: usize,
        desired: &mut usize,
        rng: &mut SmallRng,
    ) -> Self {
        match resolution {
            Resolution::Cuckoo => {
                let functions = if functions < 2 {
                    tracing::warn!(
                        functions,
                        adjusted = CUCKOO_FUNCTIONS_DEFAULT,
                        "fewer than two cuckoo functions requested"
                    );

                    CUCKOO_FUNCTIONS_DEFAULT
                } else {
                    functions
                };

                let mut mul = Vec::with_capacity(functions);
                let mut add = Vec::with_capacity(functions);
                let mut offsets = Vec::with_capacity(functions);
                let mut sizes = Vec::with_capacity(functions);

                let mut first = *desired / functions;

                if first == 0 {
                    tracing::warn!(desired, "requested hash table size is too small");

                    first = 1;
                }

                let mut total = 0;

                for i in 0..functions {
                    let size = if i == 0 {
                        next_prime(first as u64, rng) as usize
                    } else {
                        next_prime(sizes[i - 1] as u64, rng) as usize
                    };

                    offsets.push(total);
                    sizes.push(size);
                    total += size;

                    mul.push(rng.random_range(1..UNIVERSE_PRIME));
                    add.push(rng.random_range(0..UNIVERSE_PRIME));

                    tracing::debug!(
                        function = i,
                        a = mul[i],
                        b = add[i],
                        offset = offsets[i],
                        size,
                        "cuckoo hash function chosen"
                    );
                }

                *desired = total;

                Self {
                    resolution,
                    phf_max: 0,
                    shf_max: 0,
                    functions,
                    mul,
                    add,
                    offsets,
                    sizes,
                }
            }

            Resolution::Double => {
                if *desired == 0 {
                    tracing::warn!("requested hash table size is too small");

                    *desired = 1;
                }

                let modulus = next_prime(*desired as u64, rng);

                *desired = modulus as usize;

                tracing::debug!(modulus, "double hashing moduli chosen");

                Self {
                    resolution,
                    phf_max: modulus,
                    // the prime minus two (Knuth); may itself be prime,
                    // while the even prime-minus-one never is
                    shf_max: (modulus - 2).max(1),
                    functions: 0,
                    mul: Vec::new(),
                    add: Vec::new(),
                    offsets: Vec::new(),
                    sizes: Vec::new(),
                }
            }
        }
    }

    /// The resolution these settings were generated for.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of Cuckoo functions.
    pub fn functions(&self) -> usize {
        self.functions
    }

    /// Primary hash: the initial probe slot.
    pub fn primary(&self, key: u64) -> usize {
        (key % self.phf_max) as usize
    }

    /// Secondary hash: the probe shift interval, always positive.
    pub fn secondary(&self, key: u64) -> usize {
        (key % self.shf_max + 1) as usize
    }

    /// The `index`-th Cuckoo hash of a key.
    pub fn cuckoo(&self, index: usize, key: u64) -> usize {
        let affine = (self.mul[index].wrapping_mul(key).wrapping_add(self.add[index]))
            % UNIVERSE_PRIME;

        (affine % self.sizes[index] as u64) as usize + self.offsets[index]
    }

    /// Bytes held by the settings, for the statistics report.
    pub fn allocated_bytes(&self) -> usize {
        mem::size_of::<Self>()
            + (self.mul.len() + self.add.len()) * mem::size_of::<u64>()
            + (self.offsets.len() + self.sizes.len()) * mem::size_of::<usize>()
    }
}
