use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use stree_text::Encoding;

const AFTER_HELP: &str = "\
Available implementation types are:
  SL    simple linked list (S. Kurtz)
  SH    simple hash table (S. Kurtz)
  LA    simple linear array (R. Giegerich, S. Kurtz and J. Stoye)

Available construction algorithms are:
  A     simple McCreight's style
  M     McCreight's
  B     simple Ukkonen's style
  U     Ukkonen's
  P     Partition and Write Only Top Down (PWOTD)

Available algorithm variations are:
  {empty}  default variation
  B        minimized branching (bottom-up suffix link simulation)

Available benchmarks are:
  C     create and drop the suffix tree
  T     create, traverse and drop the suffix tree";

/// Benchmark of the suffix tree construction algorithms.
#[derive(Debug, Parser)]
#[command(name = "st", version, about, after_help = AFTER_HELP)]
pub struct Cli {
    /// Storage implementation type.
    #[arg(short = 't', value_name = "TYPE")]
    pub storage: StorageKind,

    /// Construction algorithm, with an optional variation suffix `B`
    /// selecting bottom-up suffix link simulation.
    #[arg(short = 'a', value_name = "ALGORITHM")]
    pub algorithm: AlgorithmChoice,

    /// Benchmark to perform.
    #[arg(short = 'b', value_name = "BENCHMARK")]
    pub benchmark: Benchmark,

    /// Number of prefix characters dividing the suffixes into
    /// partitions (PWOTD only).
    #[arg(short = 'p', value_name = "NUMBER")]
    pub prefix_length: Option<usize>,

    /// Collision resolution technique of the hash table (SH only).
    #[arg(short = 'r', value_name = "CRT")]
    pub resolution: Option<ResolutionArg>,

    /// Number of Cuckoo hash functions (SH with Cuckoo hashing only).
    #[arg(short = 'c', value_name = "NUMBER")]
    pub functions: Option<usize>,

    /// Simple traversal logs, identical for all implementations.
    #[arg(short = 's')]
    pub simple: bool,

    /// Dump the traversal log to a file instead of standard output.
    #[arg(short = 'd', value_name = "DUMP_FILENAME")]
    pub dump: Option<PathBuf>,

    /// Character encoding of the input file.
    #[arg(short = 'e', value_name = "ENCODING", default_value = "UTF-8")]
    pub file_encoding: Encoding,

    /// Internal text encoding to use.
    #[arg(short = 'i', value_name = "ENCODING")]
    pub internal_encoding: Option<String>,

    /// The input text file.
    #[arg(value_name = "FILENAME")]
    pub filename: PathBuf,
}

/// Storage back-end selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Linked children lists.
    #[value(name = "SL")]
    Linked,
    /// Global edge hash table.
    #[value(name = "SH")]
    Hashed,
    /// Linear array (PWOTD only).
    #[value(name = "LA")]
    LinearArray,
}

/// Benchmark selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Benchmark {
    /// Construct the tree, then drop it.
    #[value(name = "C")]
    Construct,
    /// Construct, traverse, then drop.
    #[value(name = "T")]
    Traverse,
}

/// Collision resolution selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResolutionArg {
    /// Cuckoo hashing (the default).
    #[value(name = "C")]
    Cuckoo,
    /// Double hashing.
    #[value(name = "D")]
    Double,
}

/// Construction algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmArg {
    /// Simple McCreight-style baseline.
    SimpleMcCreight,
    /// McCreight's algorithm.
    McCreight,
    /// Simple Ukkonen-style baseline.
    SimpleUkkonen,
    /// Ukkonen's algorithm.
    Ukkonen,
    /// Partition and Write Only Top Down.
    Pwotd,
}

impl AlgorithmArg {
    /// Human-readable name, as used in the diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleMcCreight => "simple McCreight's style",
            Self::McCreight => "McCreight's",
            Self::SimpleUkkonen => "simple Ukkonen's style",
            Self::Ukkonen => "Ukkonen's",
            Self::Pwotd => "PWOTD",
        }
    }
}

/// An `-a` argument: the algorithm letter plus an optional variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmChoice {
    /// Selected algorithm.
    pub algorithm: AlgorithmArg,
    /// Whether the backward-pointer (bottom-up) variation is selected.
    pub backward: bool,
}

impl FromStr for AlgorithmChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let algorithm = match chars.next() {
            Some('A') => AlgorithmArg::SimpleMcCreight,
            Some('M') => AlgorithmArg::McCreight,
            Some('B') => AlgorithmArg::SimpleUkkonen,
            Some('U') => AlgorithmArg::Ukkonen,
            Some('P') => AlgorithmArg::Pwotd,
            _ => anyhow::bail!("unrecognized algorithm `{s}`"),
        };

        let backward = match (chars.next(), chars.next()) {
            (None, _) => false,
            (Some('B'), None) => true,
            _ => anyhow::bail!("unrecognized algorithm variation in `{s}`"),
        };

        Ok(Self {
            algorithm,
            backward,
        })
    }
}

impl Cli {
    /// Enforces the pairwise compatibility rules before any build
    /// begins.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage == StorageKind::LinearArray && self.algorithm.algorithm != AlgorithmArg::Pwotd
        {
            anyhow::bail!(
                "the selected implementation type (LA) does not support the desired \
                 algorithm ({})",
                self.algorithm.algorithm.name()
            );
        }

        if self.algorithm.algorithm == AlgorithmArg::Pwotd
            && self.storage != StorageKind::LinearArray
        {
            anyhow::bail!(
                "the selected implementation type does not support the desired algorithm (PWOTD)"
            );
        }

        if self.algorithm.backward
            && !matches!(
                self.algorithm.algorithm,
                AlgorithmArg::McCreight | AlgorithmArg::Ukkonen
            )
        {
            anyhow::bail!(
                "the selected algorithm ({}) does not support the desired variation (B)",
                self.algorithm.algorithm.name()
            );
        }

        if self.dump.is_some() && self.benchmark != Benchmark::Traverse {
            anyhow::bail!("the -d parameter can only be used with the traverse (T) benchmark");
        }

        if self.simple && self.benchmark != Benchmark::Traverse {
            anyhow::bail!("the -s parameter can only be used with the traverse (T) benchmark");
        }

        if self.resolution.is_some() && self.storage != StorageKind::Hashed {
            anyhow::bail!("the -r parameter can only be used with the SH implementation type");
        }

        if self.functions.is_some() && self.storage != StorageKind::Hashed {
            anyhow::bail!("the -c parameter can only be used with the SH implementation type");
        }

        if self.functions.is_some() && self.resolution != Some(ResolutionArg::Cuckoo) {
            anyhow::bail!(
                "the -c parameter can only be used with the SH implementation type when the \
                 collision resolution technique is set to the Cuckoo hashing"
            );
        }

        if self.prefix_length.is_some() && self.storage != StorageKind::LinearArray {
            anyhow::bail!("the -p parameter can only be used with the LA implementation type");
        }

        if let Some(name) = &self.internal_encoding {
            stree_text::validate_internal_encoding(name)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("st").chain(args.iter().copied()))
    }

    #[test]
    fn algorithm_choices_parse_with_variations() {
        assert_eq!(
            "MB".parse::<AlgorithmChoice>().unwrap(),
            AlgorithmChoice {
                algorithm: AlgorithmArg::McCreight,
                backward: true
            }
        );
        assert_eq!(
            "U".parse::<AlgorithmChoice>().unwrap(),
            AlgorithmChoice {
                algorithm: AlgorithmArg::Ukkonen,
                backward: false
            }
        );
        assert!("X".parse::<AlgorithmChoice>().is_err());
        assert!("MBB".parse::<AlgorithmChoice>().is_err());
        assert!("MC".parse::<AlgorithmChoice>().is_err());
    }

    #[test]
    fn incompatible_combinations_are_rejected() {
        let cli = parse(&["-t", "SL", "-a", "P", "-b", "C", "file"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = parse(&["-t", "SL", "-a", "AB", "-b", "C", "file"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = parse(&["-t", "SL", "-a", "M", "-b", "C", "-s", "file"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = parse(&["-t", "SL", "-a", "M", "-b", "C", "-r", "C", "file"]).unwrap();
        assert!(cli.validate().is_err());

        // -c requires an explicit cuckoo selection
        let cli = parse(&["-t", "SH", "-a", "M", "-b", "C", "-c", "4", "file"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = parse(&["-t", "SH", "-a", "MB", "-b", "C", "-r", "C", "-c", "4", "file"]).unwrap();
        assert!(cli.validate().is_ok());
    }
}
