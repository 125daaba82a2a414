#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod cli;

pub use cli::*;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::Context as _;
use stree_text::Text;
use stree_tree::{
    human_duration, Algorithm, HashedEdges, LinkedChildren, Resolution, Storage, SuffixTree,
    TraversalKind,
};

/// Runs the benchmark described by the parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    cli.validate()?;

    if cli.storage == StorageKind::LinearArray || cli.algorithm.algorithm == AlgorithmArg::Pwotd {
        anyhow::bail!(
            "the linear-array (PWOTD) implementation is not included in this build"
        );
    }

    let bytes = fs::read(&cli.filename)
        .with_context(|| format!("could not read `{}`", cli.filename.display()))?;
    let text = Text::from_bytes(&bytes, cli.file_encoding)?;

    tracing::info!(
        characters = text.len(),
        encoding = cli.file_encoding.name(),
        "text loaded"
    );

    let algorithm = match cli.algorithm.algorithm {
        AlgorithmArg::SimpleMcCreight => Algorithm::SimpleMcCreight,
        AlgorithmArg::McCreight => Algorithm::McCreight,
        AlgorithmArg::SimpleUkkonen => Algorithm::SimpleUkkonen,
        AlgorithmArg::Ukkonen => Algorithm::Ukkonen,
        AlgorithmArg::Pwotd => unreachable!("rejected above"),
    };

    match cli.storage {
        StorageKind::Linked => {
            let mut store = LinkedChildren::new();

            if cli.algorithm.backward {
                store = store.with_backward_links();
            }

            benchmark(store, algorithm, &cli, &text)
        }

        StorageKind::Hashed => {
            let mut store = HashedEdges::new();

            if let Some(ResolutionArg::Double) = cli.resolution {
                store = store.with_resolution(Resolution::Double);
            }

            if let Some(functions) = cli.functions {
                store = store.with_functions(functions);
            }

            if cli.algorithm.backward {
                store = store.with_backward_links();
            }

            benchmark(store, algorithm, &cli, &text)
        }

        StorageKind::LinearArray => unreachable!("rejected above"),
    }
}

/// Builds, optionally traverses, and drops the tree, reporting the
/// wall-clock time of each phase.
fn benchmark<S: Storage>(
    store: S,
    algorithm: Algorithm,
    cli: &Cli,
    text: &Text,
) -> anyhow::Result<()> {
    println!("Creating suffix tree using {} algorithm", algorithm.name());

    let started = Instant::now();
    let tree = SuffixTree::build(algorithm, store, text)?;
    let constructed = started.elapsed();

    println!("The suffix tree has been successfully created.");
    println!();
    println!("{}", tree.stats(text));
    println!();
    println!("Construction time: {}", human_duration(constructed));

    if cli.benchmark == Benchmark::Traverse {
        let kind = if cli.simple {
            TraversalKind::Simple
        } else {
            TraversalKind::Detailed
        };

        let started = Instant::now();

        match &cli.dump {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("could not create `{}`", path.display()))?;
                let mut out = BufWriter::new(file);

                tree.traverse(text, kind, &mut out)?;
                out.flush()?;

                println!("The traversal log has been dumped to `{}`.", path.display());
            }
            None => {
                let stdout = io::stdout();
                let mut out = stdout.lock();

                tree.traverse(text, kind, &mut out)?;
            }
        }

        println!("Traversal time: {}", human_duration(started.elapsed()));
    }

    let started = Instant::now();

    drop(tree);

    println!("Teardown time: {}", human_duration(started.elapsed()));

    Ok(())
}
