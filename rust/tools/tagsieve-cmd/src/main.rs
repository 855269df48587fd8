use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tagsieve_collections::ScratchRepresentation;
use tagsieve_index::QueryType;

mod commands;
mod corpus_source;

#[derive(Parser)]
#[command(name = "tagsieve-cmd")]
#[command(about = "Builds tag bitmap indexes and compiles exclusion bitmaps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the corpus comes from: a JSON file, or a seeded synthetic collection.
#[derive(Args, Clone, Debug)]
pub struct CorpusArgs {
    /// JSON corpus file: `{"documents": [{"id": 0, "tags": [..], "keys": {..}}]}`
    #[arg(long, conflicts_with_all = ["synthetic_docs", "synthetic_tags"])]
    corpus: Option<String>,

    /// Number of synthetic documents
    #[arg(long, default_value_t = 100_000)]
    synthetic_docs: u32,

    /// Number of distinct synthetic tags
    #[arg(long, default_value_t = 1_000)]
    synthetic_tags: usize,

    /// Seed of the synthetic corpus
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Scratch {
    HashSet,
    BitArray,
}

impl From<Scratch> for ScratchRepresentation {
    fn from(value: Scratch) -> Self {
        match value {
            Scratch::HashSet => ScratchRepresentation::HashSet,
            Scratch::BitArray => ScratchRepresentation::BitArray,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build presence bitmaps for the frequent tags and print a build summary
    Build {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// JSON options file (`{"build": {..}, "compile": {..}}`)
        #[arg(long)]
        options: Option<String>,

        /// Only index tags with more documents than this
        #[arg(long)]
        min_docs_per_tag: Option<u64>,

        /// Pad and shrink bitmaps on the calling thread
        #[arg(long)]
        sequential: bool,

        /// Number of indexed tags to list in the summary
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Compile the exclusion bitmap of a set of tags and print its statistics
    Exclude {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Tag to exclude (can be specified multiple times)
        #[arg(short, long, required = true)]
        tag: Vec<String>,

        /// Query type to compile for (defaults to all of them)
        #[arg(short, long)]
        query_type: Option<QueryType>,

        /// JSON options file (`{"build": {..}, "compile": {..}}`)
        #[arg(long)]
        options: Option<String>,

        /// Scratch set layout, overrides the options file
        #[arg(long)]
        scratch: Option<Scratch>,

        /// Compile this many times per query type and report the mean time
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Cross-check the result against the union of per-tag presence bitmaps
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            corpus,
            options,
            min_docs_per_tag,
            sequential,
            top,
        } => commands::build::run(corpus, options, min_docs_per_tag, sequential, top),
        Commands::Exclude {
            corpus,
            tag,
            query_type,
            options,
            scratch,
            repeat,
            verify,
        } => commands::exclude::run(corpus, tag, query_type, options, scratch, repeat, verify),
    }
}
