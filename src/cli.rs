use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cardsearch",
    version,
    about = "Card search with relevance judgment collection and scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a card dump into the local card store and rebuild the index.
    Ingest(IngestArgs),
    /// Run a single ranked search against the card store.
    Search(SearchArgs),
    /// Interactively judge search results and save the judgments.
    Collect(CollectArgs),
    /// Score saved judgments with per-query average precision.
    Evaluate(EvaluateArgs),
    /// Summarize the card store and any saved judgments.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/cardsearch")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub cards_file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(long, default_value = ".cache/cardsearch")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub query_term: String,

    #[arg(long, default_value_t = 3)]
    pub num_docs: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    #[arg(long, default_value = ".cache/cardsearch")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    pub num_queries: usize,

    #[arg(long, default_value_t = 3)]
    pub num_docs: usize,

    #[arg(long)]
    pub output_file: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub flush_each_query: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long, default_value = ".cache/cardsearch")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub relevance_file: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/cardsearch")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub relevance_file: Option<PathBuf>,
}
