//! Relevance judgments: collecting them over ranked search results,
//! persisting them, and scoring them.

use std::io;

use crate::model::CandidateResult;

mod collector;
pub mod error;
mod evaluator;
mod store;

pub use collector::JudgmentCollector;
pub use error::ProviderError;
pub use evaluator::{EvaluationSummary, evaluate, summarize};
pub use store::JudgmentStore;

/// Ranked retrieval. Results come back highest-ranked first, at most `k`.
pub trait SearchProvider {
    fn search(&self, query: &str, k: usize) -> Result<Vec<CandidateResult>, ProviderError>;
}

/// Supplies the text of the next query to judge. Blocks until available.
pub trait QuerySource {
    fn next_query(&mut self) -> io::Result<String>;
}

/// Decides whether a single candidate is relevant. Blocks until decided.
pub trait Judge {
    fn ask_relevance(&mut self, candidate: &CandidateResult) -> io::Result<bool>;
}
