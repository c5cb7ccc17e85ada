use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cards::CardIndex;
use crate::cli::CollectArgs;
use crate::judgment::{Judge, JudgmentCollector, JudgmentStore, QuerySource, SearchProvider};
use crate::model::{CandidateResult, EvaluationBatch};
use crate::util::{default_db_path, default_relevance_path};

const QUERY_PROMPT: &str = "Enter query term: ";
const RELEVANCE_PROMPT: &str = "Is this document relevant? (y/N) ";

pub fn run(args: CollectArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let output_path = args
        .output_file
        .clone()
        .unwrap_or_else(|| default_relevance_path(&args.cache_root));

    let index = CardIndex::open(&db_path)?;
    info!(
        db_path = %db_path.display(),
        cards = index.card_count()?,
        num_queries = args.num_queries,
        num_docs = args.num_docs,
        "starting judgment collection"
    );

    let store = JudgmentStore::new(&output_path);
    let terminal = RefCell::new(Terminal::new(io::stdin().lock(), io::stdout()));
    let batch = collect_into_store(
        &index,
        &terminal,
        &store,
        args.num_queries,
        args.num_docs,
        args.flush_each_query,
    )?;

    info!(
        path = %output_path.display(),
        queries = batch.len(),
        judged = batch.judged_count(),
        "saved relevance judgments"
    );
    Ok(())
}

/// Without `flush_each_query` nothing is written unless every query
/// completes.
fn collect_into_store<P, R, W>(
    provider: &P,
    terminal: &RefCell<Terminal<R, W>>,
    store: &JudgmentStore,
    num_queries: usize,
    num_docs: usize,
    flush_each_query: bool,
) -> Result<EvaluationBatch>
where
    P: SearchProvider + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut collector =
        JudgmentCollector::new(provider, TerminalQueries(terminal), TerminalJudge(terminal));

    let batch = if flush_each_query {
        collector
            .run_with_checkpoint(num_queries, num_docs, |batch| store.save(batch))
            .context("judgment collection aborted")?
    } else {
        let batch = collector
            .run(num_queries, num_docs)
            .context("judgment collection aborted")?;
        store
            .save(&batch)
            .with_context(|| format!("failed to save {}", store.path().display()))?;
        batch
    };

    Ok(batch)
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, text: &str) -> io::Result<String> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before a response was entered",
            ));
        }
        writeln!(self.output)?;
        Ok(line)
    }

    fn show_candidate(&mut self, candidate: &CandidateResult) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.output, candidate)?;
        writeln!(self.output)?;
        writeln!(self.output)?;
        Ok(())
    }
}

pub struct TerminalQueries<'t, R, W>(&'t RefCell<Terminal<R, W>>);

impl<R: BufRead, W: Write> QuerySource for TerminalQueries<'_, R, W> {
    fn next_query(&mut self) -> io::Result<String> {
        let line = self.0.borrow_mut().prompt(QUERY_PROMPT)?;
        Ok(normalize_query(&line))
    }
}

pub struct TerminalJudge<'t, R, W>(&'t RefCell<Terminal<R, W>>);

impl<R: BufRead, W: Write> Judge for TerminalJudge<'_, R, W> {
    fn ask_relevance(&mut self, candidate: &CandidateResult) -> io::Result<bool> {
        let mut terminal = self.0.borrow_mut();
        terminal.show_candidate(candidate)?;
        let line = terminal.prompt(RELEVANCE_PROMPT)?;
        Ok(is_affirmative(&line))
    }
}

fn normalize_query(line: &str) -> String {
    line.trim().to_lowercase()
}

/// Only an explicit `y` counts; anything else, including a blank line, is
/// "not relevant".
fn is_affirmative(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("y")
}
