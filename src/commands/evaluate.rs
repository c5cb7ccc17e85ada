use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::judgment::{EvaluationSummary, JudgmentStore, evaluate, summarize};
use crate::model::{EvaluationBatch, EvaluationReport};
use crate::util::{default_relevance_path, now_utc_string, sha256_file, write_json_pretty};

const REPORT_VERSION: u32 = 1;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let relevance_path = args
        .relevance_file
        .clone()
        .unwrap_or_else(|| default_relevance_path(&args.cache_root));

    let store = JudgmentStore::new(&relevance_path);
    let batch = store.load().context("failed to load relevance judgments")?;
    let scores = evaluate(&batch);
    let summary = summarize(&batch);

    if batch.is_empty() {
        warn!(path = %relevance_path.display(), "judgment file holds no records");
    }

    info!(
        path = %relevance_path.display(),
        queries = batch.len(),
        judged = batch.judged_count(),
        mean_average_precision = summary.mean_average_precision.unwrap_or_default(),
        "evaluation completed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{}", format_scores(&scores))?;
    output.flush()?;

    if let Some(report_path) = &args.report_path {
        let report = build_report(&relevance_path, &batch, &summary, scores)?;
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote evaluation report");
    }

    Ok(())
}

/// Renders scores as a bracketed list, e.g. `[0.3, 0.0]`.
fn format_scores(scores: &[f64]) -> String {
    format!("{scores:?}")
}

fn build_report(
    relevance_path: &Path,
    batch: &EvaluationBatch,
    summary: &EvaluationSummary,
    scores: Vec<f64>,
) -> Result<EvaluationReport> {
    let source_sha256 = sha256_file(relevance_path)
        .with_context(|| format!("failed to fingerprint {}", relevance_path.display()))?;

    Ok(EvaluationReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        source_path: relevance_path.display().to_string(),
        source_sha256,
        query_count: batch.len(),
        judged_count: batch.judged_count(),
        mean_average_precision: summary.mean_average_precision,
        scores,
        queries: summary.report_entries(),
    })
}
