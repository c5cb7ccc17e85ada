use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cards::CardIndex;
use crate::cli::SearchArgs;
use crate::judgment::SearchProvider;
use crate::model::CandidateResult;
use crate::util::default_db_path;

#[derive(Debug, Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    limit: usize,
    returned: usize,
    results: &'a [CandidateResult],
}

pub fn run(args: SearchArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let index = CardIndex::open(&db_path)?;

    let started = Instant::now();
    let results = index
        .search(&args.query_term, args.num_docs)
        .with_context(|| format!("search failed for query {:?}", args.query_term))?;
    info!(
        query = %args.query_term,
        limit = args.num_docs,
        returned = results.len(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "search completed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        write_json_response(&mut output, &args.query_term, args.num_docs, &results)?;
    } else {
        write_text_response(&mut output, &args.query_term, &results)?;
    }
    output.flush()?;

    Ok(())
}

fn write_json_response<W: Write>(
    output: &mut W,
    query_text: &str,
    limit: usize,
    results: &[CandidateResult],
) -> Result<()> {
    let response = SearchResponse {
        query: query_text,
        limit,
        returned: results.len(),
        results,
    };
    serde_json::to_writer_pretty(&mut *output, &response)
        .context("failed to serialize search json output")?;
    writeln!(output)?;
    Ok(())
}

fn write_text_response<W: Write>(
    output: &mut W,
    query_text: &str,
    results: &[CandidateResult],
) -> Result<()> {
    writeln!(output, "Query: \"{query_text}\"")?;
    if results.is_empty() {
        writeln!(output, "No results.")?;
    }

    for (index, card) in results.iter().enumerate() {
        let name = card.name.as_deref().unwrap_or("(unnamed)");
        let id = card
            .id
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        writeln!(output, "Result {}: {name}\tid={id}", index + 1)?;
        if let Some(body) = card.body.as_deref().filter(|body| !body.is_empty()) {
            writeln!(output, "\t{body}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CardId;

    fn results() -> Vec<CandidateResult> {
        vec![
            CandidateResult {
                name: Some("Fireball".to_string()),
                body: Some("Deal 6 damage.".to_string()),
                id: Some(CardId::from(315)),
                ..CandidateResult::default()
            },
            CandidateResult {
                name: Some("Wisp".to_string()),
                body: Some(String::new()),
                id: Some(CardId::from(179)),
                ..CandidateResult::default()
            },
        ]
    }

    #[test]
    fn text_response_lists_ranked_cards() {
        let mut buffer = Vec::new();
        write_text_response(&mut buffer, "damage", &results()).expect("text should render");

        let rendered = String::from_utf8(buffer).expect("output should be utf-8");
        assert_eq!(
            rendered,
            "Query: \"damage\"\nResult 1: Fireball\tid=315\n\tDeal 6 damage.\nResult 2: Wisp\tid=179\n"
        );
    }

    #[test]
    fn json_response_reports_counts() {
        let mut buffer = Vec::new();
        write_json_response(&mut buffer, "damage", 5, &results()).expect("json should render");

        let value: serde_json::Value =
            serde_json::from_slice(&buffer).expect("output should be json");
        assert_eq!(value["limit"], 5);
        assert_eq!(value["returned"], 2);
        assert_eq!(value["results"][0]["name"], "Fireball");
        assert_eq!(value["results"][1]["id"], 179);
    }

    #[test]
    fn text_response_notes_empty_results() {
        let mut buffer = Vec::new();
        write_text_response(&mut buffer, "", &[]).expect("text should render");
        assert_eq!(
            String::from_utf8(buffer).expect("output should be utf-8"),
            "Query: \"\"\nNo results.\n"
        );
    }
}
