use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{info, warn};

use crate::cards::count_rows;
use crate::cli::StatusArgs;
use crate::judgment::{JudgmentStore, summarize};
use crate::util::{default_db_path, default_relevance_path};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    let relevance_path = args
        .relevance_file
        .clone()
        .unwrap_or_else(|| default_relevance_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if db_path.exists() {
        let connection = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        match count_rows(&connection, "SELECT COUNT(*) FROM cards") {
            Ok(cards_count) => info!(
                path = %db_path.display(),
                cards = cards_count,
                db_schema_version = %metadata_value(&connection, "db_schema_version").unwrap_or_default(),
                ingested_at = %metadata_value(&connection, "ingested_at").unwrap_or_default(),
                source_sha256 = %metadata_value(&connection, "source_sha256").unwrap_or_default(),
                "card store status"
            ),
            Err(err) => {
                warn!(path = %db_path.display(), error = %format!("{err:#}"), "card store unreadable");
            }
        }
    } else {
        warn!(path = %db_path.display(), "card store missing");
    }

    if relevance_path.exists() {
        match JudgmentStore::new(&relevance_path).load() {
            Ok(batch) => {
                let summary = summarize(&batch);
                info!(
                    path = %relevance_path.display(),
                    queries = batch.len(),
                    judged = batch.judged_count(),
                    mean_average_precision = summary.mean_average_precision.unwrap_or_default(),
                    "relevance judgments status"
                );
            }
            Err(err) => {
                warn!(path = %relevance_path.display(), error = %err, "relevance judgments unreadable");
            }
        }
    } else {
        warn!(path = %relevance_path.display(), "relevance judgments missing");
    }

    Ok(())
}

fn metadata_value(connection: &Connection, key: &str) -> Option<String> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .ok()
        .flatten()
}
