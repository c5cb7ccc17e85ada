use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, params};
use tracing::debug;

use crate::judgment::{ProviderError, SearchProvider};
use crate::model::{CandidateResult, CardId};

/// BM25-ranked card search over the store's FTS5 index.
///
/// Constructed once per process and passed by reference to whatever needs
/// to search; it holds the only connection.
pub struct CardIndex {
    connection: Connection,
}

impl CardIndex {
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            bail!(
                "card store not found at {}; run `cardsearch ingest` first",
                db_path.display()
            );
        }

        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open card store read-only: {}", db_path.display()))?;

        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    pub fn card_count(&self) -> Result<i64, ProviderError> {
        let count = self
            .connection
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl SearchProvider for CardIndex {
    fn search(&self, query: &str, k: usize) -> Result<Vec<CandidateResult>, ProviderError> {
        let fts_query = to_fts_query(query);
        if fts_query.is_empty() || k == 0 {
            debug!(query = %query, "no searchable terms; returning no candidates");
            return Ok(Vec::new());
        }

        let mut statement = self.connection.prepare_cached(
            "
            SELECT c.id, c.name, c.body, c.slug, c.image
            FROM cards_fts
            JOIN cards c ON c.id = cards_fts.rowid
            WHERE cards_fts MATCH ?1
            ORDER BY bm25(cards_fts) ASC, c.id ASC
            LIMIT ?2
            ",
        )?;

        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let mut rows = statement.query(params![fts_query, limit])?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            out.push(CandidateResult {
                id: Some(CardId::from(row.get::<_, i64>(0)?)),
                name: row.get(1)?,
                body: row.get(2)?,
                slug: row.get(3)?,
                image: row.get(4)?,
            });
        }

        Ok(out)
    }
}

/// Quotes each whitespace-separated token so user input can't be parsed as
/// FTS5 query syntax.
pub fn to_fts_query(query_text: &str) -> String {
    query_text
        .split_whitespace()
        .map(|token| token.replace('"', ""))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\""))
        .collect::<Vec<String>>()
        .join(" ")
}
