use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::VendorCard;

mod clean;
mod index;

pub use clean::MarkupCleaner;
pub use index::CardIndex;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertStats {
    pub cards_upserted: usize,
    pub cards_without_text: usize,
}

pub fn open_card_store(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open card store: {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cards (
              id INTEGER PRIMARY KEY,
              slug TEXT,
              name TEXT,
              body TEXT,
              flavor TEXT,
              image TEXT,
              class TEXT,
              spell_school TEXT,
              minion_type TEXT
            );
            ",
        )
        .context("failed to initialize card tables")?;

    connection
        .execute(
            "
            CREATE VIRTUAL TABLE IF NOT EXISTS cards_fts
            USING fts5(name, body, flavor, content='cards', content_rowid='id')
            ",
            [],
        )
        .context("failed to initialize FTS5 table cards_fts")?;

    set_metadata(connection, "db_schema_version", DB_SCHEMA_VERSION)?;
    Ok(())
}

pub fn set_metadata(connection: &Connection, key: &str, value: &str) -> Result<()> {
    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES(?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![key, value],
        )
        .with_context(|| format!("failed to write metadata key {key}"))?;
    Ok(())
}

/// Inserts or refreshes every card, then rebuilds the full-text index in
/// the same transaction.
pub fn upsert_cards(
    connection: &mut Connection,
    cards: &[VendorCard],
    cleaner: &MarkupCleaner,
) -> Result<UpsertStats> {
    let tx = connection.transaction()?;
    let mut stats = UpsertStats::default();

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO cards(id, slug, name, body, flavor, image, class, spell_school, minion_type)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
              slug=excluded.slug,
              name=excluded.name,
              body=excluded.body,
              flavor=excluded.flavor,
              image=excluded.image,
              class=excluded.class,
              spell_school=excluded.spell_school,
              minion_type=excluded.minion_type
            ",
        )?;

        for card in cards {
            let body = card.text.as_deref().map(|text| cleaner.clean(text));
            let flavor = card.flavor_text.as_deref().map(|text| cleaner.clean(text));
            if body.as_deref().is_none_or(str::is_empty) {
                stats.cards_without_text += 1;
            }

            statement
                .execute(params![
                    card.id,
                    card.slug,
                    card.name,
                    body,
                    flavor,
                    card.image,
                    card.class,
                    card.spell_school,
                    card.minion_type,
                ])
                .with_context(|| format!("failed to upsert card {}", card.id))?;
            stats.cards_upserted += 1;
        }
    }

    tx.execute("INSERT INTO cards_fts(cards_fts) VALUES('rebuild')", [])
        .context("failed to rebuild FTS index")?;
    tx.commit().context("failed to commit card upsert")?;

    Ok(stats)
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
pub(crate) fn seeded_connection(cards: &[VendorCard]) -> Connection {
    let mut connection = Connection::open_in_memory().expect("in-memory DB should open");
    ensure_schema(&connection).expect("schema should initialize");
    let cleaner = MarkupCleaner::new().expect("cleaner should compile");
    upsert_cards(&mut connection, cards, &cleaner).expect("cards should insert");
    connection
}

#[cfg(test)]
pub(crate) fn vendor_card(id: i64, name: &str, text: &str) -> VendorCard {
    VendorCard {
        id,
        slug: Some(format!("{id}-{}", name.to_lowercase().replace(' ', "-"))),
        name: Some(name.to_string()),
        text: Some(text.to_string()),
        flavor_text: None,
        image: Some(format!("https://img.example/cards/{id}.png")),
        class: None,
        spell_school: None,
        minion_type: None,
    }
}
