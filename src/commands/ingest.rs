use std::fs;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cards::{MarkupCleaner, count_rows, open_card_store, set_metadata, upsert_cards};
use crate::cli::IngestArgs;
use crate::model::{CardDump, VendorCard};
use crate::util::{default_db_path, ensure_directory, now_utc_string, sha256_file};

pub fn run(args: IngestArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }

    let raw = fs::read(&args.cards_file)
        .with_context(|| format!("failed to read {}", args.cards_file.display()))?;
    let cards = parse_card_dump(&raw)
        .with_context(|| format!("failed to parse {}", args.cards_file.display()))?;
    let source_sha256 = sha256_file(&args.cards_file)?;

    if cards.is_empty() {
        warn!(path = %args.cards_file.display(), "card dump contains no cards");
    }

    let cleaner = MarkupCleaner::new()?;
    let mut connection = open_card_store(&db_path)?;
    let stats = upsert_cards(&mut connection, &cards, &cleaner)?;

    set_metadata(&connection, "ingested_at", &now_utc_string())?;
    set_metadata(&connection, "source_path", &args.cards_file.display().to_string())?;
    set_metadata(&connection, "source_sha256", &source_sha256)?;

    let cards_total = count_rows(&connection, "SELECT COUNT(*) FROM cards")?;
    if stats.cards_without_text > 0 {
        warn!(
            cards_without_text = stats.cards_without_text,
            "some cards have no rules text; they are searchable by name only"
        );
    }
    info!(
        path = %db_path.display(),
        cards_upserted = stats.cards_upserted,
        cards_total,
        "ingest completed"
    );

    Ok(())
}

fn parse_card_dump(raw: &[u8]) -> Result<Vec<VendorCard>> {
    let dump: CardDump =
        serde_json::from_slice(raw).context("expected a card array or an object with `cards`")?;
    Ok(dump.into_cards())
}
