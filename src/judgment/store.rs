use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::error::{FormatError, StoreError, json_kind};
use crate::model::{CandidateResult, CardId, EvaluationBatch, JudgedResult, JudgmentRecord};
use crate::util::persist_atomically;

/// Whole-document JSON persistence for an [`EvaluationBatch`].
#[derive(Debug, Clone)]
pub struct JudgmentStore {
    path: PathBuf,
}

impl JudgmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, batch: &EvaluationBatch) -> Result<(), StoreError> {
        let data = encode_batch(batch).map_err(StoreError::Serialize)?;
        persist_atomically(&self.path, &data).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            path = %self.path.display(),
            records = batch.len(),
            judged = batch.judged_count(),
            "saved judgment batch"
        );
        Ok(())
    }

    pub fn load(&self) -> Result<EvaluationBatch, StoreError> {
        let raw = fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        decode_batch(&raw).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }
}

pub fn encode_batch(batch: &EvaluationBatch) -> Result<Vec<u8>, serde_json::Error> {
    let mut data = serde_json::to_vec_pretty(batch)?;
    data.push(b'\n');
    Ok(data)
}

/// Validates the full document before returning any record.
pub fn decode_batch(raw: &[u8]) -> Result<EvaluationBatch, FormatError> {
    let document: Value = serde_json::from_slice(raw).map_err(FormatError::Syntax)?;
    let entries = match document {
        Value::Array(entries) => entries,
        other => {
            return Err(FormatError::NotAnArray {
                found: json_kind(&other),
            });
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        records.push(decode_record(index + 1, entry)?);
    }

    Ok(EvaluationBatch::new(records))
}

fn decode_record(record: usize, entry: Value) -> Result<JudgmentRecord, FormatError> {
    let mut fields = match entry {
        Value::Object(fields) => fields,
        other => {
            return Err(FormatError::RecordNotObject {
                record,
                found: json_kind(&other),
            });
        }
    };

    let query = match fields.remove("query") {
        None => String::new(),
        Some(Value::String(query)) => query,
        Some(other) => {
            return Err(FormatError::QueryNotString {
                record,
                found: json_kind(&other),
            });
        }
    };

    let Some(Value::Array(items)) = fields.remove("results") else {
        return Err(FormatError::MissingResults { record });
    };

    let mut results = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        results.push(decode_result(record, index + 1, item)?);
    }

    Ok(JudgmentRecord::new(query, results))
}

fn decode_result(record: usize, rank: usize, item: Value) -> Result<JudgedResult, FormatError> {
    let mut fields = match item {
        Value::Object(fields) => fields,
        other => {
            return Err(FormatError::ResultNotObject {
                record,
                rank,
                found: json_kind(&other),
            });
        }
    };

    let relevant = match fields.get("relevant") {
        Some(Value::Bool(relevant)) => *relevant,
        _ => return Err(FormatError::MissingRelevant { record, rank }),
    };

    let candidate = CandidateResult {
        name: display_text(fields.remove("name")),
        body: display_text(fields.remove("body")),
        id: display_id(fields.remove("id")),
        slug: display_text(fields.remove("slug")),
        image: display_text(fields.remove("image")),
    };

    Ok(JudgedResult {
        candidate,
        relevant,
    })
}

/// Display fields never affect scoring. Values of an unexpected JSON type
/// are kept as their JSON text.
fn display_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn display_id(value: Option<Value>) -> Option<CardId> {
    match value? {
        Value::Null => None,
        Value::Number(number) => Some(CardId::Number(number)),
        Value::String(text) => Some(CardId::Text(text)),
        other => Some(CardId::Text(other.to_string())),
    }
}
