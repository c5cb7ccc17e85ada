use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardId {
    Number(serde_json::Number),
    Text(String),
}

impl From<i64> for CardId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One ranked hit as returned by a search provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateResult {
    pub name: Option<String>,
    pub body: Option<String>,
    pub id: Option<CardId>,
    pub slug: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedResult {
    #[serde(flatten)]
    pub candidate: CandidateResult,
    pub relevant: bool,
}

/// A sealed query session: the query text and its judged results in rank
/// order. Position `i` in `results` is rank `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentRecord {
    query: String,
    results: Vec<JudgedResult>,
}

impl JudgmentRecord {
    pub fn new(query: impl Into<String>, results: Vec<JudgedResult>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[JudgedResult] {
        &self.results
    }

    pub fn relevance(&self) -> impl Iterator<Item = bool> + '_ {
        self.results.iter().map(|result| result.relevant)
    }

    pub fn relevant_count(&self) -> usize {
        self.relevance().filter(|relevant| *relevant).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationBatch {
    records: Vec<JudgmentRecord>,
}

impl EvaluationBatch {
    pub fn new(records: Vec<JudgmentRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[JudgmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn judged_count(&self) -> usize {
        self.records.iter().map(|record| record.results().len()).sum()
    }

    pub(crate) fn push(&mut self, record: JudgmentRecord) {
        self.records.push(record);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCard {
    pub id: i64,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub flavor_text: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub spell_school: Option<String>,
    #[serde(default)]
    pub minion_type: Option<String>,
}

/// Card dumps are either a bare array or a single API page object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CardDump {
    List(Vec<VendorCard>),
    Page { cards: Vec<VendorCard> },
}

impl CardDump {
    pub fn into_cards(self) -> Vec<VendorCard> {
        match self {
            Self::List(cards) | Self::Page { cards } => cards,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryScoreEntry {
    pub position: usize,
    pub query: String,
    pub judged: usize,
    pub relevant: usize,
    pub average_precision: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub report_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub query_count: usize,
    pub judged_count: usize,
    pub mean_average_precision: Option<f64>,
    pub scores: Vec<f64>,
    pub queries: Vec<QueryScoreEntry>,
}
