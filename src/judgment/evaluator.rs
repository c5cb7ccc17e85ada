use crate::model::{EvaluationBatch, JudgmentRecord, QueryScoreEntry};

/// Every query's precision mass is normalized against a notional top-10,
/// regardless of how many results were judged or found relevant.
pub const PRECISION_DEPTH: f64 = 10.0;

const REPORT_DECIMALS: i32 = 3;

pub fn average_precision<I>(judgments: I) -> f64
where
    I: IntoIterator<Item = bool>,
{
    let mut relevant_docs = 0_usize;
    let mut running_total = 0.0_f64;

    for (index, relevant) in judgments.into_iter().enumerate() {
        if relevant {
            relevant_docs += 1;
            running_total += relevant_docs as f64 / (index + 1) as f64;
        }
    }

    running_total / PRECISION_DEPTH
}

/// Rounds to three decimals, sending exact ties to the even digit. Ties are
/// judged on the exact binary value, so `0.0625` becomes `0.062`.
pub fn round_score(score: f64) -> f64 {
    if !score.is_finite() {
        return score;
    }

    let scale = 10_f64.powi(REPORT_DECIMALS);
    let scaled = score * scale;
    // The product's rounding error is exactly representable.
    let residual = score.mul_add(scale, -scaled);

    let rounded = if scaled - scaled.floor() != 0.5 {
        scaled.round()
    } else if residual > 0.0 {
        scaled.ceil()
    } else if residual < 0.0 {
        scaled.floor()
    } else {
        scaled.round_ties_even()
    };
    rounded / scale
}

/// Rounded per-query scores, in batch order.
pub fn evaluate(batch: &EvaluationBatch) -> Vec<f64> {
    batch
        .records()
        .iter()
        .map(|record| round_score(record_average_precision(record)))
        .collect()
}

fn record_average_precision(record: &JudgmentRecord) -> f64 {
    average_precision(record.relevance())
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryScore {
    pub query: String,
    pub judged: usize,
    pub relevant: usize,
    pub average_precision: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub queries: Vec<QueryScore>,
    pub mean_average_precision: Option<f64>,
}

impl EvaluationSummary {
    pub fn report_entries(&self) -> Vec<QueryScoreEntry> {
        self.queries
            .iter()
            .enumerate()
            .map(|(index, score)| QueryScoreEntry {
                position: index + 1,
                query: score.query.clone(),
                judged: score.judged,
                relevant: score.relevant,
                average_precision: round_score(score.average_precision),
            })
            .collect()
    }
}

/// Keeps full precision per query; the mean is taken before rounding.
pub fn summarize(batch: &EvaluationBatch) -> EvaluationSummary {
    let queries = batch
        .records()
        .iter()
        .map(|record| QueryScore {
            query: record.query().to_string(),
            judged: record.results().len(),
            relevant: record.relevant_count(),
            average_precision: record_average_precision(record),
        })
        .collect::<Vec<QueryScore>>();

    let mean_average_precision = if queries.is_empty() {
        None
    } else {
        let total = queries
            .iter()
            .map(|score| score.average_precision)
            .sum::<f64>();
        Some(round_score(total / queries.len() as f64))
    };

    EvaluationSummary {
        queries,
        mean_average_precision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateResult, JudgedResult};

    fn record(query: &str, judgments: &[bool]) -> JudgmentRecord {
        let results = judgments
            .iter()
            .map(|relevant| JudgedResult {
                candidate: CandidateResult::default(),
                relevant: *relevant,
            })
            .collect();
        JudgmentRecord::new(query, results)
    }

    #[test]
    fn empty_batch_yields_no_scores() {
        assert!(evaluate(&EvaluationBatch::default()).is_empty());
        let summary = summarize(&EvaluationBatch::default());
        assert!(summary.queries.is_empty());
        assert_eq!(summary.mean_average_precision, None);
    }

    #[test]
    fn record_without_results_scores_zero() {
        let batch = EvaluationBatch::new(vec![record("nothing", &[])]);
        assert_eq!(evaluate(&batch), vec![0.0]);
    }

    #[test]
    fn single_relevant_hit_is_divided_by_ten() {
        assert_eq!(average_precision([true]), 0.1);
        assert_eq!(round_score(average_precision([true])), 0.1);
    }

    #[test]
    fn mixed_judgments_follow_running_precision() {
        let score = average_precision([true, false, true]);
        assert!((score - (1.0 + 2.0 / 3.0) / 10.0).abs() < 1e-12);
        assert_eq!(round_score(score), 0.167);
    }

    #[test]
    fn no_relevant_results_score_zero() {
        assert_eq!(average_precision([false, false, false]), 0.0);
    }

    #[test]
    fn scores_keep_batch_order() {
        let batch = EvaluationBatch::new(vec![
            record("a", &[true, true, true]),
            record("b", &[false, false, false]),
        ]);
        assert_eq!(evaluate(&batch), vec![0.3, 0.0]);
    }

    #[test]
    fn ten_relevant_results_reach_one() {
        assert_eq!(round_score(average_precision([true; 10])), 1.0);
        // Anything shorter than the fixed depth stays below one.
        assert_eq!(round_score(average_precision([true; 5])), 0.5);
    }

    #[test]
    fn scoring_depends_on_rank_order() {
        let early = average_precision([true, false, false]);
        let late = average_precision([false, false, true]);
        assert_eq!(round_score(early), 0.1);
        assert_eq!(round_score(late), 0.033);
        assert!(early > late);
    }

    #[test]
    fn exact_ties_round_to_even_digit() {
        let mut judgments = [false; 16];
        judgments[1] = true;
        judgments[15] = true;
        let score = average_precision(judgments);
        assert_eq!(score, 0.0625);
        assert_eq!(round_score(score), 0.062);

        assert_eq!(round_score(0.3125), 0.312);
        assert_eq!(round_score(0.1875), 0.188);
        assert_eq!(round_score(-0.0625), -0.062);
    }

    #[test]
    fn near_ties_follow_the_binary_value() {
        // 0.0005 is stored slightly above the decimal value.
        assert_eq!(round_score(0.0005), 0.001);
        assert_eq!(round_score(0.16666666666666666), 0.167);
        assert!(round_score(f64::NAN).is_nan());
    }

    #[test]
    fn summary_averages_full_precision_scores() {
        let batch = EvaluationBatch::new(vec![
            record("fireball", &[true, false, true]),
            record("murloc", &[false, true]),
        ]);

        let summary = summarize(&batch);
        assert_eq!(evaluate(&batch), vec![0.167, 0.05]);
        assert_eq!(summary.queries[0].judged, 3);
        assert_eq!(summary.queries[0].relevant, 2);
        // (0.1666.. + 0.05) / 2 = 0.10833..
        assert_eq!(summary.mean_average_precision, Some(0.108));

        let entries = summary.report_entries();
        assert_eq!(entries[1].position, 2);
        assert_eq!(entries[1].query, "murloc");
        assert_eq!(entries[1].average_precision, 0.05);
    }
}
