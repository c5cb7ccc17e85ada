use tracing::{debug, info, warn};

use super::error::{CollectError, StoreError};
use super::{Judge, QuerySource, SearchProvider};
use crate::model::{CandidateResult, EvaluationBatch, JudgedResult, JudgmentRecord};

/// A record still being judged. Results can only be appended, in rank
/// order, until [`OpenRecord::seal`] hands back the immutable record.
#[derive(Debug)]
struct OpenRecord {
    query: String,
    results: Vec<JudgedResult>,
}

impl OpenRecord {
    fn new(query: String, capacity: usize) -> Self {
        Self {
            query,
            results: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, candidate: CandidateResult, relevant: bool) {
        self.results.push(JudgedResult {
            candidate,
            relevant,
        });
    }

    fn seal(self) -> JudgmentRecord {
        JudgmentRecord::new(self.query, self.results)
    }
}

pub struct JudgmentCollector<'a, P: ?Sized, Q, J> {
    provider: &'a P,
    queries: Q,
    judge: J,
}

impl<'a, P, Q, J> JudgmentCollector<'a, P, Q, J>
where
    P: SearchProvider + ?Sized,
    Q: QuerySource,
    J: Judge,
{
    pub fn new(provider: &'a P, queries: Q, judge: J) -> Self {
        Self {
            provider,
            queries,
            judge,
        }
    }

    pub fn run(
        &mut self,
        query_count: usize,
        results_per_query: usize,
    ) -> Result<EvaluationBatch, CollectError> {
        self.run_with_checkpoint(query_count, results_per_query, |_| Ok(()))
    }

    /// Like [`run`](Self::run), but hands the batch-so-far to `on_sealed`
    /// after every sealed record. A checkpoint failure aborts the run.
    pub fn run_with_checkpoint<F>(
        &mut self,
        query_count: usize,
        results_per_query: usize,
        mut on_sealed: F,
    ) -> Result<EvaluationBatch, CollectError>
    where
        F: FnMut(&EvaluationBatch) -> Result<(), StoreError>,
    {
        let mut batch = EvaluationBatch::default();

        for query_index in 0..query_count {
            let query = self
                .queries
                .next_query()
                .map_err(|source| CollectError::Input {
                    what: "query text",
                    source,
                })?;

            let candidates = match self.provider.search(&query, results_per_query) {
                Ok(candidates) => candidates,
                Err(err) => {
                    warn!(query = %query, error = %err, "search provider failed; aborting collection");
                    return Err(err.into());
                }
            };
            debug!(
                query = %query,
                requested = results_per_query,
                returned = candidates.len(),
                "retrieved candidates"
            );

            let mut record = OpenRecord::new(query, candidates.len());
            for candidate in candidates {
                let relevant =
                    self.judge
                        .ask_relevance(&candidate)
                        .map_err(|source| CollectError::Input {
                            what: "relevance judgment",
                            source,
                        })?;
                record.push(candidate, relevant);
            }

            let record = record.seal();
            info!(
                position = query_index + 1,
                query = %record.query(),
                judged = record.results().len(),
                relevant = record.relevant_count(),
                "sealed judgment record"
            );
            batch.push(record);
            on_sealed(&batch)?;
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    use super::*;
    use crate::judgment::error::ProviderError;
    use crate::model::CardId;

    struct FixedProvider {
        cards: Vec<&'static str>,
        calls: RefCell<Vec<(String, usize)>>,
        fail_on: Option<&'static str>,
    }

    impl FixedProvider {
        fn new(cards: Vec<&'static str>) -> Self {
            Self {
                cards,
                calls: RefCell::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    impl SearchProvider for FixedProvider {
        fn search(&self, query: &str, k: usize) -> Result<Vec<CandidateResult>, ProviderError> {
            self.calls.borrow_mut().push((query.to_string(), k));
            if self.fail_on == Some(query) {
                return Err(ProviderError::Index(rusqlite::Error::InvalidQuery));
            }
            Ok(self
                .cards
                .iter()
                .take(k)
                .enumerate()
                .map(|(index, name)| CandidateResult {
                    name: Some((*name).to_string()),
                    id: Some(CardId::from(index as i64 + 1)),
                    ..CandidateResult::default()
                })
                .collect())
        }
    }

    struct ScriptedQueries(VecDeque<&'static str>);

    impl QuerySource for ScriptedQueries {
        fn next_query(&mut self) -> io::Result<String> {
            self.0
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more queries"))
        }
    }

    #[derive(Default)]
    struct ScriptedJudge {
        answers: VecDeque<bool>,
        seen: Vec<String>,
    }

    impl ScriptedJudge {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                seen: Vec::new(),
            }
        }
    }

    impl Judge for &mut ScriptedJudge {
        fn ask_relevance(&mut self, candidate: &CandidateResult) -> io::Result<bool> {
            self.seen.push(candidate.name.clone().unwrap_or_default());
            self.answers
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "judge ran out"))
        }
    }

    fn queries(items: &[&'static str]) -> ScriptedQueries {
        ScriptedQueries(items.iter().copied().collect())
    }

    #[test]
    fn collects_one_judgment_per_candidate_in_rank_order() {
        let provider = FixedProvider::new(vec!["Fireball", "Frostbolt", "Flamestrike"]);
        let mut judge = ScriptedJudge::new(&[true, false, true, false, false, true]);

        let batch = JudgmentCollector::new(&provider, queries(&["fire", "frost"]), &mut judge)
            .run(2, 3)
            .expect("collection should succeed");

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records()[0].query(), "fire");
        assert_eq!(
            batch.records()[0].relevance().collect::<Vec<_>>(),
            vec![true, false, true]
        );
        assert_eq!(
            batch.records()[1].relevance().collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert_eq!(
            judge.seen,
            vec!["Fireball", "Frostbolt", "Flamestrike", "Fireball", "Frostbolt", "Flamestrike"]
        );
        assert_eq!(
            *provider.calls.borrow(),
            vec![("fire".to_string(), 3), ("frost".to_string(), 3)]
        );
    }

    #[test]
    fn short_candidate_lists_produce_short_records() {
        let provider = FixedProvider::new(vec!["Wisp", "Mana Wyrm"]);
        let mut judge = ScriptedJudge::new(&[true, true]);

        let batch = JudgmentCollector::new(&provider, queries(&["cheap"]), &mut judge)
            .run(1, 5)
            .expect("collection should succeed");

        assert_eq!(batch.records()[0].results().len(), 2);
        assert!(judge.answers.is_empty());
    }

    #[test]
    fn empty_query_with_no_candidates_yields_empty_record() {
        let provider = FixedProvider::new(Vec::new());
        let mut judge = ScriptedJudge::default();

        let batch = JudgmentCollector::new(&provider, queries(&[""]), &mut judge)
            .run(1, 3)
            .expect("empty query should not fail");

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records()[0].query(), "");
        assert!(batch.records()[0].results().is_empty());
        assert!(judge.seen.is_empty());
    }

    #[test]
    fn zero_queries_yield_empty_batch_without_prompting() {
        let provider = FixedProvider::new(vec!["Wisp"]);
        let mut judge = ScriptedJudge::default();

        let batch = JudgmentCollector::new(&provider, queries(&[]), &mut judge)
            .run(0, 3)
            .expect("zero queries should succeed");

        assert!(batch.is_empty());
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn provider_failure_aborts_the_run() {
        let mut provider = FixedProvider::new(vec!["Wisp"]);
        provider.fail_on = Some("second");
        let mut judge = ScriptedJudge::new(&[true, true]);
        let mut checkpoints = 0;

        let error = JudgmentCollector::new(&provider, queries(&["first", "second", "third"]), &mut judge)
            .run_with_checkpoint(3, 1, |_| {
                checkpoints += 1;
                Ok(())
            })
            .expect_err("provider failure should abort");

        assert!(
            matches!(error, CollectError::Provider(ProviderError::Index(_))),
            "unexpected error: {error:?}"
        );
        assert_eq!(checkpoints, 1, "only the first record should have been sealed");
        assert_eq!(provider.calls.borrow().len(), 2, "third query must not run");
    }

    #[test]
    fn judge_input_failure_is_reported() {
        let provider = FixedProvider::new(vec!["Wisp", "Abusive Sergeant"]);
        let mut judge = ScriptedJudge::new(&[true]);

        let error = JudgmentCollector::new(&provider, queries(&["one drop"]), &mut judge)
            .run(1, 2)
            .expect_err("exhausted judge should fail");

        assert!(
            matches!(error, CollectError::Input { what: "relevance judgment", .. }),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn checkpoint_sees_each_sealed_prefix() {
        let provider = FixedProvider::new(vec!["Wisp"]);
        let mut judge = ScriptedJudge::new(&[true, false, true]);
        let mut sizes = Vec::new();

        JudgmentCollector::new(&provider, queries(&["a", "b", "c"]), &mut judge)
            .run_with_checkpoint(3, 1, |batch| {
                sizes.push(batch.len());
                Ok(())
            })
            .expect("collection should succeed");

        assert_eq!(sizes, vec![1, 2, 3]);
    }

    #[test]
    fn checkpoint_failure_stops_collection() {
        let provider = FixedProvider::new(vec!["Wisp"]);
        let mut judge = ScriptedJudge::new(&[true, true]);

        let error = JudgmentCollector::new(&provider, queries(&["a", "b"]), &mut judge)
            .run_with_checkpoint(2, 1, |_| {
                Err(StoreError::Write {
                    path: PathBuf::from("/unwritable/relevance.json"),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
                })
            })
            .expect_err("checkpoint failure should abort");

        assert!(matches!(error, CollectError::Checkpoint(_)), "unexpected error: {error:?}");
        assert_eq!(judge.answers.len(), 1, "second query must not be judged");
    }
}
