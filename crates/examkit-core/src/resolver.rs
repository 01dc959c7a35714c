//! Quota resolution: pick a student's questions from the per-difficulty
//! pools.
//!
//! Resolution is all-or-nothing per student: availability is checked for
//! every level before anything is shuffled, so a shortfall at one level
//! discards no partial selection and persists nothing.

use crate::error::AllocationError;
use crate::model::{Difficulty, Question, QuotaRequest};
use crate::seed::bucket_seed;
use crate::shuffle::shuffle;
use crate::traits::QuestionRepository;

/// A teacher's question pool, partitioned by difficulty.
#[derive(Debug, Clone, Default)]
pub struct DifficultyPools {
    easy: Vec<Question>,
    medium: Vec<Question>,
    hard: Vec<Question>,
}

impl DifficultyPools {
    /// Materialize the three pools for a teacher from the repository.
    pub async fn fetch(
        repo: &dyn QuestionRepository,
        teacher_id: &str,
    ) -> Result<Self, AllocationError> {
        Ok(Self {
            easy: repo
                .find_by_teacher_and_difficulty(teacher_id, Difficulty::Easy)
                .await?,
            medium: repo
                .find_by_teacher_and_difficulty(teacher_id, Difficulty::Medium)
                .await?,
            hard: repo
                .find_by_teacher_and_difficulty(teacher_id, Difficulty::Hard)
                .await?,
        })
    }

    /// Partition an already-loaded question list (bank files, tests).
    pub fn partition(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut pools = Self::default();
        for question in questions {
            match question.difficulty {
                Difficulty::Easy => pools.easy.push(question),
                Difficulty::Medium => pools.medium.push(question),
                Difficulty::Hard => pools.hard.push(question),
            }
        }
        pools
    }

    /// The pool for one level, in repository order.
    pub fn pool(&self, level: Difficulty) -> &[Question] {
        match level {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

/// Select questions satisfying `quota` from `pools`, shuffled by
/// per-bucket seeds derived from `seed`.
///
/// The returned selection has exactly `quota.total()` questions ordered
/// easy → medium → hard, with no duplicate ids. The pools are never
/// mutated.
pub fn resolve_for_student(
    pools: &DifficultyPools,
    quota: &QuotaRequest,
    seed: &str,
) -> Result<Vec<Question>, AllocationError> {
    // Check every level up front so failure is atomic.
    for level in Difficulty::ALL {
        let required = quota.count_for(level);
        let available = pools.pool(level).len() as u32;
        if available < required {
            return Err(AllocationError::InsufficientPool {
                level,
                required,
                available,
            });
        }
    }

    let mut selected = Vec::with_capacity(quota.total() as usize);
    for level in Difficulty::ALL {
        let take = quota.count_for(level) as usize;
        if take == 0 {
            continue;
        }
        let shuffled = shuffle(pools.pool(level), &bucket_seed(seed, level));
        selected.extend(shuffled.into_iter().take(take));
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pools_with_counts, question};

    #[test]
    fn selection_satisfies_quota() {
        let pools = pools_with_counts(5, 5, 5);
        let quota = QuotaRequest::new(2, 1, 1);

        let selected = resolve_for_student(&pools, &quota, "42-s-1").unwrap();
        assert_eq!(selected.len(), 4);
        assert_eq!(
            selected
                .iter()
                .filter(|q| q.difficulty == Difficulty::Easy)
                .count(),
            2
        );
        assert_eq!(
            selected
                .iter()
                .filter(|q| q.difficulty == Difficulty::Medium)
                .count(),
            1
        );
        assert_eq!(
            selected
                .iter()
                .filter(|q| q.difficulty == Difficulty::Hard)
                .count(),
            1
        );
    }

    #[test]
    fn no_duplicate_ids() {
        let pools = pools_with_counts(5, 5, 5);
        let quota = QuotaRequest::new(4, 4, 4);

        let selected = resolve_for_student(&pools, &quota, "42-s-1").unwrap();
        let mut ids: Vec<&str> = selected.iter().map(|q| q.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn ordered_easy_medium_hard() {
        let pools = pools_with_counts(3, 3, 3);
        let quota = QuotaRequest::new(2, 2, 2);

        let selected = resolve_for_student(&pools, &quota, "42-s-1").unwrap();
        let difficulties: Vec<Difficulty> = selected.iter().map(|q| q.difficulty).collect();
        assert_eq!(
            difficulties,
            vec![
                Difficulty::Easy,
                Difficulty::Easy,
                Difficulty::Medium,
                Difficulty::Medium,
                Difficulty::Hard,
                Difficulty::Hard,
            ]
        );
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let pools = pools_with_counts(8, 8, 8);
        let quota = QuotaRequest::new(3, 2, 1);

        let first = resolve_for_student(&pools, &quota, "1700000000000-s-1").unwrap();
        let second = resolve_for_student(&pools, &quota, "1700000000000-s-1").unwrap();
        let first_ids: Vec<&str> = first.iter().map(|q| q.id.as_str()).collect();
        let second_ids: Vec<&str> = second.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn shortfall_fails_with_exact_fields() {
        let pools = pools_with_counts(5, 5, 2);
        let quota = QuotaRequest::new(1, 1, 3);

        let err = resolve_for_student(&pools, &quota, "42-s-1").unwrap_err();
        match err {
            AllocationError::InsufficientPool {
                level,
                required,
                available,
            } => {
                assert_eq!(level, Difficulty::Hard);
                assert_eq!(required, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientPool, got {other:?}"),
        }
    }

    #[test]
    fn shortfall_is_atomic() {
        // Enough easy questions alone must not produce a partial result.
        let pools = pools_with_counts(5, 0, 0);
        let quota = QuotaRequest::new(2, 1, 0);

        assert!(resolve_for_student(&pools, &quota, "42-s-1").is_err());
    }

    #[test]
    fn zero_quota_selects_nothing() {
        let pools = pools_with_counts(3, 3, 3);
        let quota = QuotaRequest::new(0, 0, 0);

        let selected = resolve_for_student(&pools, &quota, "42-s-1").unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn partition_groups_by_difficulty() {
        let pools = DifficultyPools::partition(vec![
            question("q1", "t-1", Difficulty::Hard),
            question("q2", "t-1", Difficulty::Easy),
            question("q3", "t-1", Difficulty::Hard),
        ]);
        assert_eq!(pools.pool(Difficulty::Easy).len(), 1);
        assert_eq!(pools.pool(Difficulty::Medium).len(), 0);
        assert_eq!(pools.pool(Difficulty::Hard).len(), 2);
    }
}
