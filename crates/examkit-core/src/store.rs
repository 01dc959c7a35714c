//! Idempotent per-student allocation storage.
//!
//! `get_or_create` is the engine's only write path: an existing
//! allocation is always returned unchanged, and first-time creation is
//! serialized per (assignment, student) pair so two concurrent requests
//! (e.g. a preview and an email-all batch) cannot both resolve and store
//! different selections for the same student.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::AllocationError;
use crate::model::Allocation;
use crate::resolver::{resolve_for_student, DifficultyPools};
use crate::seed::derive_seed;
use crate::traits::{AssignmentStore, InsertOutcome, QuestionRepository};

/// Where the coarse timestamp in seed strings comes from.
///
/// The clock is read at most once per creation, here and nowhere deeper:
/// the resolver and shuffle receive the finished seed as a parameter.
#[derive(Debug, Clone, Copy)]
pub enum SeedBase {
    /// Capture the current time when an allocation is first created.
    WallClock,
    /// Use a fixed base (tests, reproducible re-runs).
    Fixed(i64),
}

/// An allocation plus whether this call created it.
#[derive(Debug, Clone)]
pub struct GetOrCreate {
    pub allocation: Allocation,
    pub newly_created: bool,
}

type KeyLocks = Mutex<HashMap<(String, String), Arc<Mutex<()>>>>;

/// The idempotency guard in front of assignment persistence.
pub struct AllocationStore {
    assignments: Arc<dyn AssignmentStore>,
    locks: KeyLocks,
    seed_base: SeedBase,
}

impl AllocationStore {
    pub fn new(assignments: Arc<dyn AssignmentStore>) -> Self {
        Self {
            assignments,
            locks: Mutex::new(HashMap::new()),
            seed_base: SeedBase::WallClock,
        }
    }

    /// Pin the seed base, making first-time allocations reproducible.
    pub fn with_seed_base(mut self, base: i64) -> Self {
        self.seed_base = SeedBase::Fixed(base);
        self
    }

    pub fn assignments(&self) -> &Arc<dyn AssignmentStore> {
        &self.assignments
    }

    /// Return the stored allocation for `(assignment_id, student_id)`,
    /// creating it first if none exists.
    ///
    /// On the fast path the quota resolver is not invoked and no new
    /// seed is derived. Creation acquires a per-pair lock before the
    /// re-check, and the storage-level atomic insert backstops writers
    /// this process cannot see.
    pub async fn get_or_create(
        &self,
        assignment_id: &str,
        student_id: &str,
        repo: &dyn QuestionRepository,
    ) -> Result<GetOrCreate, AllocationError> {
        let assignment = self.assignments.load(assignment_id).await?;
        if let Some(existing) = assignment.allocation_for(student_id) {
            return Ok(GetOrCreate {
                allocation: existing.clone(),
                newly_created: false,
            });
        }

        let key_lock = self.key_lock(assignment_id, student_id).await;
        let result = {
            let _guard = key_lock.lock().await;
            self.create_under_lock(assignment_id, student_id, repo).await
        };
        self.discard_lock(assignment_id, student_id).await;
        result
    }

    async fn create_under_lock(
        &self,
        assignment_id: &str,
        student_id: &str,
        repo: &dyn QuestionRepository,
    ) -> Result<GetOrCreate, AllocationError> {
        // Re-check under the lock: another caller may have resolved this
        // pair while we waited.
        let assignment = self.assignments.load(assignment_id).await?;
        if let Some(existing) = assignment.allocation_for(student_id) {
            tracing::debug!(student_id, "allocation already stored, returning it");
            return Ok(GetOrCreate {
                allocation: existing.clone(),
                newly_created: false,
            });
        }

        let base = match self.seed_base {
            SeedBase::Fixed(base) => base,
            SeedBase::WallClock => Utc::now().timestamp_millis(),
        };
        let seed = derive_seed(base, student_id);

        let pools = DifficultyPools::fetch(repo, &assignment.teacher_id).await?;
        let questions = resolve_for_student(&pools, &assignment.quota, &seed)?;
        let allocation = Allocation {
            question_ids: questions.into_iter().map(|q| q.id).collect(),
            seed,
            created_at: Utc::now(),
        };

        match self
            .assignments
            .insert_allocation_if_absent(assignment_id, student_id, allocation.clone())
            .await
        {
            Ok(InsertOutcome::Inserted) => {
                tracing::debug!(
                    student_id,
                    questions = allocation.question_ids.len(),
                    "allocation created"
                );
                Ok(GetOrCreate {
                    allocation,
                    newly_created: true,
                })
            }
            Ok(InsertOutcome::AlreadyPresent(existing)) => {
                tracing::debug!(student_id, "lost insert race, returning stored selection");
                Ok(GetOrCreate {
                    allocation: existing,
                    newly_created: false,
                })
            }
            Err(AllocationError::RaceConflict { .. }) => {
                // A concurrent writer won; the idempotent answer is its
                // allocation, re-read from the store.
                let assignment = self.assignments.load(assignment_id).await?;
                assignment
                    .allocation_for(student_id)
                    .cloned()
                    .map(|allocation| GetOrCreate {
                        allocation,
                        newly_created: false,
                    })
                    .ok_or_else(|| {
                        AllocationError::upstream(
                            "persistence",
                            "concurrent insert reported but no allocation found on re-read",
                        )
                    })
            }
            Err(e) => Err(e),
        }
    }

    async fn key_lock(&self, assignment_id: &str, student_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry((assignment_id.to_string(), student_id.to_string()))
            .or_default()
            .clone()
    }

    async fn discard_lock(&self, assignment_id: &str, student_id: &str) {
        let mut locks = self.locks.lock().await;
        locks.remove(&(assignment_id.to_string(), student_id.to_string()));
    }
}
