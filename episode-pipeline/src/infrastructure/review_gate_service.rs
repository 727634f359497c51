// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Review gate state machine: creates review tasks when a gated stage
//! finishes, and turns a human decision into the transactional
//! decision-plus-status-revert the `ReviewTaskRepository` port commits in
//! one shot.

use std::sync::Arc;

use chrono::Utc;
use episode_pipeline_domain::repositories::ReviewTaskRepository;
use episode_pipeline_domain::services::{ContentHasher, Sha256ContentHasher};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, ReviewDecision, ReviewDecisionKind, ReviewStatus, ReviewTask};

use super::artifact_store::ArtifactStore;

pub struct ReviewGateService {
    review_repo: Arc<dyn ReviewTaskRepository>,
    artifact_store: Arc<ArtifactStore>,
    hasher: Sha256ContentHasher,
}

impl ReviewGateService {
    pub fn new(review_repo: Arc<dyn ReviewTaskRepository>, artifact_store: Arc<ArtifactStore>) -> Self {
        Self { review_repo, artifact_store, hasher: Sha256ContentHasher }
    }

    /// Creates a pending task for `stage_id` if none is currently
    /// non-terminal. Returns the existing task's id when one is already
    /// open, so a re-run doesn't spawn a duplicate gate.
    pub async fn create_task(
        &self,
        episode_id: &str,
        stage_id: &str,
        artifact_paths: Vec<String>,
        diff_path: Option<String>,
        prompt_version_id: Option<i64>,
    ) -> Result<i64, PipelineError> {
        if let Some(existing) = self.review_repo.find_non_terminal(episode_id, stage_id).await? {
            return Ok(existing.id);
        }
        let task = ReviewTask {
            id: 0,
            episode_id: episode_id.to_string(),
            stage_id: stage_id.to_string(),
            status: episode_pipeline_domain::ReviewStatus::Pending,
            artifact_paths,
            diff_path,
            prompt_version_id,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewer_notes: None,
            artifact_hash: None,
        };
        self.review_repo.insert(&task).await
    }

    /// Any task at all has been opened for `(episode, stage)`, terminal or
    /// not - used to tell "never reviewed" from "already decided".
    pub async fn task_exists(&self, episode_id: &str, stage_id: &str) -> Result<bool, PipelineError> {
        Ok(self.review_repo.find_latest(episode_id, stage_id).await?.is_some())
    }

    pub async fn has_pending(&self, episode_id: &str, stage_id: &str) -> Result<bool, PipelineError> {
        Ok(self
            .review_repo
            .find_non_terminal(episode_id, stage_id)
            .await?
            .map(|t| t.status.blocks_advancement())
            .unwrap_or(false))
    }

    pub async fn latest_feedback(&self, episode_id: &str, stage_id: &str) -> Result<Option<String>, PipelineError> {
        self.review_repo.latest_feedback(episode_id, stage_id).await
    }

    pub async fn pending_count(&self) -> Result<i64, PipelineError> {
        self.review_repo.pending_count().await
    }

    /// Applies a decision: on approval, hashes the task's primary artifact
    /// to produce `artifact_hash` (publish-time tamper detection compares
    /// against this); on rejection or changes-requested, reverts the
    /// episode to the status preceding the gated stage.
    pub async fn decide(
        &self,
        task_id: i64,
        decision: ReviewDecisionKind,
        notes: Option<&str>,
        revert_to: Option<EpisodeStatus>,
    ) -> Result<ReviewDecision, PipelineError> {
        let task = self
            .review_repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| PipelineError::not_found(format!("review task {task_id}")))?;

        if !task.status.is_non_terminal() {
            return Err(PipelineError::InvalidTransition(format!(
                "review task {task_id} already resolved as {}",
                task.status
            )));
        }

        let artifact_hash = if matches!(decision, ReviewDecisionKind::Approved) {
            match task.primary_artifact_path() {
                Some(path) => {
                    Some(self.hasher.hash_file(&self.artifact_store.data_root().join(path))?.as_str().to_string())
                }
                None => None,
            }
        } else {
            None
        };

        let episode_id = task.episode_id.clone();
        let reverted_status = if matches!(decision, ReviewDecisionKind::Approved) { None } else { revert_to };

        if !matches!(decision, ReviewDecisionKind::Approved) {
            // Force the gated stage to actually redo its work next run,
            // rather than finding its existing output still fresh and
            // skipping past the feedback the reviewer just left.
            for path in &task.artifact_paths {
                self.artifact_store.mark_stale(path, "review decision", &task.stage_id)?;
            }
        }

        self.review_repo
            .apply_decision(
                task_id,
                decision,
                notes,
                artifact_hash.as_deref(),
                &episode_id,
                reverted_status,
                Utc::now(),
            )
            .await
    }

    /// True exactly when the latest task for `(episode, stage)` resolved as
    /// approved - distinct from merely "not pending", since a rejected or
    /// changes-requested task is also terminal but isn't approval.
    pub async fn has_approved(&self, episode_id: &str, stage_id: &str) -> Result<bool, PipelineError> {
        Ok(self
            .review_repo
            .find_latest(episode_id, stage_id)
            .await?
            .is_some_and(|t| t.status == ReviewStatus::Approved))
    }

    /// The `artifact_hash` recorded when the latest task for `(episode,
    /// stage)` was approved - the tamper-detection reference point a
    /// downstream stage checks the current file against. `None` if the
    /// latest task isn't approved (or none exists).
    pub async fn approved_artifact_hash(&self, episode_id: &str, stage_id: &str) -> Result<Option<String>, PipelineError> {
        Ok(self
            .review_repo
            .find_latest(episode_id, stage_id)
            .await?
            .filter(|t| t.status == ReviewStatus::Approved)
            .and_then(|t| t.artifact_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeReviewRepo {
        tasks: Mutex<Vec<ReviewTask>>,
        next_id: Mutex<i64>,
    }

    #[async_trait]
    impl ReviewTaskRepository for FakeReviewRepo {
        async fn find_non_terminal(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.episode_id == episode_id && t.stage_id == stage_id && t.status.is_non_terminal())
                .cloned())
        }

        async fn find_latest(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.episode_id == episode_id && t.stage_id == stage_id)
                .last()
                .cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<ReviewTask>, PipelineError> {
            Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }

        async fn insert(&self, task: &ReviewTask) -> Result<i64, PipelineError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let mut task = task.clone();
            task.id = *next_id;
            self.tasks.lock().unwrap().push(task);
            Ok(*next_id)
        }

        async fn apply_decision(
            &self,
            task_id: i64,
            decision: ReviewDecisionKind,
            notes: Option<&str>,
            artifact_hash: Option<&str>,
            _episode_id: &str,
            _reverted_episode_status: Option<EpisodeStatus>,
            decided_at: chrono::DateTime<chrono::Utc>,
        ) -> Result<ReviewDecision, PipelineError> {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.iter_mut().find(|t| t.id == task_id).unwrap();
            task.status = decision.resulting_status();
            task.reviewed_at = Some(decided_at);
            task.reviewer_notes = notes.map(str::to_string);
            task.artifact_hash = artifact_hash.map(str::to_string);
            Ok(ReviewDecision { id: 1, review_task_id: task_id, decision, notes: notes.map(str::to_string), decided_at })
        }

        async fn latest_feedback(&self, episode_id: &str, stage_id: &str) -> Result<Option<String>, PipelineError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.episode_id == episode_id && t.stage_id == stage_id)
                .filter_map(|t| t.reviewer_notes.clone())
                .last())
        }

        async fn pending_count(&self) -> Result<i64, PipelineError> {
            Ok(self.tasks.lock().unwrap().iter().filter(|t| t.status.is_non_terminal()).count() as i64)
        }
    }

    fn service() -> (ReviewGateService, Arc<FakeReviewRepo>, tempfile::TempDir) {
        let review_repo = Arc::new(FakeReviewRepo::default());
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        (ReviewGateService::new(review_repo.clone(), store), review_repo, dir)
    }

    #[tokio::test]
    async fn create_task_is_idempotent_while_pending() {
        let (svc, _repo, _dir) = service();
        let first = svc.create_task("ep1", "correct", vec!["t.txt".into()], None, None).await.unwrap();
        let second = svc.create_task("ep1", "correct", vec!["t.txt".into()], None, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn approve_hashes_primary_artifact() {
        let (svc, _repo, dir) = service();
        let artifact_path = "t.txt";
        std::fs::write(dir.path().join(artifact_path), b"approved content").unwrap();
        let task_id = svc.create_task("ep1", "correct", vec![artifact_path.to_string()], None, None).await.unwrap();

        let decision = svc.decide(task_id, ReviewDecisionKind::Approved, None, None).await.unwrap();
        assert!(matches!(decision.decision, ReviewDecisionKind::Approved));

        let task = _repo.find_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, ReviewStatus::Approved);
        assert!(task.artifact_hash.is_some());
    }

    #[tokio::test]
    async fn reject_leaves_no_artifact_hash() {
        let (svc, repo, dir) = service();
        let artifact_path = "t.txt";
        std::fs::write(dir.path().join(artifact_path), b"first draft").unwrap();
        let task_id = svc.create_task("ep1", "correct", vec![artifact_path.to_string()], None, None).await.unwrap();
        svc.decide(task_id, ReviewDecisionKind::Rejected, Some("too literal"), Some(EpisodeStatus::Transcribed))
            .await
            .unwrap();
        let task = repo.find_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status, ReviewStatus::Rejected);
        assert!(task.artifact_hash.is_none());
    }

    #[tokio::test]
    async fn rejection_marks_the_artifact_stale_so_the_stage_redoes_its_work() {
        let (svc, _repo, dir) = service();
        let artifact_path = "t.txt";
        std::fs::write(dir.path().join(artifact_path), b"first draft").unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(!store.is_stale(artifact_path));

        let task_id = svc.create_task("ep1", "correct", vec![artifact_path.to_string()], None, None).await.unwrap();
        svc.decide(task_id, ReviewDecisionKind::ChangesRequested, Some("tighten this"), Some(EpisodeStatus::Transcribed))
            .await
            .unwrap();

        assert!(store.is_stale(artifact_path));
    }

    #[tokio::test]
    async fn deciding_an_already_resolved_task_is_an_invalid_transition() {
        let (svc, _repo, _dir) = service();
        let task_id = svc.create_task("ep1", "correct", vec!["t.txt".into()], None, None).await.unwrap();
        svc.decide(task_id, ReviewDecisionKind::Rejected, None, Some(EpisodeStatus::Transcribed)).await.unwrap();
        let err = svc.decide(task_id, ReviewDecisionKind::Approved, None, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn has_approved_is_false_until_a_task_is_approved() {
        let (svc, _repo, dir) = service();
        assert!(!svc.has_approved("ep1", "correct").await.unwrap());

        std::fs::write(dir.path().join("t.txt"), b"draft").unwrap();
        let task_id = svc.create_task("ep1", "correct", vec!["t.txt".into()], None, None).await.unwrap();
        assert!(!svc.has_approved("ep1", "correct").await.unwrap());

        svc.decide(task_id, ReviewDecisionKind::Approved, None, None).await.unwrap();
        assert!(svc.has_approved("ep1", "correct").await.unwrap());
    }

    #[tokio::test]
    async fn has_approved_is_false_after_a_rejection() {
        let (svc, _repo, _dir) = service();
        let task_id = svc.create_task("ep1", "correct", vec!["t.txt".into()], None, None).await.unwrap();
        svc.decide(task_id, ReviewDecisionKind::Rejected, None, Some(EpisodeStatus::Transcribed)).await.unwrap();
        assert!(!svc.has_approved("ep1", "correct").await.unwrap());
    }
}
