// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Uploads the rendered video. Refuses to proceed if the draft video's
//! bytes no longer match the hash recorded when the gate-3 reviewer
//! approved it - a last line of defense against a file edited or replaced
//! out from under the pipeline between approval and publish.

use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::services::ContentHasher;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::StageSupport;
use crate::infrastructure::provenance_writer::{ProvenanceRecord, ProvenanceWriter};
use crate::infrastructure::review_gate_service::ReviewGateService;

const STAGE: &str = "publish";
/// The gated stage whose gate-3 approval carries the tamper-detection hash
/// a publish run must still match.
const GATED_STAGE: &str = "render";

pub struct PublishAdapter {
    support: StageSupport,
    review_gate: Arc<ReviewGateService>,
}

impl PublishAdapter {
    pub fn new(support: StageSupport, review_gate: Arc<ReviewGateService>) -> Self {
        Self { support, review_gate }
    }
}

#[async_trait]
impl StageAdapter for PublishAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Publish
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let draft = self.support.store.draft_video(&ctx.episode.id);
        let approved_hash = self
            .review_gate
            .approved_artifact_hash(&ctx.episode.id, GATED_STAGE)
            .await?
            .ok_or_else(|| {
                PipelineError::ValidationError(format!("episode {} has no approved render review task to publish against", ctx.episode.id))
            })?;

        let current_hash = self.support.hasher.hash_file(&self.support.store.data_root().join(&draft))?;
        if current_hash.as_str() != approved_hash {
            return Err(PipelineError::ValidationError(format!(
                "draft video for episode {} does not match the hash approved at review time - refusing to publish",
                ctx.episode.id
            )));
        }

        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let video_id = format!("video-{}", &current_hash.as_str()[..12]);
        let writer = ProvenanceWriter::new(&self.support.store);
        writer.write_publish(
            &ctx.episode.id,
            &ProvenanceRecord {
                stage: STAGE.to_string(),
                episode_id: ctx.episode.id.clone(),
                timestamp: chrono::Utc::now(),
                prompt_name: None,
                prompt_version: None,
                prompt_hash: None,
                model: None,
                model_params: None,
                input_files: vec![self.support.file_ref(&draft)?],
                output_files: vec![],
                input_tokens: None,
                output_tokens: None,
                cost_usd: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: Some(video_id.clone()),
            },
        )?;

        Ok(StageResult::success(format!("published as {video_id}"), EpisodeStatus::Published).with_youtube_video_id(video_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::artifact_store::ArtifactStore;
    use episode_pipeline_domain::repositories::{ContentArtifactRepository, ReviewTaskRepository};
    use episode_pipeline_domain::{ContentArtifact, Episode, ReviewDecisionKind, ReviewTask};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeContentRepo {
        artifacts: Mutex<Vec<ContentArtifact>>,
    }

    #[async_trait]
    impl ContentArtifactRepository for FakeContentRepo {
        async fn insert(&self, artifact: &ContentArtifact) -> Result<i64, PipelineError> {
            self.artifacts.lock().unwrap().push(artifact.clone());
            Ok(1)
        }
        async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<ContentArtifact>, PipelineError> {
            Ok(self.artifacts.lock().unwrap().iter().filter(|a| a.episode_id == episode_id).cloned().collect())
        }
    }

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
            _reverted_episode_status: Option<episode_pipeline_domain::EpisodeStatus>,
            decided_at: chrono::DateTime<chrono::Utc>,
        ) -> Result<episode_pipeline_domain::ReviewDecision, PipelineError> {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks.iter_mut().find(|t| t.id == task_id).unwrap();
            task.status = decision.resulting_status();
            task.reviewed_at = Some(decided_at);
            task.reviewer_notes = notes.map(str::to_string);
            task.artifact_hash = artifact_hash.map(str::to_string);
            Ok(episode_pipeline_domain::ReviewDecision {
                id: 1,
                review_task_id: task_id,
                decision,
                notes: notes.map(str::to_string),
                decided_at,
            })
        }
        async fn latest_feedback(&self, _episode_id: &str, _stage_id: &str) -> Result<Option<String>, PipelineError> {
            Ok(None)
        }
        async fn pending_count(&self) -> Result<i64, PipelineError> {
            Ok(self.tasks.lock().unwrap().iter().filter(|t| t.status.is_non_terminal()).count() as i64)
        }
    }

    fn context() -> RunContext {
        RunContext {
            episode: Episode::new("ep1", "chan1", "Title", "https://example.test/ep1.mp3", 2, chrono::Utc::now()),
            force: false,
            dry_run: false,
            max_episode_cost_usd: 5.0,
            max_retries: 3,
            feedback: None,
        }
    }

    async fn adapter_with_approved_render(store: Arc<ArtifactStore>, draft: &str) -> PublishAdapter {
        let review_repo = Arc::new(FakeReviewRepo::default());
        let review_gate = Arc::new(ReviewGateService::new(review_repo, store.clone()));
        let task_id = review_gate.create_task("ep1", GATED_STAGE, vec![draft.to_string()], None, None).await.unwrap();
        review_gate.decide(task_id, ReviewDecisionKind::Approved, None, None).await.unwrap();
        PublishAdapter::new(StageSupport::new(store, Arc::new(FakeContentRepo::default())), review_gate)
    }

    #[tokio::test]
    async fn publishes_when_hash_matches_the_approved_render() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let draft = store.draft_video("ep1");
        store.write(&draft, b"final cut bytes").unwrap();

        let adapter = adapter_with_approved_render(store, &draft).await;
        let result = adapter.execute(&context()).await.unwrap();
        assert!(matches!(result.status, episode_pipeline_domain::RunStatus::Success));
    }

    #[tokio::test]
    async fn refuses_to_publish_a_tampered_draft() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let draft = store.draft_video("ep1");
        store.write(&draft, b"final cut bytes").unwrap();

        let adapter = adapter_with_approved_render(store.clone(), &draft).await;
        store.write(&draft, b"tampered bytes").unwrap();

        let err = adapter.execute(&context()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
    }

    #[tokio::test]
    async fn refuses_to_publish_without_an_approved_render() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let draft = store.draft_video("ep1");
        store.write(&draft, b"final cut bytes").unwrap();

        let review_repo = Arc::new(FakeReviewRepo::default());
        let review_gate = Arc::new(ReviewGateService::new(review_repo, store.clone()));
        let adapter = PublishAdapter::new(StageSupport::new(store, Arc::new(FakeContentRepo::default())), review_gate);

        let err = adapter.execute(&context()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
    }
}
