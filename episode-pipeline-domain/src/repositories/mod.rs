// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Repository Ports
//!
//! Persistence abstraction between the domain and infrastructure layers.
//! Implementations live in `episode-pipeline`'s infrastructure module,
//! backed by sqlx/sqlite; these
//! traits let the orchestrator and review gate service stay ignorant of the
//! storage technology, and let tests substitute an in-memory sqlite database
//! without changing a line of domain or application code.

use async_trait::async_trait;

use crate::{
    Channel, ContentArtifact, Episode, EpisodeStatus, MediaAsset, PipelineError, PipelineRun, PromptVersion,
    PublishJob, ReviewDecision, ReviewDecisionKind, ReviewTask,
};

#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    async fn find_by_id(&self, episode_id: &str) -> Result<Option<Episode>, PipelineError>;
    async fn save(&self, episode: &Episode) -> Result<(), PipelineError>;
    /// Episodes that are neither terminal nor blocked by a non-approved
    /// review gate, ordered by `detected_at` ascending.
    async fn find_actionable(&self, limit: u32) -> Result<Vec<Episode>, PipelineError>;
    async fn list_all(&self) -> Result<Vec<Episode>, PipelineError>;
}

#[async_trait]
pub trait PipelineRunRepository: Send + Sync {
    async fn insert(&self, run: &PipelineRun) -> Result<i64, PipelineError>;
    async fn update_completion(
        &self,
        run_id: i64,
        status: crate::RunStatus,
        completed_at: chrono::DateTime<chrono::Utc>,
        cost_usd: f64,
        error_message: Option<&str>,
    ) -> Result<(), PipelineError>;
    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<PipelineRun>, PipelineError>;
    /// The most recent successful run for `(episode, stage)`, used by the
    /// idempotency check to compare against the current default prompt hash
    /// and input hashes.
    async fn latest_success(&self, episode_id: &str, stage_id: &str) -> Result<Option<PipelineRun>, PipelineError>;
}

#[async_trait]
pub trait PromptVersionRepository: Send + Sync {
    async fn find_by_name_and_hash(&self, name: &str, content_hash: &str) -> Result<Option<PromptVersion>, PipelineError>;
    async fn find_default(&self, name: &str) -> Result<Option<PromptVersion>, PipelineError>;
    async fn find_history(&self, name: &str) -> Result<Vec<PromptVersion>, PipelineError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<PromptVersion>, PipelineError>;
    async fn max_version(&self, name: &str) -> Result<i32, PipelineError>;
    /// Inserts a new version row. Implementations must perform this, the
    /// "clear existing defaults for `name`" step (first-version case), and
    /// any `promote_to_default` clear-then-set inside one transaction.
    async fn insert(&self, version: &PromptVersion) -> Result<i64, PipelineError>;
    async fn promote_to_default(&self, name: &str, version_id: i64) -> Result<(), PipelineError>;
}

#[async_trait]
pub trait ReviewTaskRepository: Send + Sync {
    async fn find_non_terminal(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError>;
    /// The most recent task for `(episode, stage)` regardless of status, used
    /// to distinguish "never reviewed" from "already resolved" once a
    /// decision has moved the task out of `find_non_terminal`'s view.
    async fn find_latest(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ReviewTask>, PipelineError>;
    async fn insert(&self, task: &ReviewTask) -> Result<i64, PipelineError>;
    /// Appends a decision, updates the parent task's status, and (the
    /// caller passes the already-computed new status) reverts the episode
    /// status, all inside one transaction.
    async fn apply_decision(
        &self,
        task_id: i64,
        decision: ReviewDecisionKind,
        notes: Option<&str>,
        artifact_hash: Option<&str>,
        episode_id: &str,
        reverted_episode_status: Option<EpisodeStatus>,
        decided_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<ReviewDecision, PipelineError>;
    async fn latest_feedback(&self, episode_id: &str, stage_id: &str) -> Result<Option<String>, PipelineError>;
    async fn pending_count(&self) -> Result<i64, PipelineError>;
}

#[async_trait]
pub trait ContentArtifactRepository: Send + Sync {
    async fn insert(&self, artifact: &ContentArtifact) -> Result<i64, PipelineError>;
    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<ContentArtifact>, PipelineError>;
}

#[async_trait]
pub trait MediaAssetRepository: Send + Sync {
    async fn insert(&self, asset: &MediaAsset) -> Result<i64, PipelineError>;
    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<MediaAsset>, PipelineError>;
}

#[async_trait]
pub trait PublishJobRepository: Send + Sync {
    async fn insert(&self, job: &PublishJob) -> Result<i64, PipelineError>;
    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<PublishJob>, PipelineError>;
}

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>, PipelineError>;
    async fn list_all(&self) -> Result<Vec<Channel>, PipelineError>;
}
