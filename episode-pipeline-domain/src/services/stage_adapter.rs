// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Adapter Contract
//!
//! The only thing the orchestrator knows about a stage. Every
//! external collaborator - LLM client, image generator, TTS, uploader, feed
//! fetcher, downloader, transcriber, ffmpeg runner - plugs in behind this one
//! trait. Bodies are infrastructure; this port is domain.

use async_trait::async_trait;

use crate::{Episode, PipelineError, RunStatus};

/// Everything a stage adapter needs to do its job, threaded through by the
/// orchestrator rather than reached for via a global singleton.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub episode: Episode,
    pub force: bool,
    pub dry_run: bool,
    pub max_episode_cost_usd: f64,
    pub max_retries: u32,
    /// Reviewer feedback injected as a prompt variable on re-run after a
    /// rejection or changes-requested decision.
    pub feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StageResult {
    pub status: RunStatus,
    pub detail: String,
    pub cost_usd: f64,
    pub new_episode_status: Option<crate::EpisodeStatus>,
    pub error: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    /// Set only by the `publish` stage on success, carrying the uploaded
    /// video's id back to the orchestrator rather than encoding it in
    /// `detail` for the caller to parse back out.
    pub youtube_video_id: Option<String>,
}

impl StageResult {
    pub fn success(detail: impl Into<String>, new_episode_status: crate::EpisodeStatus) -> Self {
        Self {
            status: RunStatus::Success,
            detail: detail.into(),
            cost_usd: 0.0,
            new_episode_status: Some(new_episode_status),
            error: None,
            input_tokens: None,
            output_tokens: None,
            youtube_video_id: None,
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Skipped,
            detail: detail.into(),
            cost_usd: 0.0,
            new_episode_status: None,
            error: None,
            input_tokens: None,
            output_tokens: None,
            youtube_video_id: None,
        }
    }

    pub fn failed(detail: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            status: RunStatus::Failed,
            detail: detail.into(),
            cost_usd: 0.0,
            new_episode_status: None,
            error: Some(error),
            input_tokens: None,
            output_tokens: None,
            youtube_video_id: None,
        }
    }

    pub fn review_pending(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::ReviewPending,
            detail: detail.into(),
            cost_usd: 0.0,
            new_episode_status: None,
            error: None,
            input_tokens: None,
            output_tokens: None,
            youtube_video_id: None,
        }
    }

    /// Like [`Self::success`], but leaves `new_episode_status` unset so the
    /// orchestrator derives it from the plan instead - for review gates,
    /// which don't know their own plan position.
    pub fn success_unspecified(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            detail: detail.into(),
            cost_usd: 0.0,
            new_episode_status: None,
            error: None,
            input_tokens: None,
            output_tokens: None,
            youtube_video_id: None,
        }
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }

    pub fn with_tokens(mut self, input_tokens: i64, output_tokens: i64) -> Self {
        self.input_tokens = Some(input_tokens);
        self.output_tokens = Some(output_tokens);
        self
    }

    pub fn with_youtube_video_id(mut self, video_id: impl Into<String>) -> Self {
        self.youtube_video_id = Some(video_id.into());
        self
    }
}

/// Port implemented by every stage (real stage and review gate alike).
/// Idempotency and input-staleness propagation are the implementer's
/// responsibility; the orchestrator only enforces their *consequences*
/// (treating a `skipped` result as "nothing changed", and re-running
/// downstream stages whose inputs are now stale).
#[async_trait]
pub trait StageAdapter: Send + Sync {
    fn stage_id(&self) -> crate::StageId;

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError>;
}
