// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Wraps a review gate as a stage adapter so the stage registry can dispatch
//! to it uniformly. The orchestrator opens the review task when the gated
//! stage completes; this adapter only reports whether the gate is still
//! closed, defensively opening a task if one is somehow missing.

use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{PipelineError, StageId};

use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::review_gate_service::ReviewGateService;

pub struct ReviewGateAdapter {
    stage_id: StageId,
    service: Arc<ReviewGateService>,
    store: Arc<ArtifactStore>,
}

impl ReviewGateAdapter {
    pub fn new(stage_id: StageId, service: Arc<ReviewGateService>, store: Arc<ArtifactStore>) -> Self {
        assert!(stage_id.is_review_gate(), "ReviewGateAdapter used for a non-gate stage");
        Self { stage_id, service, store }
    }
}

#[async_trait]
impl StageAdapter for ReviewGateAdapter {
    fn stage_id(&self) -> StageId {
        self.stage_id
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let gated_stage = self.stage_id.gated_stage().expect("review gate stage always names a gated stage");

        if self.service.has_pending(&ctx.episode.id, gated_stage).await? {
            return Ok(StageResult::review_pending(format!("{gated_stage} awaiting review decision")));
        }

        if self.service.has_approved(&ctx.episode.id, gated_stage).await? {
            return Ok(StageResult::success_unspecified(format!("{gated_stage} gate approved")));
        }

        if self.service.task_exists(&ctx.episode.id, gated_stage).await? {
            // The latest task resolved as rejected/changes-requested. The
            // episode's status was already reverted when that decision was
            // made, so this gate shouldn't be reachable again until the
            // gated stage reruns and opens a fresh task - treat it as still
            // blocking rather than silently passing through.
            return Ok(StageResult::review_pending(format!("{gated_stage} awaiting a fresh review decision")));
        }

        // Defensive fallback: the orchestrator should have opened the task
        // already when the gated stage completed.
        let artifact_path = match gated_stage {
            "correct" => self.store.transcript_corrected(&ctx.episode.id),
            "adapt" => self.store.script_adapted(&ctx.episode.id),
            "render" => self.store.draft_video(&ctx.episode.id),
            other => return Err(PipelineError::InvalidConfiguration(format!("unknown gated stage {other}"))),
        };

        self.service
            .create_task(&ctx.episode.id, gated_stage, vec![artifact_path], None, None)
            .await?;

        Ok(StageResult::review_pending(format!("opened review task for {gated_stage}")))
    }
}
