// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `review <task-id> <decision>` - records a human decision on an open
//! review task. The status an episode reverts to on rejection isn't a CLI
//! input: it's looked up from the stage plan, so a reviewer never has to
//! know (or get wrong) the episode-status enum.

use std::sync::Arc;

use episode_pipeline_domain::repositories::{EpisodeRepository, ReviewTaskRepository};
use episode_pipeline_domain::services::plan_for_version;
use episode_pipeline_domain::{PipelineError, ReviewDecision, ReviewDecisionKind, StageId};

use crate::infrastructure::review_gate_service::ReviewGateService;

pub struct ReviewUseCase {
    review_gate: Arc<ReviewGateService>,
    review_repo: Arc<dyn ReviewTaskRepository>,
    episode_repo: Arc<dyn EpisodeRepository>,
}

impl ReviewUseCase {
    pub fn new(
        review_gate: Arc<ReviewGateService>,
        review_repo: Arc<dyn ReviewTaskRepository>,
        episode_repo: Arc<dyn EpisodeRepository>,
    ) -> Self {
        Self { review_gate, review_repo, episode_repo }
    }

    pub async fn execute(
        &self,
        task_id: i64,
        decision: ReviewDecisionKind,
        notes: Option<String>,
    ) -> Result<ReviewDecision, PipelineError> {
        let revert_to = if matches!(decision, ReviewDecisionKind::Approved) {
            None
        } else {
            let task = self
                .review_repo
                .find_by_id(task_id)
                .await?
                .ok_or_else(|| PipelineError::not_found(format!("review task {task_id}")))?;
            let episode = self
                .episode_repo
                .find_by_id(&task.episode_id)
                .await?
                .ok_or_else(|| PipelineError::not_found(format!("episode {}", task.episode_id)))?;
            let plan = plan_for_version(episode.pipeline_version)
                .ok_or_else(|| PipelineError::InvalidConfiguration(format!("no stage plan for pipeline_version {}", episode.pipeline_version)))?;
            let gated_stage_id = StageId::from_str_opt(&task.stage_id)
                .ok_or_else(|| PipelineError::InvalidConfiguration(format!("unknown gated stage {}", task.stage_id)))?;
            let entry = plan
                .iter()
                .find(|e| e.stage_id == gated_stage_id)
                .ok_or_else(|| PipelineError::InvalidConfiguration(format!("stage {} not in episode's plan", task.stage_id)))?;
            Some(entry.required_prior_status)
        };

        self.review_gate.decide(task_id, decision, notes.as_deref(), revert_to).await
    }
}
