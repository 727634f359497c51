// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `status <episode-id>` - the episode record plus its run history, the view
//! an operator needs to tell "stuck" from "waiting on review".

use std::sync::Arc;

use episode_pipeline_domain::repositories::{EpisodeRepository, PipelineRunRepository, ReviewTaskRepository};
use episode_pipeline_domain::{Episode, PipelineError, PipelineRun, ReviewTask};

pub struct EpisodeStatusReport {
    pub episode: Episode,
    pub runs: Vec<PipelineRun>,
    pub pending_review: Option<ReviewTask>,
}

pub struct StatusUseCase {
    episode_repo: Arc<dyn EpisodeRepository>,
    run_repo: Arc<dyn PipelineRunRepository>,
    review_repo: Arc<dyn ReviewTaskRepository>,
}

impl StatusUseCase {
    pub fn new(
        episode_repo: Arc<dyn EpisodeRepository>,
        run_repo: Arc<dyn PipelineRunRepository>,
        review_repo: Arc<dyn ReviewTaskRepository>,
    ) -> Self {
        Self { episode_repo, run_repo, review_repo }
    }

    pub async fn execute(&self, episode_id: &str) -> Result<EpisodeStatusReport, PipelineError> {
        let episode = self
            .episode_repo
            .find_by_id(episode_id)
            .await?
            .ok_or_else(|| PipelineError::not_found(format!("episode {episode_id}")))?;
        let runs = self.run_repo.find_by_episode(episode_id).await?;
        let mut pending_review = None;
        for gated_stage in ["correct", "adapt", "render"] {
            if let Some(task) = self.review_repo.find_non_terminal(episode_id, gated_stage).await? {
                pending_review = Some(task);
                break;
            }
        }
        Ok(EpisodeStatusReport { episode, runs, pending_review })
    }
}
