// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `run-pending` - sweeps every non-terminal episode through one
//! `run_episode` call each. An episode still blocked on an open review gate
//! simply reports `AwaitingReview` again; re-visiting it here is harmless.

use std::sync::Arc;

use tracing::warn;

use episode_pipeline_domain::repositories::EpisodeRepository;
use episode_pipeline_domain::PipelineError;

use crate::application::orchestrator::{PipelineOrchestrator, RunOutcome};

pub struct RunPendingUseCase {
    episode_repo: Arc<dyn EpisodeRepository>,
    orchestrator: Arc<PipelineOrchestrator>,
    limit: u32,
}

impl RunPendingUseCase {
    pub fn new(episode_repo: Arc<dyn EpisodeRepository>, orchestrator: Arc<PipelineOrchestrator>, limit: u32) -> Self {
        Self { episode_repo, orchestrator, limit }
    }

    pub async fn execute(&self) -> Result<Vec<(String, RunOutcome)>, PipelineError> {
        let episodes = self.episode_repo.find_actionable(self.limit).await?;
        let mut results = Vec::with_capacity(episodes.len());
        for episode in episodes {
            match self.orchestrator.run_episode(&episode.id, false).await {
                Ok(outcome) => results.push((episode.id, outcome)),
                Err(e) => warn!(episode_id = %episode.id, error = %e, "run-pending: episode failed"),
            }
        }
        Ok(results)
    }
}
