// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `run <episode-id>` - drives a single episode through its plan.

use std::sync::Arc;

use tracing::info;

use episode_pipeline_domain::PipelineError;

use crate::application::orchestrator::{PipelineOrchestrator, RunOutcome};

pub struct RunEpisodeUseCase {
    orchestrator: Arc<PipelineOrchestrator>,
}

impl RunEpisodeUseCase {
    pub fn new(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(&self, episode_id: &str, force: bool) -> Result<RunOutcome, PipelineError> {
        let outcome = self.orchestrator.run_episode(episode_id, force).await?;
        info!(episode_id, outcome = ?outcome, "run finished");
        Ok(outcome)
    }
}
