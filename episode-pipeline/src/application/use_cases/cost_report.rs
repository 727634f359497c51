// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `cost-report [episode-id]` - cumulative spend for one episode, or every
//! episode that has a run on record.

use std::sync::Arc;

use episode_pipeline_domain::repositories::{EpisodeRepository, PipelineRunRepository};
use episode_pipeline_domain::services::{check_cost, CostCheck};
use episode_pipeline_domain::PipelineError;

pub struct CostReportUseCase {
    episode_repo: Arc<dyn EpisodeRepository>,
    run_repo: Arc<dyn PipelineRunRepository>,
    cap_usd: f64,
}

impl CostReportUseCase {
    pub fn new(episode_repo: Arc<dyn EpisodeRepository>, run_repo: Arc<dyn PipelineRunRepository>, cap_usd: f64) -> Self {
        Self { episode_repo, run_repo, cap_usd }
    }

    pub async fn execute(&self, episode_id: Option<&str>) -> Result<Vec<(String, CostCheck)>, PipelineError> {
        match episode_id {
            Some(id) => {
                let runs = self.run_repo.find_by_episode(id).await?;
                Ok(vec![(id.to_string(), check_cost(&runs, self.cap_usd))])
            }
            None => {
                let episodes = self.episode_repo.list_all().await?;
                let mut report = Vec::with_capacity(episodes.len());
                for episode in episodes {
                    let runs = self.run_repo.find_by_episode(&episode.id).await?;
                    report.push((episode.id, check_cost(&runs, self.cap_usd)));
                }
                Ok(report)
            }
        }
    }
}
