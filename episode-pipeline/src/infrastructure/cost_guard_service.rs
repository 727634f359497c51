// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fetches an episode's run history and delegates the cap check to the pure
//! domain calculation. The orchestrator calls `check` before starting any
//! stage that incurs cost.

use std::sync::Arc;

use episode_pipeline_domain::repositories::PipelineRunRepository;
use episode_pipeline_domain::services::{check_cost, CostCheck};
use episode_pipeline_domain::PipelineError;

pub struct CostGuardService {
    run_repo: Arc<dyn PipelineRunRepository>,
    cap_usd: f64,
}

impl CostGuardService {
    pub fn new(run_repo: Arc<dyn PipelineRunRepository>, cap_usd: f64) -> Self {
        Self { run_repo, cap_usd }
    }

    pub async fn check(&self, episode_id: &str) -> Result<CostCheck, PipelineError> {
        let runs = self.run_repo.find_by_episode(episode_id).await?;
        Ok(check_cost(&runs, self.cap_usd))
    }

    pub async fn ensure_within_cap(&self, episode_id: &str) -> Result<(), PipelineError> {
        let check = self.check(episode_id).await?;
        if check.is_exceeded() {
            return Err(PipelineError::CostCapExceeded(format!(
                "episode {episode_id} at ${:.2} of ${:.2} cap",
                check.cumulative_cost_usd, check.cap_usd
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use episode_pipeline_domain::{PipelineRun, RunStatus};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeRunRepo {
        runs: Mutex<Vec<PipelineRun>>,
    }

    #[async_trait]
    impl PipelineRunRepository for FakeRunRepo {
        async fn insert(&self, run: &PipelineRun) -> Result<i64, PipelineError> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(self.runs.lock().unwrap().len() as i64)
        }
        async fn update_completion(
            &self,
            _run_id: i64,
            _status: RunStatus,
            _completed_at: chrono::DateTime<Utc>,
            _cost_usd: f64,
            _error_message: Option<&str>,
        ) -> Result<(), PipelineError> {
            Ok(())
        }
        async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<PipelineRun>, PipelineError> {
            Ok(self.runs.lock().unwrap().iter().filter(|r| r.episode_id == episode_id).cloned().collect())
        }
        async fn latest_success(&self, _episode_id: &str, _stage_id: &str) -> Result<Option<PipelineRun>, PipelineError> {
            Ok(None)
        }
    }

    fn run(episode_id: &str, status: RunStatus, cost: f64) -> PipelineRun {
        let mut r = PipelineRun::new(episode_id, "translate", Utc::now());
        r.status = status;
        r.estimated_cost_usd = cost;
        r
    }

    #[tokio::test]
    async fn under_cap_passes() {
        let repo = Arc::new(FakeRunRepo::default());
        repo.insert(&run("ep1", RunStatus::Success, 1.0)).await.unwrap();
        let guard = CostGuardService::new(repo, 5.0);
        assert!(guard.ensure_within_cap("ep1").await.is_ok());
    }

    #[tokio::test]
    async fn over_cap_fails() {
        let repo = Arc::new(FakeRunRepo::default());
        repo.insert(&run("ep1", RunStatus::Success, 4.0)).await.unwrap();
        repo.insert(&run("ep1", RunStatus::Success, 2.0)).await.unwrap();
        let guard = CostGuardService::new(repo, 5.0);
        let err = guard.ensure_within_cap("ep1").await.unwrap_err();
        assert!(matches!(err, PipelineError::CostCapExceeded(_)));
    }
}
