// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Orchestrator
//!
//! The single place that walks an episode through its stage plan. Everything
//! it needs - the plan, the per-stage adapters, the review gate and cost
//! guard services - is injected; the orchestrator itself holds no I/O logic
//! of its own beyond coordinating calls to those collaborators and persisting
//! the resulting `Episode`/`PipelineRun` rows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use episode_pipeline_domain::aggregates::EpisodeAggregate;
use episode_pipeline_domain::repositories::{EpisodeRepository, PipelineRunRepository};
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::services::{produced_status, PlanEntry, V2_PLAN};
use episode_pipeline_domain::{Episode, EpisodeStatus, PipelineError, PipelineRun, RunStatus, StageId};

use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::config::Settings;
use crate::infrastructure::cost_guard_service::CostGuardService;
use crate::infrastructure::episode_lock::EpisodeLockTable;
use crate::infrastructure::metrics;
use crate::infrastructure::review_gate_service::ReviewGateService;
use crate::infrastructure::stage_registry::StageRegistry;

/// What happened to an episode after one `run_episode` call. Distinct from
/// `EpisodeStatus` because "stopped for review" and "stopped because the
/// plan ran out" are orchestration outcomes, not episode states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The plan is exhausted; the episode sits at `status`, terminal or not
    /// (e.g. `Completed`, or an in-flight status if nothing was actionable).
    Stopped { status: EpisodeStatus },
    /// A review gate is open; nothing more can happen until a human decides.
    AwaitingReview { status: EpisodeStatus, stage: &'static str },
    /// The episode's cost cap was hit; the episode is now in `CostLimit`.
    CostCapHit { status: EpisodeStatus },
    /// A stage failed; the episode is now `Failed`. Retries, if any, are an
    /// adapter-internal concern - the orchestrator treats any non-cost-cap
    /// failure as terminal.
    FailedTerminally { status: EpisodeStatus },
    /// A shutdown was requested between stages; the episode is left at
    /// `status`, safe to resume from on the next run.
    ShuttingDown { status: EpisodeStatus },
}

pub struct PipelineOrchestrator {
    episode_repo: Arc<dyn EpisodeRepository>,
    run_repo: Arc<dyn PipelineRunRepository>,
    stage_registry: Arc<StageRegistry>,
    review_gate: Arc<ReviewGateService>,
    cost_guard: Arc<CostGuardService>,
    locks: Arc<EpisodeLockTable>,
    store: Arc<ArtifactStore>,
    settings: Settings,
    shutdown: Arc<AtomicBool>,
}

impl PipelineOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        episode_repo: Arc<dyn EpisodeRepository>,
        run_repo: Arc<dyn PipelineRunRepository>,
        stage_registry: Arc<StageRegistry>,
        review_gate: Arc<ReviewGateService>,
        cost_guard: Arc<CostGuardService>,
        locks: Arc<EpisodeLockTable>,
        store: Arc<ArtifactStore>,
        settings: Settings,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self { episode_repo, run_repo, stage_registry, review_gate, cost_guard, locks, store, settings, shutdown }
    }

    /// Drives `episode_id` forward through as much of its stage plan as it
    /// can go in one call: runs stages in plan order until a review gate
    /// opens, the cost cap trips, a stage fails, or the plan completes.
    #[instrument(skip(self), fields(episode_id = %episode_id))]
    pub async fn run_episode(&self, episode_id: &str, force: bool) -> Result<RunOutcome, PipelineError> {
        let _guard = self.locks.lock(episode_id).await;

        let episode = self
            .episode_repo
            .find_by_id(episode_id)
            .await?
            .ok_or_else(|| PipelineError::not_found(format!("episode {episode_id}")))?;

        if episode.is_terminal() && !force {
            return Ok(RunOutcome::Stopped { status: episode.status });
        }

        let plan = self
            .stage_registry
            .plan_for(episode.pipeline_version)
            .ok_or_else(|| PipelineError::InvalidConfiguration(format!("no stage plan for pipeline_version {}", episode.pipeline_version)))?;

        let mut aggregate = EpisodeAggregate::new(episode);
        // Tracks how far this call has already walked the plan, so a review
        // gate whose approval leaves the episode's status unchanged (most of
        // them - only the gate ahead of `publish` actually advances status)
        // isn't re-selected forever by a pure status-based search.
        let mut cursor = 0usize;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping between stages");
                self.persist(&mut aggregate).await?;
                return Ok(RunOutcome::ShuttingDown { status: aggregate.episode().status });
            }

            let Some((index, entry)) = next_runnable_entry(plan, cursor, aggregate.episode().status) else {
                break;
            };

            if !entry.stage_id.is_review_gate() {
                if let Err(e) = self.cost_guard.ensure_within_cap(episode_id).await {
                    warn!(error = %e, "cost cap exceeded, halting episode");
                    aggregate.force_terminal(EpisodeStatus::CostLimit, Some(e.to_string()), Utc::now());
                    self.persist(&mut aggregate).await?;
                    metrics::record_episode_terminal(EpisodeStatus::CostLimit.as_str());
                    return Ok(RunOutcome::CostCapHit { status: EpisodeStatus::CostLimit });
                }
            }

            match self.run_one_stage(&mut aggregate, plan, index, entry, force).await? {
                StageOutcome::Advanced => {
                    cursor = index + 1;
                    continue;
                }
                StageOutcome::AwaitingReview => {
                    self.persist(&mut aggregate).await?;
                    return Ok(RunOutcome::AwaitingReview {
                        status: aggregate.episode().status,
                        stage: entry.stage_id.as_str(),
                    });
                }
                StageOutcome::FailedTerminally => {
                    self.persist(&mut aggregate).await?;
                    metrics::record_episode_terminal(EpisodeStatus::Failed.as_str());
                    return Ok(RunOutcome::FailedTerminally { status: aggregate.episode().status });
                }
            }
        }

        if aggregate.episode().status == EpisodeStatus::Published {
            aggregate.advance_status(EpisodeStatus::Completed, Utc::now())?;
        }
        self.persist(&mut aggregate).await?;
        if aggregate.episode().status == EpisodeStatus::Completed {
            metrics::record_episode_terminal(EpisodeStatus::Completed.as_str());
        }
        Ok(RunOutcome::Stopped { status: aggregate.episode().status })
    }

    async fn run_one_stage(
        &self,
        aggregate: &mut EpisodeAggregate,
        plan: &[PlanEntry],
        index: usize,
        entry: &PlanEntry,
        force: bool,
    ) -> Result<StageOutcome, PipelineError> {
        let stage_id = entry.stage_id;
        let adapter = self
            .stage_registry
            .get(stage_id)
            .ok_or_else(|| PipelineError::InvalidConfiguration(format!("no adapter registered for stage {stage_id}")))?;

        if stage_id.is_review_gate() {
            return self.run_gate_stage(aggregate, plan, index, stage_id, adapter.as_ref()).await;
        }

        let feedback = self.review_gate.latest_feedback(&aggregate.episode().id, stage_id.as_str()).await?;

        let ctx = RunContext {
            episode: aggregate.episode().clone(),
            force,
            dry_run: self.settings.dry_run,
            max_episode_cost_usd: self.settings.max_episode_cost_usd,
            max_retries: self.settings.max_retries,
            feedback,
        };

        aggregate.record_stage_started(stage_id.as_str(), Utc::now());
        let run_id = self.run_repo.insert(&PipelineRun::new(&ctx.episode.id, stage_id.as_str(), Utc::now())).await?;

        let started = std::time::Instant::now();
        let result = adapter.execute(&ctx).await;
        let elapsed = started.elapsed().as_secs_f64();

        let result = match result {
            Ok(result) => result,
            Err(e) => StageResult::failed("adapter error", e.to_string()),
        };

        self.run_repo
            .update_completion(run_id, result.status, Utc::now(), result.cost_usd, result.error.as_deref())
            .await?;
        metrics::record_stage_run(stage_id.as_str(), elapsed, result.cost_usd);
        aggregate.record_stage_completed(stage_id.as_str(), result.status, result.cost_usd, Utc::now());
        info!(stage = stage_id.as_str(), status = %result.status, detail = %result.detail, "stage finished");

        match result.status {
            RunStatus::Success => {
                if let Some(target) = result.new_episode_status.or_else(|| produced_status(plan, index)) {
                    aggregate.advance_status(target, Utc::now())?;
                }
                if let Some(video_id) = result.youtube_video_id.clone() {
                    aggregate.record_youtube_video_id(video_id);
                }
                // A gated real stage opens its review task proactively, so a
                // fresh rejection/approve cycle always starts from a clean
                // task rather than relying on the gate adapter's fallback.
                if let Some(next) = plan.get(index + 1) {
                    if next.stage_id.is_review_gate() {
                        self.open_review_task(aggregate.episode(), next.stage_id.gated_stage().unwrap_or(stage_id.as_str())).await?;
                    }
                }
                Ok(StageOutcome::Advanced)
            }
            RunStatus::Skipped => {
                if let Some(target) = produced_status(plan, index) {
                    if target > aggregate.episode().status {
                        aggregate.advance_status(target, Utc::now())?;
                    }
                }
                Ok(StageOutcome::Advanced)
            }
            RunStatus::ReviewPending => Ok(StageOutcome::AwaitingReview),
            RunStatus::Failed => {
                aggregate.force_terminal(EpisodeStatus::Failed, result.error.clone(), Utc::now());
                Ok(StageOutcome::FailedTerminally)
            }
            RunStatus::Running => Err(PipelineError::InvalidConfiguration(format!("adapter for {stage_id} returned a non-terminal status"))),
        }
    }

    /// Runs a review-gate entry. Unlike a real stage, a gate that's merely
    /// still blocking isn't "a run" - no `pipeline_run` row is written for
    /// it, so re-checking an open gate across many `run_episode` calls
    /// doesn't pile up rows for work that never happened. A row is written
    /// only once the gate actually resolves (approved, or - defensively -
    /// failed outright).
    async fn run_gate_stage(
        &self,
        aggregate: &mut EpisodeAggregate,
        plan: &[PlanEntry],
        index: usize,
        stage_id: StageId,
        adapter: &(dyn StageAdapter + Send + Sync),
    ) -> Result<StageOutcome, PipelineError> {
        let ctx = RunContext {
            episode: aggregate.episode().clone(),
            force: false,
            dry_run: self.settings.dry_run,
            max_episode_cost_usd: self.settings.max_episode_cost_usd,
            max_retries: self.settings.max_retries,
            feedback: None,
        };

        let result = match adapter.execute(&ctx).await {
            Ok(result) => result,
            Err(e) => StageResult::failed("adapter error", e.to_string()),
        };
        info!(stage = stage_id.as_str(), status = %result.status, detail = %result.detail, "gate checked");

        match result.status {
            RunStatus::ReviewPending => Ok(StageOutcome::AwaitingReview),
            RunStatus::Success => {
                let now = Utc::now();
                let run_id = self.run_repo.insert(&PipelineRun::new(&ctx.episode.id, stage_id.as_str(), now)).await?;
                self.run_repo.update_completion(run_id, RunStatus::Success, now, 0.0, None).await?;
                metrics::record_stage_run(stage_id.as_str(), 0.0, 0.0);
                aggregate.record_stage_completed(stage_id.as_str(), RunStatus::Success, 0.0, now);

                if let Some(target) = result.new_episode_status.or_else(|| produced_status(plan, index)) {
                    if target > aggregate.episode().status {
                        aggregate.advance_status(target, now)?;
                    }
                }
                if let Some(next) = plan.get(index + 1) {
                    if next.stage_id.is_review_gate() {
                        self.open_review_task(aggregate.episode(), next.stage_id.gated_stage().unwrap_or(stage_id.as_str())).await?;
                    }
                }
                Ok(StageOutcome::Advanced)
            }
            RunStatus::Failed => {
                let now = Utc::now();
                let run_id = self.run_repo.insert(&PipelineRun::new(&ctx.episode.id, stage_id.as_str(), now)).await?;
                self.run_repo.update_completion(run_id, RunStatus::Failed, now, 0.0, result.error.as_deref()).await?;
                metrics::record_stage_run(stage_id.as_str(), 0.0, 0.0);
                aggregate.force_terminal(EpisodeStatus::Failed, result.error.clone(), now);
                Ok(StageOutcome::FailedTerminally)
            }
            RunStatus::Skipped | RunStatus::Running => {
                Err(PipelineError::InvalidConfiguration(format!("review gate {stage_id} returned an unexpected status")))
            }
        }
    }

    /// Opens (or no-ops onto an existing) review task for a stage that just
    /// finished, ahead of the review-gate adapter's own defensive fallback.
    async fn open_review_task(&self, episode: &Episode, gated_stage: &str) -> Result<(), PipelineError> {
        let artifact_path = match gated_stage {
            "correct" => self.store.transcript_corrected(&episode.id),
            "adapt" => self.store.script_adapted(&episode.id),
            "render" => self.store.draft_video(&episode.id),
            other => return Err(PipelineError::InvalidConfiguration(format!("no artifact mapping for gated stage {other}"))),
        };
        self.review_gate.create_task(&episode.id, gated_stage, vec![artifact_path], None, None).await.map(|_| ())
    }

    async fn persist(&self, aggregate: &mut EpisodeAggregate) -> Result<(), PipelineError> {
        self.episode_repo.save(aggregate.episode()).await?;
        aggregate.mark_events_committed();
        Ok(())
    }
}

enum StageOutcome {
    Advanced,
    AwaitingReview,
    FailedTerminally,
}

/// The first plan entry at or after `from` whose precondition the episode
/// currently satisfies exactly, scanning in plan order so a review gate is
/// always attempted before the real stage that shares its
/// `required_prior_status`. `from` is the run's own cursor, not derived from
/// status: most gates leave status unchanged when they resolve, so without
/// it a resolved gate would be found again on every subsequent search within
/// the same `run_episode` call.
fn next_runnable_entry(plan: &[PlanEntry], from: usize, status: EpisodeStatus) -> Option<(usize, &PlanEntry)> {
    plan.iter().enumerate().skip(from).find(|(_, e)| e.required_prior_status == status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_review_gate_before_sibling_stage() {
        let (idx, entry) = next_runnable_entry(V2_PLAN, 0, EpisodeStatus::Corrected).unwrap();
        assert!(entry.stage_id.is_review_gate());
        assert_eq!(idx, 3);
    }

    #[test]
    fn cursor_skips_an_already_resolved_gate_in_favor_of_its_sibling() {
        let (idx, entry) = next_runnable_entry(V2_PLAN, 4, EpisodeStatus::Corrected).unwrap();
        assert!(!entry.stage_id.is_review_gate());
        assert_eq!(idx, 4);
    }

    #[test]
    fn returns_none_past_the_end_of_the_plan() {
        assert!(next_runnable_entry(V2_PLAN, 0, EpisodeStatus::Completed).is_none());
    }
}
