// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end orchestrator tests: a real sqlite database, a real
//! `ArtifactStore` and `PromptRegistry` on disk, and the same
//! `PipelineOrchestrator` wiring `main.rs` uses, driven exactly the way the
//! CLI would drive it (repeated `run_episode` calls interleaved with review
//! decisions).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;

use episode_pipeline::application::orchestrator::{PipelineOrchestrator, RunOutcome};
use episode_pipeline::infrastructure::artifact_store::ArtifactStore;
use episode_pipeline::infrastructure::config::Settings;
use episode_pipeline::infrastructure::cost_guard_service::CostGuardService;
use episode_pipeline::infrastructure::episode_lock::EpisodeLockTable;
use episode_pipeline::infrastructure::prompt_registry::PromptRegistry;
use episode_pipeline::infrastructure::repositories::{
    run_migrations, SqliteContentArtifactRepository, SqliteEpisodeRepository, SqlitePipelineRunRepository,
    SqlitePromptVersionRepository, SqliteReviewTaskRepository,
};
use episode_pipeline::infrastructure::review_gate_service::ReviewGateService;
use episode_pipeline::infrastructure::stage_adapters::support::register_version;
use episode_pipeline::infrastructure::stage_registry::StageRegistry;
use episode_pipeline_domain::repositories::{EpisodeRepository, PipelineRunRepository, PromptVersionRepository, ReviewTaskRepository};
use episode_pipeline_domain::{Episode, EpisodeStatus, PipelineRun, ReviewDecisionKind, RunStatus};

/// Every prompt-driven stage, paired with its registry entry name (distinct
/// from the stage id only for `correct`, whose prompts are registered as
/// `correct_transcript`).
const PROMPT_DRIVEN_STAGES: &[&str] = &["correct_transcript", "translate", "adapt", "imagegen", "tts"];

struct Harness {
    episode_repo: Arc<dyn EpisodeRepository>,
    run_repo: Arc<dyn PipelineRunRepository>,
    review_repo: Arc<dyn ReviewTaskRepository>,
    prompt_repo: Arc<dyn PromptVersionRepository>,
    prompt_registry: Arc<PromptRegistry>,
    orchestrator: PipelineOrchestrator,
    // Kept alive for the harness's lifetime; dropping these removes the dirs.
    _data_dir: tempfile::TempDir,
    _prompts_dir: tempfile::TempDir,
}

impl Harness {
    async fn new(max_episode_cost_usd: f64) -> Self {
        let pool = SqlitePoolOptions::new().max_connections(5).connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let episode_repo = Arc::new(SqliteEpisodeRepository::new(pool.clone()));
        let run_repo = Arc::new(SqlitePipelineRunRepository::new(pool.clone()));
        let prompt_repo = Arc::new(SqlitePromptVersionRepository::new(pool.clone()));
        let review_repo = Arc::new(SqliteReviewTaskRepository::new(pool.clone()));
        let content_repo = Arc::new(SqliteContentArtifactRepository::new(pool.clone()));

        let data_dir = tempfile::tempdir().unwrap();
        let prompts_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(data_dir.path()));
        let prompt_registry = Arc::new(PromptRegistry::new(prompts_dir.path()));

        for stage in PROMPT_DRIVEN_STAGES {
            let dir = prompts_dir.path().join(stage);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("v1.md"), "v1 body").unwrap();
            register_version(prompt_repo.as_ref(), &prompt_registry, stage, "v1").await.unwrap();
        }

        let review_gate = Arc::new(ReviewGateService::new(review_repo.clone(), store.clone()));
        let cost_guard = Arc::new(CostGuardService::new(run_repo.clone(), max_episode_cost_usd));
        let locks = Arc::new(EpisodeLockTable::new());
        let stage_registry = Arc::new(StageRegistry::new(
            store.clone(),
            content_repo.clone(),
            prompt_repo.clone(),
            prompt_registry.clone(),
            review_gate.clone(),
        ));

        let mut settings = Settings::default();
        settings.max_episode_cost_usd = max_episode_cost_usd;
        settings.pipeline_version = 2;

        let orchestrator = PipelineOrchestrator::new(
            episode_repo.clone(),
            run_repo.clone(),
            stage_registry,
            review_gate,
            cost_guard,
            locks,
            store,
            settings,
            Arc::new(AtomicBool::new(false)),
        );

        Self {
            episode_repo,
            run_repo,
            review_repo,
            prompt_repo,
            prompt_registry,
            orchestrator,
            _data_dir: data_dir,
            _prompts_dir: prompts_dir,
        }
    }

    async fn new_episode(&self, id: &str) {
        let episode = Episode::new(id, "chan1", "Episode Title", "https://example.test/ep.mp3", 2, Utc::now());
        self.episode_repo.save(&episode).await.unwrap();
    }

    async fn run(&self, episode_id: &str) -> RunOutcome {
        self.orchestrator.run_episode(episode_id, false).await.unwrap()
    }

    async fn status(&self, episode_id: &str) -> EpisodeStatus {
        self.episode_repo.find_by_id(episode_id).await.unwrap().unwrap().status
    }

    async fn runs(&self, episode_id: &str) -> Vec<PipelineRun> {
        self.run_repo.find_by_episode(episode_id).await.unwrap()
    }

    /// Approves whatever non-terminal task is currently open for
    /// `gated_stage` on `episode_id`.
    async fn approve(&self, episode_id: &str, gated_stage: &str) {
        let task = self.review_repo.find_non_terminal(episode_id, gated_stage).await.unwrap().unwrap();
        self.review_repo_decide(task.id, ReviewDecisionKind::Approved, None, None).await;
    }

    async fn reject(&self, episode_id: &str, gated_stage: &str, feedback: &str, revert_to: EpisodeStatus) {
        let task = self.review_repo.find_non_terminal(episode_id, gated_stage).await.unwrap().unwrap();
        self.review_repo_decide(task.id, ReviewDecisionKind::Rejected, Some(feedback), Some(revert_to)).await;
    }

    async fn review_repo_decide(&self, task_id: i64, decision: ReviewDecisionKind, notes: Option<&str>, revert_to: Option<EpisodeStatus>) {
        // Mirrors `ReviewGateService::decide`, but driven directly off the
        // repositories the harness already owns rather than constructing a
        // second `ReviewGateService` just to reach the same database.
        let store = ArtifactStore::new(self._data_dir.path());
        let gate = ReviewGateService::new(self.review_repo.clone(), Arc::new(store));
        gate.decide(task_id, decision, notes, revert_to).await.unwrap();
    }

    async fn promote_new_prompt_version(&self, stage: &str, body: &str) {
        let next_version = self.prompt_repo.max_version(stage).await.unwrap() + 1;
        let dir = self._prompts_dir.path().join(stage);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("v{next_version}.md")), body).unwrap();

        let version = register_version(self.prompt_repo.as_ref(), &self.prompt_registry, stage, &format!("v{next_version}"))
            .await
            .unwrap();
        self.prompt_repo.promote_to_default(stage, version.id).await.unwrap();
    }
}

/// Drives an episode from `NEW` to `APPROVED` (i.e. through every gate),
/// approving gate 1, 2, and 3 as each one opens. Returns once `publish` is
/// the only remaining stage.
async fn run_to_approved(h: &Harness, episode_id: &str) {
    assert_eq!(h.run(episode_id).await, RunOutcome::AwaitingReview { status: EpisodeStatus::Corrected, stage: "review_gate_1" });
    h.approve(episode_id, "correct").await;

    assert_eq!(
        h.run(episode_id).await,
        RunOutcome::AwaitingReview { status: EpisodeStatus::Adapted, stage: "review_gate_2" }
    );
    h.approve(episode_id, "adapt").await;

    assert_eq!(
        h.run(episode_id).await,
        RunOutcome::AwaitingReview { status: EpisodeStatus::Rendered, stage: "review_gate_3" }
    );
    h.approve(episode_id, "render").await;
}

#[tokio::test]
async fn happy_path_produces_thirteen_successful_runs() {
    let h = Harness::new(10.0).await;
    h.new_episode("ep1").await;

    run_to_approved(&h, "ep1").await;

    let outcome = h.run("ep1").await;
    assert_eq!(outcome, RunOutcome::Stopped { status: EpisodeStatus::Completed });

    let runs = h.runs("ep1").await;
    assert_eq!(runs.len(), 13, "one pipeline_run row per plan entry, gates included, once they resolve");
    assert!(runs.iter().all(|r| r.status == RunStatus::Success));
}

#[tokio::test]
async fn rejection_reverts_status_and_resubmission_succeeds_with_feedback_applied() {
    let h = Harness::new(10.0).await;
    h.new_episode("ep1").await;

    assert_eq!(h.run("ep1").await, RunOutcome::AwaitingReview { status: EpisodeStatus::Corrected, stage: "review_gate_1" });

    h.reject("ep1", "correct", "too literal, loosen it up", EpisodeStatus::Transcribed).await;
    assert_eq!(h.status("ep1").await, EpisodeStatus::Transcribed);

    // The gate is still blocking: `correct`'s artifact was marked stale, so
    // it reruns, producing a fresh review task rather than passing straight
    // through on the rejected decision.
    assert_eq!(h.run("ep1").await, RunOutcome::AwaitingReview { status: EpisodeStatus::Corrected, stage: "review_gate_1" });

    h.approve("ep1", "correct").await;
    assert_eq!(
        h.run("ep1").await,
        RunOutcome::AwaitingReview { status: EpisodeStatus::Adapted, stage: "review_gate_2" }
    );
}

#[tokio::test]
async fn idempotent_rerun_at_an_unchanged_status_performs_no_new_work() {
    let h = Harness::new(10.0).await;
    h.new_episode("ep1").await;

    run_to_approved(&h, "ep1").await;
    h.run("ep1").await;
    let first_run_count = h.runs("ep1").await.len();
    assert_eq!(h.status("ep1").await, EpisodeStatus::Completed);

    // Re-running a completed episode without `force` is a no-op: it's
    // terminal, so `run_episode` stops immediately without touching the
    // plan at all.
    let outcome = h.run("ep1").await;
    assert_eq!(outcome, RunOutcome::Stopped { status: EpisodeStatus::Completed });
    assert_eq!(h.runs("ep1").await.len(), first_run_count, "no new pipeline_run rows on a no-op rerun");
}

#[tokio::test]
async fn cost_cap_halts_the_episode_before_the_stage_that_would_exceed_it() {
    // `correct` costs $0.01, `translate` costs $0.02; a cap of $0.015 lets
    // `correct` through (starting cumulative cost is $0) but trips on
    // `adapt`'s pre-check once `translate` has pushed the cumulative past it.
    let h = Harness::new(0.015).await;
    h.new_episode("ep1").await;

    assert_eq!(h.run("ep1").await, RunOutcome::AwaitingReview { status: EpisodeStatus::Corrected, stage: "review_gate_1" });
    h.approve("ep1", "correct").await;

    let outcome = h.run("ep1").await;
    assert_eq!(outcome, RunOutcome::CostCapHit { status: EpisodeStatus::CostLimit });
    assert_eq!(h.status("ep1").await, EpisodeStatus::CostLimit);

    let runs = h.runs("ep1").await;
    assert!(runs.iter().any(|r| r.stage_id == "translate" && r.status == RunStatus::Success));
    assert!(!runs.iter().any(|r| r.stage_id == "adapt"), "adapt's pre-check should trip before it ever runs");
}

#[tokio::test]
async fn tampering_with_the_draft_video_blocks_publish() {
    let h = Harness::new(10.0).await;
    h.new_episode("ep1").await;
    run_to_approved(&h, "ep1").await;
    assert_eq!(h.status("ep1").await, EpisodeStatus::Approved);

    let draft_path = h._data_dir.path().join("render").join("ep1").join("draft.mp4");
    std::fs::create_dir_all(draft_path.parent().unwrap()).unwrap();
    std::fs::write(&draft_path, b"a tampered, wholly different cut").unwrap();

    let outcome = h.run("ep1").await;
    assert_eq!(outcome, RunOutcome::FailedTerminally { status: EpisodeStatus::Failed });
    assert_eq!(h.status("ep1").await, EpisodeStatus::Failed);

    let runs = h.runs("ep1").await;
    let publish_run = runs.iter().find(|r| r.stage_id == "publish").unwrap();
    assert_eq!(publish_run.status, RunStatus::Failed);
}

#[tokio::test]
async fn prompt_version_swap_forces_correct_to_rerun() {
    let h = Harness::new(10.0).await;
    h.new_episode("ep1").await;

    assert_eq!(h.run("ep1").await, RunOutcome::AwaitingReview { status: EpisodeStatus::Corrected, stage: "review_gate_1" });
    let runs_before = h.runs("ep1").await;
    let correct_runs_before = runs_before.iter().filter(|r| r.stage_id == "correct").count();
    assert_eq!(correct_runs_before, 1);

    h.approve("ep1", "correct").await;
    assert_eq!(
        h.run("ep1").await,
        RunOutcome::AwaitingReview { status: EpisodeStatus::Adapted, stage: "review_gate_2" }
    );

    // Register and promote a new default `correct_transcript` prompt, then
    // force a rerun of `correct` on an episode already past it.
    h.promote_new_prompt_version("correct_transcript", "a materially different correction prompt").await;
    h.orchestrator.run_episode("ep1", true).await.unwrap();

    let runs_after = h.runs("ep1").await;
    let correct_runs_after = runs_after.iter().filter(|r| r.stage_id == "correct").count();
    assert_eq!(correct_runs_after, correct_runs_before + 1, "a new default prompt hash forces a fresh correct run");
}
