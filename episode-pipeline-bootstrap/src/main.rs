// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Wires config, the sqlite pool, every repository and service, and the
//! orchestrator together, then dispatches to the use case the CLI selected.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use episode_pipeline::application::orchestrator::PipelineOrchestrator;
use episode_pipeline::application::use_cases::cost_report::CostReportUseCase;
use episode_pipeline::application::use_cases::review::ReviewUseCase;
use episode_pipeline::application::use_cases::run_episode::RunEpisodeUseCase;
use episode_pipeline::application::use_cases::run_pending::RunPendingUseCase;
use episode_pipeline::application::use_cases::status::StatusUseCase;
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
use episode_pipeline::infrastructure::stage_registry::StageRegistry;
use episode_pipeline_domain::ReviewDecisionKind;

use episode_pipeline_bootstrap::cli::{Cli, Commands};
use episode_pipeline_bootstrap::{logger, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;

    let connect_options = SqliteConnectOptions::from_str(&settings.database_url)
        .context("parsing database_url")?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .context("connecting to sqlite database")?;
    run_migrations(&pool).await.context("running schema migrations")?;

    let episode_repo = Arc::new(SqliteEpisodeRepository::new(pool.clone()));
    let run_repo = Arc::new(SqlitePipelineRunRepository::new(pool.clone()));
    let prompt_version_repo = Arc::new(SqlitePromptVersionRepository::new(pool.clone()));
    let review_repo = Arc::new(SqliteReviewTaskRepository::new(pool.clone()));
    let content_repo = Arc::new(SqliteContentArtifactRepository::new(pool.clone()));

    let store = Arc::new(ArtifactStore::new(settings.data_root.as_str()));
    let prompt_registry = Arc::new(PromptRegistry::new(settings.prompts_dir.as_str()));
    let review_gate = Arc::new(ReviewGateService::new(review_repo.clone(), store.clone()));
    let cost_guard = Arc::new(CostGuardService::new(run_repo.clone(), settings.max_episode_cost_usd));
    let locks = Arc::new(EpisodeLockTable::new());
    let stage_registry = Arc::new(StageRegistry::new(
        store.clone(),
        content_repo.clone(),
        prompt_version_repo.clone(),
        prompt_registry.clone(),
        review_gate.clone(),
    ));
    let shutdown_flag = shutdown::install();

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        episode_repo.clone(),
        run_repo.clone(),
        stage_registry,
        review_gate.clone(),
        cost_guard,
        locks,
        store,
        settings.clone(),
        shutdown_flag,
    ));

    match cli.command {
        Commands::Run { episode_id, force } => {
            let outcome = RunEpisodeUseCase::new(orchestrator).execute(&episode_id, force).await?;
            println!("{outcome:?}");
        }
        Commands::RunPending => {
            let results = RunPendingUseCase::new(episode_repo, orchestrator, settings.run_pending_limit).execute().await?;
            for (episode_id, outcome) in results {
                println!("{episode_id}: {outcome:?}");
            }
        }
        Commands::Status { episode_id } => {
            let report = StatusUseCase::new(episode_repo, run_repo.clone(), review_repo.clone()).execute(&episode_id).await?;
            println!("episode {} status={}", report.episode.id, report.episode.status);
            for run in &report.runs {
                println!("  {} {} cost=${:.4}", run.stage_id, run.status, run.estimated_cost_usd);
            }
            if let Some(task) = report.pending_review {
                println!("  pending review: task {} stage={}", task.id, task.stage_id);
            }
        }
        Commands::CostReport { episode_id } => {
            let report = CostReportUseCase::new(episode_repo, run_repo, settings.max_episode_cost_usd)
                .execute(episode_id.as_deref())
                .await?;
            for (episode_id, check) in report {
                println!("{episode_id}: ${:.4} / ${:.4} cap", check.cumulative_cost_usd, check.cap_usd);
            }
        }
        Commands::Review { task_id, decision, notes } => {
            let decision = ReviewDecisionKind::from_str_opt(&decision)
                .with_context(|| format!("unknown decision '{decision}', expected approved|rejected|changes_requested"))?;
            let result = ReviewUseCase::new(review_gate, review_repo, episode_repo).execute(task_id, decision, notes).await?;
            println!("task {} decision={}", result.review_task_id, result.decision.as_str());
        }
    }

    Ok(())
}
