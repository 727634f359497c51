// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::PipelineRunRepository;
use episode_pipeline_domain::{PipelineError, PipelineRun, RunStatus};

pub struct SqlitePipelineRunRepository {
    pool: SqlitePool,
}

impl SqlitePipelineRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn row_to_run(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineRun, PipelineError> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let status = RunStatus::from_str_opt(&status_str)
        .ok_or_else(|| PipelineError::database_error(format!("unknown run status '{status_str}'")))?;
    Ok(PipelineRun {
        id: row.try_get("id").map_err(db_err)?,
        episode_id: row.try_get("episode_id").map_err(db_err)?,
        stage_id: row.try_get("stage_id").map_err(db_err)?,
        status,
        started_at: row.try_get("started_at").map_err(db_err)?,
        completed_at: row.try_get("completed_at").map_err(db_err)?,
        input_tokens: row.try_get("input_tokens").map_err(db_err)?,
        output_tokens: row.try_get("output_tokens").map_err(db_err)?,
        estimated_cost_usd: row.try_get("estimated_cost_usd").map_err(db_err)?,
        error_message: row.try_get("error_message").map_err(db_err)?,
    })
}

#[async_trait]
impl PipelineRunRepository for SqlitePipelineRunRepository {
    async fn insert(&self, run: &PipelineRun) -> Result<i64, PipelineError> {
        let result = sqlx::query(
            r#"
            INSERT INTO pipeline_runs (episode_id, stage_id, status, started_at, completed_at, input_tokens, output_tokens, estimated_cost_usd, error_message)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.episode_id)
        .bind(&run.stage_id)
        .bind(run.status.as_str())
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.input_tokens)
        .bind(run.output_tokens)
        .bind(run.estimated_cost_usd)
        .bind(&run.error_message)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn update_completion(
        &self,
        run_id: i64,
        status: RunStatus,
        completed_at: DateTime<Utc>,
        cost_usd: f64,
        error_message: Option<&str>,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            "UPDATE pipeline_runs SET status = ?, completed_at = ?, estimated_cost_usd = ?, error_message = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(cost_usd)
        .bind(error_message)
        .bind(run_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<PipelineRun>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM pipeline_runs WHERE episode_id = ? ORDER BY started_at ASC")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_run).collect()
    }

    async fn latest_success(&self, episode_id: &str, stage_id: &str) -> Result<Option<PipelineRun>, PipelineError> {
        let row = sqlx::query(
            "SELECT * FROM pipeline_runs WHERE episode_id = ? AND stage_id = ? AND status = ? ORDER BY started_at DESC LIMIT 1",
        )
        .bind(episode_id)
        .bind(stage_id)
        .bind(RunStatus::Success.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_run).transpose()
    }
}
