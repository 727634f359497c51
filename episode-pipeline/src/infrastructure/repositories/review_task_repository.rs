// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::ReviewTaskRepository;
use episode_pipeline_domain::{EpisodeStatus, PipelineError, ReviewDecision, ReviewDecisionKind, ReviewStatus, ReviewTask};

pub struct SqliteReviewTaskRepository {
    pool: SqlitePool,
}

impl SqliteReviewTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<ReviewTask, PipelineError> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let status = ReviewStatus::from_str_opt(&status_str)
        .ok_or_else(|| PipelineError::database_error(format!("unknown review status '{status_str}'")))?;
    let artifact_paths_json: String = row.try_get("artifact_paths").map_err(db_err)?;
    let artifact_paths: Vec<String> = serde_json::from_str(&artifact_paths_json)?;
    Ok(ReviewTask {
        id: row.try_get("id").map_err(db_err)?,
        episode_id: row.try_get("episode_id").map_err(db_err)?,
        stage_id: row.try_get("stage_id").map_err(db_err)?,
        status,
        artifact_paths,
        diff_path: row.try_get("diff_path").map_err(db_err)?,
        prompt_version_id: row.try_get("prompt_version_id").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        reviewed_at: row.try_get("reviewed_at").map_err(db_err)?,
        reviewer_notes: row.try_get("reviewer_notes").map_err(db_err)?,
        artifact_hash: row.try_get("artifact_hash").map_err(db_err)?,
    })
}

#[async_trait]
impl ReviewTaskRepository for SqliteReviewTaskRepository {
    async fn find_non_terminal(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError> {
        let rows = sqlx::query(
            "SELECT * FROM review_tasks WHERE episode_id = ? AND stage_id = ? ORDER BY created_at DESC",
        )
        .bind(episode_id)
        .bind(stage_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        for row in &rows {
            let task = row_to_task(row)?;
            if task.status.is_non_terminal() {
                return Ok(Some(task));
            }
        }
        Ok(None)
    }

    async fn find_latest(&self, episode_id: &str, stage_id: &str) -> Result<Option<ReviewTask>, PipelineError> {
        let row = sqlx::query(
            "SELECT * FROM review_tasks WHERE episode_id = ? AND stage_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(episode_id)
        .bind(stage_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_task).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ReviewTask>, PipelineError> {
        let row = sqlx::query("SELECT * FROM review_tasks WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(db_err)?;
        row.as_ref().map(row_to_task).transpose()
    }

    async fn insert(&self, task: &ReviewTask) -> Result<i64, PipelineError> {
        let artifact_paths_json = serde_json::to_string(&task.artifact_paths)?;
        let result = sqlx::query(
            r#"
            INSERT INTO review_tasks (episode_id, stage_id, status, artifact_paths, diff_path, prompt_version_id, created_at, reviewed_at, reviewer_notes, artifact_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.episode_id)
        .bind(&task.stage_id)
        .bind(task.status.as_str())
        .bind(artifact_paths_json)
        .bind(&task.diff_path)
        .bind(task.prompt_version_id)
        .bind(task.created_at)
        .bind(task.reviewed_at)
        .bind(&task.reviewer_notes)
        .bind(&task.artifact_hash)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn apply_decision(
        &self,
        task_id: i64,
        decision: ReviewDecisionKind,
        notes: Option<&str>,
        artifact_hash: Option<&str>,
        episode_id: &str,
        reverted_episode_status: Option<EpisodeStatus>,
        decided_at: DateTime<Utc>,
    ) -> Result<ReviewDecision, PipelineError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "UPDATE review_tasks SET status = ?, reviewed_at = ?, reviewer_notes = ?, artifact_hash = ? WHERE id = ?",
        )
        .bind(decision.resulting_status().as_str())
        .bind(decided_at)
        .bind(notes)
        .bind(artifact_hash)
        .bind(task_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let result = sqlx::query(
            "INSERT INTO review_decisions (review_task_id, decision, notes, decided_at) VALUES (?, ?, ?, ?)",
        )
        .bind(task_id)
        .bind(decision.as_str())
        .bind(notes)
        .bind(decided_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if let Some(status) = reverted_episode_status {
            sqlx::query("UPDATE episodes SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(decided_at)
                .bind(episode_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        Ok(ReviewDecision {
            id: result.last_insert_rowid(),
            review_task_id: task_id,
            decision,
            notes: notes.map(str::to_string),
            decided_at,
        })
    }

    async fn latest_feedback(&self, episode_id: &str, stage_id: &str) -> Result<Option<String>, PipelineError> {
        let row = sqlx::query(
            "SELECT reviewer_notes FROM review_tasks WHERE episode_id = ? AND stage_id = ? AND reviewer_notes IS NOT NULL ORDER BY reviewed_at DESC LIMIT 1",
        )
        .bind(episode_id)
        .bind(stage_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.try_get("reviewer_notes").map_err(db_err)).transpose()
    }

    async fn pending_count(&self) -> Result<i64, PipelineError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM review_tasks WHERE status IN (?, ?)")
            .bind(ReviewStatus::Pending.as_str())
            .bind(ReviewStatus::InReview.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("n").map_err(db_err)
    }
}
