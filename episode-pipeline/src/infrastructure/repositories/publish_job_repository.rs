// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::PublishJobRepository;
use episode_pipeline_domain::{PipelineError, PublishJob, PublishJobStatus};

pub struct SqlitePublishJobRepository {
    pool: SqlitePool,
}

impl SqlitePublishJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn status_from_str(s: &str) -> Result<PublishJobStatus, PipelineError> {
    match s {
        "pending" => Ok(PublishJobStatus::Pending),
        "succeeded" => Ok(PublishJobStatus::Succeeded),
        "failed" => Ok(PublishJobStatus::Failed),
        other => Err(PipelineError::database_error(format!("unknown publish job status '{other}'"))),
    }
}

fn status_as_str(status: PublishJobStatus) -> &'static str {
    match status {
        PublishJobStatus::Pending => "pending",
        PublishJobStatus::Succeeded => "succeeded",
        PublishJobStatus::Failed => "failed",
    }
}

#[async_trait]
impl PublishJobRepository for SqlitePublishJobRepository {
    async fn insert(&self, job: &PublishJob) -> Result<i64, PipelineError> {
        let result = sqlx::query(
            "INSERT INTO publish_jobs (episode_id, platform, external_video_id, status, uploaded_at, error_message) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.episode_id)
        .bind(&job.platform)
        .bind(&job.external_video_id)
        .bind(status_as_str(job.status))
        .bind(job.uploaded_at)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<PublishJob>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM publish_jobs WHERE episode_id = ? ORDER BY id ASC")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                let status_str: String = row.try_get("status").map_err(db_err)?;
                Ok(PublishJob {
                    id: row.try_get("id").map_err(db_err)?,
                    episode_id: row.try_get("episode_id").map_err(db_err)?,
                    platform: row.try_get("platform").map_err(db_err)?,
                    external_video_id: row.try_get("external_video_id").map_err(db_err)?,
                    status: status_from_str(&status_str)?,
                    uploaded_at: row.try_get("uploaded_at").map_err(db_err)?,
                    error_message: row.try_get("error_message").map_err(db_err)?,
                })
            })
            .collect()
    }
}
