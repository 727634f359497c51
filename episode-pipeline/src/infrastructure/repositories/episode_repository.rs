// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::EpisodeRepository;
use episode_pipeline_domain::{Episode, EpisodeStatus, PipelineError};

pub struct SqliteEpisodeRepository {
    pool: SqlitePool,
}

impl SqliteEpisodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_episode(row: &sqlx::sqlite::SqliteRow) -> Result<Episode, PipelineError> {
    let status_str: String = row.try_get("status").map_err(|e| PipelineError::database_error(e.to_string()))?;
    let status = EpisodeStatus::from_str_opt(&status_str)
        .ok_or_else(|| PipelineError::database_error(format!("unknown episode status '{status_str}'")))?;
    Ok(Episode {
        id: row.try_get("id").map_err(db_err)?,
        channel_id: row.try_get("channel_id").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        duration_seconds: row.try_get::<Option<i64>, _>("duration_seconds").map_err(db_err)?.map(|v| v as u32),
        source_url: row.try_get("source_url").map_err(db_err)?,
        status,
        pipeline_version: row.try_get("pipeline_version").map_err(db_err)?,
        audio_path: row.try_get("audio_path").map_err(db_err)?,
        transcript_path: row.try_get("transcript_path").map_err(db_err)?,
        output_dir: row.try_get("output_dir").map_err(db_err)?,
        youtube_video_id: row.try_get("youtube_video_id").map_err(db_err)?,
        retry_count: row.try_get("retry_count").map_err(db_err)?,
        error_message: row.try_get("error_message").map_err(db_err)?,
        detected_at: row.try_get("detected_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

#[async_trait]
impl EpisodeRepository for SqliteEpisodeRepository {
    async fn find_by_id(&self, episode_id: &str) -> Result<Option<Episode>, PipelineError> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = ?")
            .bind(episode_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_episode).transpose()
    }

    async fn save(&self, episode: &Episode) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO episodes (
                id, channel_id, title, duration_seconds, source_url, status, pipeline_version,
                audio_path, transcript_path, output_dir, youtube_video_id, retry_count,
                error_message, detected_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                duration_seconds = excluded.duration_seconds,
                status = excluded.status,
                pipeline_version = excluded.pipeline_version,
                audio_path = excluded.audio_path,
                transcript_path = excluded.transcript_path,
                output_dir = excluded.output_dir,
                youtube_video_id = excluded.youtube_video_id,
                retry_count = excluded.retry_count,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&episode.id)
        .bind(&episode.channel_id)
        .bind(&episode.title)
        .bind(episode.duration_seconds.map(|v| v as i64))
        .bind(&episode.source_url)
        .bind(episode.status.as_str())
        .bind(episode.pipeline_version)
        .bind(&episode.audio_path)
        .bind(&episode.transcript_path)
        .bind(&episode.output_dir)
        .bind(&episode.youtube_video_id)
        .bind(episode.retry_count)
        .bind(&episode.error_message)
        .bind(episode.detected_at)
        .bind(episode.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_actionable(&self, limit: u32) -> Result<Vec<Episode>, PipelineError> {
        let terminal: Vec<&str> =
            [EpisodeStatus::Published, EpisodeStatus::Completed, EpisodeStatus::Failed, EpisodeStatus::CostLimit]
                .iter()
                .map(|s| s.as_str())
                .collect();
        let placeholders = terminal.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "SELECT * FROM episodes WHERE status NOT IN ({placeholders}) ORDER BY detected_at ASC LIMIT ?"
        );
        let mut query = sqlx::query(&sql);
        for status in &terminal {
            query = query.bind(*status);
        }
        query = query.bind(limit as i64);
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_episode).collect()
    }

    async fn list_all(&self) -> Result<Vec<Episode>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM episodes ORDER BY detected_at ASC").fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_episode).collect()
    }
}
