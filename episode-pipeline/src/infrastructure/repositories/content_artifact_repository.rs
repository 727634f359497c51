// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::ContentArtifactRepository;
use episode_pipeline_domain::{ContentArtifact, PipelineError};

pub struct SqliteContentArtifactRepository {
    pool: SqlitePool,
}

impl SqliteContentArtifactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

#[async_trait]
impl ContentArtifactRepository for SqliteContentArtifactRepository {
    async fn insert(&self, artifact: &ContentArtifact) -> Result<i64, PipelineError> {
        let result = sqlx::query(
            "INSERT INTO content_artifacts (episode_id, artifact_type, file_path, model, prompt_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&artifact.episode_id)
        .bind(&artifact.artifact_type)
        .bind(&artifact.file_path)
        .bind(&artifact.model)
        .bind(&artifact.prompt_hash)
        .bind(artifact.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<ContentArtifact>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM content_artifacts WHERE episode_id = ? ORDER BY created_at ASC")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                Ok(ContentArtifact {
                    id: row.try_get("id").map_err(db_err)?,
                    episode_id: row.try_get("episode_id").map_err(db_err)?,
                    artifact_type: row.try_get("artifact_type").map_err(db_err)?,
                    file_path: row.try_get("file_path").map_err(db_err)?,
                    model: row.try_get("model").map_err(db_err)?,
                    prompt_hash: row.try_get("prompt_hash").map_err(db_err)?,
                    created_at: row.try_get("created_at").map_err(db_err)?,
                })
            })
            .collect()
    }
}
