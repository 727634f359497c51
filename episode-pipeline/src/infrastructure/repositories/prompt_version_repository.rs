// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::PromptVersionRepository;
use episode_pipeline_domain::{PipelineError, PromptVersion};

pub struct SqlitePromptVersionRepository {
    pool: SqlitePool,
}

impl SqlitePromptVersionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn row_to_version(row: &sqlx::sqlite::SqliteRow) -> Result<PromptVersion, PipelineError> {
    Ok(PromptVersion {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
        content_hash: row.try_get("content_hash").map_err(db_err)?,
        template_path: row.try_get("template_path").map_err(db_err)?,
        model: row.try_get("model").map_err(db_err)?,
        temperature: row.try_get("temperature").map_err(db_err)?,
        max_tokens: row.try_get("max_tokens").map_err(db_err)?,
        is_default: row.try_get::<i64, _>("is_default").map_err(db_err)? != 0,
        created_at: row.try_get("created_at").map_err(db_err)?,
        notes: row.try_get("notes").map_err(db_err)?,
    })
}

#[async_trait]
impl PromptVersionRepository for SqlitePromptVersionRepository {
    async fn find_by_name_and_hash(&self, name: &str, content_hash: &str) -> Result<Option<PromptVersion>, PipelineError> {
        let row = sqlx::query("SELECT * FROM prompt_versions WHERE name = ? AND content_hash = ?")
            .bind(name)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_version).transpose()
    }

    async fn find_default(&self, name: &str) -> Result<Option<PromptVersion>, PipelineError> {
        let row = sqlx::query("SELECT * FROM prompt_versions WHERE name = ? AND is_default = 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_version).transpose()
    }

    async fn find_history(&self, name: &str) -> Result<Vec<PromptVersion>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM prompt_versions WHERE name = ? ORDER BY version ASC")
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_version).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PromptVersion>, PipelineError> {
        let row = sqlx::query("SELECT * FROM prompt_versions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_version).transpose()
    }

    async fn max_version(&self, name: &str) -> Result<i32, PipelineError> {
        let row = sqlx::query("SELECT COALESCE(MAX(version), 0) AS max_version FROM prompt_versions WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("max_version").map_err(db_err)
    }

    async fn insert(&self, version: &PromptVersion) -> Result<i64, PipelineError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        if version.is_default {
            sqlx::query("UPDATE prompt_versions SET is_default = 0 WHERE name = ?")
                .bind(&version.name)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        let result = sqlx::query(
            r#"
            INSERT INTO prompt_versions (name, version, content_hash, template_path, model, temperature, max_tokens, is_default, created_at, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&version.name)
        .bind(version.version)
        .bind(&version.content_hash)
        .bind(&version.template_path)
        .bind(&version.model)
        .bind(version.temperature)
        .bind(version.max_tokens)
        .bind(version.is_default as i64)
        .bind(version.created_at)
        .bind(&version.notes)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn promote_to_default(&self, name: &str, version_id: i64) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("UPDATE prompt_versions SET is_default = 0 WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("UPDATE prompt_versions SET is_default = 1 WHERE id = ? AND name = ?")
            .bind(version_id)
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
