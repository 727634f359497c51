// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::MediaAssetRepository;
use episode_pipeline_domain::{MediaAsset, MediaAssetType, PipelineError};

pub struct SqliteMediaAssetRepository {
    pool: SqlitePool,
}

impl SqliteMediaAssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn type_from_str(s: &str) -> Result<MediaAssetType, PipelineError> {
    match s {
        "IMAGE" => Ok(MediaAssetType::Image),
        "AUDIO" => Ok(MediaAssetType::Audio),
        "VIDEO" => Ok(MediaAssetType::Video),
        other => Err(PipelineError::database_error(format!("unknown media asset type '{other}'"))),
    }
}

#[async_trait]
impl MediaAssetRepository for SqliteMediaAssetRepository {
    async fn insert(&self, asset: &MediaAsset) -> Result<i64, PipelineError> {
        let metadata_json = serde_json::to_string(&asset.metadata)?;
        let result = sqlx::query(
            r#"
            INSERT INTO media_assets (episode_id, asset_type, chapter_id, file_path, mime_type, size_bytes, duration_seconds, metadata, prompt_version_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&asset.episode_id)
        .bind(asset.asset_type.as_str())
        .bind(&asset.chapter_id)
        .bind(&asset.file_path)
        .bind(&asset.mime_type)
        .bind(asset.size_bytes as i64)
        .bind(asset.duration_seconds)
        .bind(metadata_json)
        .bind(asset.prompt_version_id)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<MediaAsset>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM media_assets WHERE episode_id = ? ORDER BY created_at ASC")
            .bind(episode_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| {
                let type_str: String = row.try_get("asset_type").map_err(db_err)?;
                let metadata_json: String = row.try_get("metadata").map_err(db_err)?;
                let metadata: HashMap<String, String> = serde_json::from_str(&metadata_json)?;
                Ok(MediaAsset {
                    id: row.try_get("id").map_err(db_err)?,
                    episode_id: row.try_get("episode_id").map_err(db_err)?,
                    asset_type: type_from_str(&type_str)?,
                    chapter_id: row.try_get("chapter_id").map_err(db_err)?,
                    file_path: row.try_get("file_path").map_err(db_err)?,
                    mime_type: row.try_get("mime_type").map_err(db_err)?,
                    size_bytes: row.try_get::<i64, _>("size_bytes").map_err(db_err)? as u64,
                    duration_seconds: row.try_get("duration_seconds").map_err(db_err)?,
                    metadata,
                    prompt_version_id: row.try_get("prompt_version_id").map_err(db_err)?,
                    created_at: row.try_get("created_at").map_err(db_err)?,
                })
            })
            .collect()
    }
}
