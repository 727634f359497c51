// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use episode_pipeline_domain::repositories::ChannelRepository;
use episode_pipeline_domain::{Channel, PipelineError};

pub struct SqliteChannelRepository {
    pool: SqlitePool,
}

impl SqliteChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database_error(e.to_string())
}

fn row_to_channel(row: &sqlx::sqlite::SqliteRow) -> Result<Channel, PipelineError> {
    Ok(Channel {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        feed_url: row.try_get("feed_url").map_err(db_err)?,
        enabled: row.try_get::<i64, _>("enabled").map_err(db_err)? != 0,
    })
}

#[async_trait]
impl ChannelRepository for SqliteChannelRepository {
    async fn find_by_id(&self, channel_id: &str) -> Result<Option<Channel>, PipelineError> {
        let row = sqlx::query("SELECT * FROM channels WHERE id = ?").bind(channel_id).fetch_optional(&self.pool).await.map_err(db_err)?;
        row.as_ref().map(row_to_channel).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Channel>, PipelineError> {
        let rows = sqlx::query("SELECT * FROM channels ORDER BY id ASC").fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_channel).collect()
    }
}
