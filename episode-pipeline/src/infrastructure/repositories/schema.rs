// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Schema migrations, applied idempotently with `CREATE TABLE IF NOT
//! EXISTS` at startup rather than through a separate migration runner -
//! the schema is small and stable enough that a numbered migration tool
//! would be more ceremony than the problem warrants.

use sqlx::SqlitePool;

use episode_pipeline_domain::PipelineError;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS channels (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        feed_url TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS episodes (
        id TEXT PRIMARY KEY,
        channel_id TEXT NOT NULL,
        title TEXT NOT NULL,
        duration_seconds INTEGER,
        source_url TEXT NOT NULL,
        status TEXT NOT NULL,
        pipeline_version INTEGER NOT NULL,
        audio_path TEXT,
        transcript_path TEXT,
        output_dir TEXT,
        youtube_video_id TEXT,
        retry_count INTEGER NOT NULL DEFAULT 0,
        error_message TEXT,
        detected_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id TEXT NOT NULL,
        stage_id TEXT NOT NULL,
        status TEXT NOT NULL,
        started_at TEXT NOT NULL,
        completed_at TEXT,
        input_tokens INTEGER,
        output_tokens INTEGER,
        estimated_cost_usd REAL NOT NULL DEFAULT 0,
        error_message TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_pipeline_runs_episode ON pipeline_runs(episode_id)",
    r#"
    CREATE TABLE IF NOT EXISTS prompt_versions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        version INTEGER NOT NULL,
        content_hash TEXT NOT NULL,
        template_path TEXT NOT NULL,
        model TEXT,
        temperature REAL,
        max_tokens INTEGER,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        notes TEXT,
        UNIQUE(name, version),
        UNIQUE(name, content_hash)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS review_tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id TEXT NOT NULL,
        stage_id TEXT NOT NULL,
        status TEXT NOT NULL,
        artifact_paths TEXT NOT NULL,
        diff_path TEXT,
        prompt_version_id INTEGER,
        created_at TEXT NOT NULL,
        reviewed_at TEXT,
        reviewer_notes TEXT,
        artifact_hash TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_review_tasks_episode_stage ON review_tasks(episode_id, stage_id)",
    r#"
    CREATE TABLE IF NOT EXISTS review_decisions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        review_task_id INTEGER NOT NULL,
        decision TEXT NOT NULL,
        notes TEXT,
        decided_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS content_artifacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id TEXT NOT NULL,
        artifact_type TEXT NOT NULL,
        file_path TEXT NOT NULL,
        model TEXT,
        prompt_hash TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_content_artifacts_episode ON content_artifacts(episode_id)",
    r#"
    CREATE TABLE IF NOT EXISTS media_assets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id TEXT NOT NULL,
        asset_type TEXT NOT NULL,
        chapter_id TEXT,
        file_path TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        duration_seconds REAL,
        metadata TEXT NOT NULL,
        prompt_version_id INTEGER,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_media_assets_episode ON media_assets(episode_id)",
    r#"
    CREATE TABLE IF NOT EXISTS publish_jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        episode_id TEXT NOT NULL,
        platform TEXT NOT NULL,
        external_video_id TEXT,
        status TEXT NOT NULL,
        uploaded_at TEXT,
        error_message TEXT
    )
    "#,
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), PipelineError> {
    for migration in MIGRATIONS {
        sqlx::query(migration).execute(pool).await.map_err(|e| PipelineError::database_error(e.to_string()))?;
    }
    Ok(())
}
