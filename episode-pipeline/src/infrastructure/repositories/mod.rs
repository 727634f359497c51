// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sqlite-backed implementations of the domain's repository ports, one
//! struct per port, all sharing a single `SqlitePool`.

pub mod channel_repository;
pub mod content_artifact_repository;
pub mod episode_repository;
pub mod media_asset_repository;
pub mod pipeline_run_repository;
pub mod prompt_version_repository;
pub mod publish_job_repository;
pub mod review_task_repository;
pub mod schema;

pub use channel_repository::SqliteChannelRepository;
pub use content_artifact_repository::SqliteContentArtifactRepository;
pub use episode_repository::SqliteEpisodeRepository;
pub use media_asset_repository::SqliteMediaAssetRepository;
pub use pipeline_run_repository::SqlitePipelineRunRepository;
pub use prompt_version_repository::SqlitePromptVersionRepository;
pub use publish_job_repository::SqlitePublishJobRepository;
pub use review_task_repository::SqliteReviewTaskRepository;
pub use schema::run_migrations;
