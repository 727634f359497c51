// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fetches the source audio for an episode. The actual HTTP/feed client is
//! an infrastructure concern a production deployment swaps in here; this
//! stub writes a deterministic placeholder so the rest of the pipeline has
//! something real to hash and pass along.

use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::StageSupport;
use crate::infrastructure::provenance_writer::ProvenanceRecord;

const STAGE: &str = "download";

pub struct DownloadAdapter {
    support: StageSupport,
}

impl DownloadAdapter {
    pub fn new(support: StageSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl StageAdapter for DownloadAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Download
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let output = self.support.store.raw_audio(&ctx.episode.id);
        if !self.support.needs_run(&output, ctx.force) {
            return Ok(StageResult::skipped("audio already downloaded"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let placeholder = format!("audio-bytes-for:{}", ctx.episode.source_url);
        self.support.store.write(&output, placeholder.as_bytes())?;
        self.support.record_artifact(&ctx.episode.id, "audio", &output, None, None).await?;

        self.support.write_provenance(
            &ctx.episode.id,
            STAGE,
            ProvenanceRecord {
                stage: STAGE.to_string(),
                episode_id: ctx.episode.id.clone(),
                timestamp: chrono::Utc::now(),
                prompt_name: None,
                prompt_version: None,
                prompt_hash: None,
                model: None,
                model_params: None,
                input_files: vec![],
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: Some(ctx.episode.source_url.clone()),
            },
        )?;

        Ok(StageResult::success("downloaded source audio", EpisodeStatus::Downloaded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::artifact_store::ArtifactStore;
    use episode_pipeline_domain::repositories::ContentArtifactRepository;
    use episode_pipeline_domain::Episode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeContentRepo {
        artifacts: Mutex<Vec<episode_pipeline_domain::ContentArtifact>>,
    }

    #[async_trait]
    impl ContentArtifactRepository for FakeContentRepo {
        async fn insert(&self, artifact: &episode_pipeline_domain::ContentArtifact) -> Result<i64, PipelineError> {
            self.artifacts.lock().unwrap().push(artifact.clone());
            Ok(1)
        }
        async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<episode_pipeline_domain::ContentArtifact>, PipelineError> {
            Ok(self.artifacts.lock().unwrap().iter().filter(|a| a.episode_id == episode_id).cloned().collect())
        }
    }

    fn context() -> RunContext {
        RunContext {
            episode: Episode::new("ep1", "chan1", "Title", "https://example.test/ep1.mp3", 2, chrono::Utc::now()),
            force: false,
            dry_run: false,
            max_episode_cost_usd: 5.0,
            max_retries: 3,
            feedback: None,
        }
    }

    #[tokio::test]
    async fn downloads_then_skips_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let content_repo = Arc::new(FakeContentRepo::default());
        let adapter = DownloadAdapter::new(StageSupport::new(store, content_repo));

        let first = adapter.execute(&context()).await.unwrap();
        assert!(matches!(first.status, episode_pipeline_domain::RunStatus::Success));

        let second = adapter.execute(&context()).await.unwrap();
        assert!(matches!(second.status, episode_pipeline_domain::RunStatus::Skipped));
    }
}
