// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Composites narration, images and chapter timing into a draft video.
//! Records the draft's content hash in a provenance record - `publish`
//! re-hashes the file at publish time and refuses to proceed if it moved.

use async_trait::async_trait;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::StageSupport;
use crate::infrastructure::provenance_writer::ProvenanceRecord;

const STAGE: &str = "render";

pub struct RenderAdapter {
    support: StageSupport,
}

impl RenderAdapter {
    pub fn new(support: StageSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl StageAdapter for RenderAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Render
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let output = self.support.store.draft_video(&ctx.episode.id);
        if !self.support.needs_run(&output, ctx.force) {
            return Ok(StageResult::skipped("draft video already rendered"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let images_manifest = self.support.store.images_manifest(&ctx.episode.id);
        let chapter_ids: Vec<String> = serde_json::from_str(&self.support.store.read_text(&images_manifest)?)?;

        let mut segments = Vec::new();
        let mut input_files = Vec::new();
        for chapter_id in &chapter_ids {
            let image = self.support.store.image(&ctx.episode.id, chapter_id);
            let audio = self.support.store.tts_audio(&ctx.episode.id, chapter_id);
            let image_bytes = self.support.store.read_bytes(&image)?;
            let audio_bytes = self.support.store.read_bytes(&audio)?;
            input_files.push(self.support.file_ref(&image)?);
            input_files.push(self.support.file_ref(&audio)?);
            let segment_path = self.support.store.render_segment(&ctx.episode.id, chapter_id);
            let mut segment = image_bytes;
            segment.extend_from_slice(&audio_bytes);
            self.support.store.write(&segment_path, &segment)?;
            segments.push(segment_path);
        }

        let mut draft = Vec::new();
        for segment_path in &segments {
            draft.extend_from_slice(&self.support.store.read_bytes(segment_path)?);
        }
        self.support.store.write(&output, &draft)?;
        self.support
            .store
            .write_text(&self.support.store.render_manifest(&ctx.episode.id), &serde_json::to_string_pretty(&segments)?)?;
        self.support.record_artifact(&ctx.episode.id, "draft_video", &output, None, None).await?;

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
                input_files,
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("rendered draft video", EpisodeStatus::Rendered))
    }
}
