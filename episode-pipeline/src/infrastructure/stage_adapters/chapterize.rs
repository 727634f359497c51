// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Splits the episode's script into chapters. Algorithmic rather than
//! prompt-driven: reachable from either the adapted script (v2) or the
//! corrected transcript directly (legacy, no translate/adapt).

use async_trait::async_trait;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};
use serde::Serialize;

use super::support::StageSupport;
use crate::infrastructure::provenance_writer::ProvenanceRecord;

const STAGE: &str = "chapterize";

#[derive(Serialize)]
struct ChapterManifest {
    chapter_ids: Vec<String>,
}

pub struct ChapterizeAdapter {
    support: StageSupport,
}

impl ChapterizeAdapter {
    pub fn new(support: StageSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl StageAdapter for ChapterizeAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Chapterize
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let output = self.support.store.chapters_json(&ctx.episode.id);
        if !self.support.needs_run(&output, ctx.force) {
            return Ok(StageResult::skipped("chapters already generated"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let adapted = self.support.store.script_adapted(&ctx.episode.id);
        let corrected = self.support.store.transcript_corrected(&ctx.episode.id);
        let source = if self.support.store.exists(&adapted) { adapted } else { corrected };
        let text = self.support.store.read_text(&source)?;

        let chapter_ids: Vec<String> = text
            .split("\n\n")
            .enumerate()
            .map(|(i, _)| format!("ch{}", i + 1))
            .collect();
        let chapter_ids = if chapter_ids.is_empty() { vec!["ch1".to_string()] } else { chapter_ids };

        let manifest = ChapterManifest { chapter_ids };
        self.support.store.write_text(&output, &serde_json::to_string_pretty(&manifest)?)?;
        self.support.record_artifact(&ctx.episode.id, "chapters", &output, None, None).await?;

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
                input_files: vec![self.support.file_ref(&source)?],
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("split episode into chapters", EpisodeStatus::Chapterized))
    }
}
