// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Synthesizes narration audio for each chapter.

use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::repositories::PromptVersionRepository;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};
use serde::Deserialize;

use super::support::{resolve_default_prompt, StageSupport};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::provenance_writer::{model_params_from_prompt, ProvenanceRecord};

const STAGE: &str = "tts";

#[derive(Deserialize)]
struct ChapterManifest {
    chapter_ids: Vec<String>,
}

pub struct TtsAdapter {
    support: StageSupport,
    prompt_repo: Arc<dyn PromptVersionRepository>,
    registry: Arc<PromptRegistry>,
}

impl TtsAdapter {
    pub fn new(support: StageSupport, prompt_repo: Arc<dyn PromptVersionRepository>, registry: Arc<PromptRegistry>) -> Self {
        Self { support, prompt_repo, registry }
    }
}

#[async_trait]
impl StageAdapter for TtsAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Tts
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let (prompt_version, _body) = resolve_default_prompt(self.prompt_repo.as_ref(), &self.registry, STAGE).await?;
        let manifest_path = self.support.store.tts_manifest(&ctx.episode.id);

        let needs_run = self
            .support
            .needs_run_with_prompt(&ctx.episode.id, "tts", &manifest_path, &prompt_version.content_hash, ctx.force)
            .await?;
        if !needs_run {
            return Ok(StageResult::skipped("narration already synthesized for this prompt"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let chapters_path = self.support.store.chapters_json(&ctx.episode.id);
        let chapters: ChapterManifest = serde_json::from_str(&self.support.store.read_text(&chapters_path)?)?;
        let (source, script) = self.script_for(&ctx.episode.id)?;

        let mut output_files = Vec::new();
        for chapter_id in &chapters.chapter_ids {
            let audio_path = self.support.store.tts_audio(&ctx.episode.id, chapter_id);
            self.support.store.write(&audio_path, format!("narration:{chapter_id}:{script}").as_bytes())?;
            output_files.push(self.support.file_ref(&audio_path)?);
        }

        self.support.store.write_text(&manifest_path, &serde_json::to_string_pretty(&chapters.chapter_ids)?)?;
        self.support
            .record_artifact(&ctx.episode.id, "tts", &manifest_path, prompt_version.model.as_deref(), Some(&prompt_version.content_hash))
            .await?;

        let cost = 0.04 * chapters.chapter_ids.len() as f64;
        self.support.write_provenance(
            &ctx.episode.id,
            STAGE,
            ProvenanceRecord {
                stage: STAGE.to_string(),
                episode_id: ctx.episode.id.clone(),
                timestamp: chrono::Utc::now(),
                prompt_name: Some(STAGE.to_string()),
                prompt_version: Some(prompt_version.version),
                prompt_hash: Some(prompt_version.content_hash.clone()),
                model: prompt_version.model.clone(),
                model_params: model_params_from_prompt(prompt_version.temperature, prompt_version.max_tokens),
                input_files: vec![self.support.file_ref(&source)?],
                output_files,
                input_tokens: None,
                output_tokens: None,
                cost_usd: Some(cost),
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("synthesized narration", EpisodeStatus::TtsDone).with_cost(cost))
    }
}

impl TtsAdapter {
    fn script_for(&self, episode_id: &str) -> Result<(String, String), PipelineError> {
        let adapted = self.support.store.script_adapted(episode_id);
        let corrected = self.support.store.transcript_corrected(episode_id);
        let source = if self.support.store.exists(&adapted) { adapted } else { corrected };
        let text = self.support.store.read_text(&source)?;
        Ok((source, text))
    }
}
