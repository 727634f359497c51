// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Generates one cover image per chapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::repositories::PromptVersionRepository;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};
use serde::Deserialize;

use super::support::{resolve_default_prompt, StageSupport};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::provenance_writer::{model_params_from_prompt, ProvenanceRecord};

const STAGE: &str = "imagegen";

#[derive(Deserialize)]
struct ChapterManifest {
    chapter_ids: Vec<String>,
}

pub struct ImageGenAdapter {
    support: StageSupport,
    prompt_repo: Arc<dyn PromptVersionRepository>,
    registry: Arc<PromptRegistry>,
}

impl ImageGenAdapter {
    pub fn new(support: StageSupport, prompt_repo: Arc<dyn PromptVersionRepository>, registry: Arc<PromptRegistry>) -> Self {
        Self { support, prompt_repo, registry }
    }
}

#[async_trait]
impl StageAdapter for ImageGenAdapter {
    fn stage_id(&self) -> StageId {
        StageId::ImageGen
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let (prompt_version, body) = resolve_default_prompt(self.prompt_repo.as_ref(), &self.registry, STAGE).await?;
        let manifest_path = self.support.store.images_manifest(&ctx.episode.id);

        let needs_run = self
            .support
            .needs_run_with_prompt(&ctx.episode.id, "images", &manifest_path, &prompt_version.content_hash, ctx.force)
            .await?;
        if !needs_run {
            return Ok(StageResult::skipped("images already generated for this prompt"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let chapters_path = self.support.store.chapters_json(&ctx.episode.id);
        let chapters: ChapterManifest = serde_json::from_str(&self.support.store.read_text(&chapters_path)?)?;

        let mut output_files = Vec::new();
        for chapter_id in &chapters.chapter_ids {
            let mut vars = HashMap::new();
            vars.insert("chapter".to_string(), chapter_id.clone());
            let prompt = PromptRegistry::render(&body, &vars);
            let image_path = self.support.store.image(&ctx.episode.id, chapter_id);
            self.support.store.write(&image_path, prompt.as_bytes())?;
            output_files.push(self.support.file_ref(&image_path)?);
        }

        self.support.store.write_text(&manifest_path, &serde_json::to_string_pretty(&chapters.chapter_ids)?)?;
        self.support
            .record_artifact(&ctx.episode.id, "images", &manifest_path, prompt_version.model.as_deref(), Some(&prompt_version.content_hash))
            .await?;

        let cost = 0.02 * chapters.chapter_ids.len() as f64;
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
                input_files: vec![self.support.file_ref(&chapters_path)?],
                output_files,
                input_tokens: None,
                output_tokens: None,
                cost_usd: Some(cost),
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("generated chapter images", EpisodeStatus::ImagesGenerated).with_cost(cost))
    }
}
