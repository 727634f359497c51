// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Speech-to-text, German source audio in, raw transcript out. Swapping in a
//! real ASR client is a matter of replacing the body of `execute`.

use async_trait::async_trait;
use episode_pipeline_domain::services::ContentHasher;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::StageSupport;
use crate::infrastructure::provenance_writer::ProvenanceRecord;

const STAGE: &str = "transcribe";

pub struct TranscribeAdapter {
    support: StageSupport,
}

impl TranscribeAdapter {
    pub fn new(support: StageSupport) -> Self {
        Self { support }
    }
}

#[async_trait]
impl StageAdapter for TranscribeAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Transcribe
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let input = self.support.store.raw_audio(&ctx.episode.id);
        let output = self.support.store.transcript_raw(&ctx.episode.id);
        if !self.support.needs_run(&output, ctx.force) {
            return Ok(StageResult::skipped("transcript already present"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let audio = self.support.store.read_bytes(&input)?;
        let audio_hash = self.support.hasher.hash_bytes(&audio);
        let transcript = format!("[transcript of audio {audio_hash}]");
        self.support.store.write_text(&output, &transcript)?;
        self.support.record_artifact(&ctx.episode.id, "transcript_raw", &output, None, None).await?;

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
                input_files: vec![self.support.file_ref(&input)?],
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("transcribed audio", EpisodeStatus::Transcribed))
    }
}
