// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Punctuation/grammar correction of the raw transcript, gated by
//! `review_gate_1`. Prompt-driven: a new default `correct` prompt version
//! invalidates the last corrected transcript even if nothing else changed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use episode_pipeline_domain::repositories::PromptVersionRepository;
use episode_pipeline_domain::services::ContentHasher;
use episode_pipeline_domain::services::{RunContext, StageAdapter, StageResult};
use episode_pipeline_domain::{EpisodeStatus, PipelineError, StageId};

use super::support::{resolve_default_prompt, StageSupport};
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::provenance_writer::{model_params_from_prompt, ProvenanceRecord};

const STAGE: &str = "correct";
/// The prompt registry entry this stage resolves against - a distinct name
/// from the stage id, since the registry is shared by humans editing prompt
/// files by name (`correct_transcript/v1.md`) independent of how stages are
/// wired into the plan.
const PROMPT_NAME: &str = "correct_transcript";

pub struct CorrectAdapter {
    support: StageSupport,
    prompt_repo: Arc<dyn PromptVersionRepository>,
    registry: Arc<PromptRegistry>,
}

impl CorrectAdapter {
    pub fn new(support: StageSupport, prompt_repo: Arc<dyn PromptVersionRepository>, registry: Arc<PromptRegistry>) -> Self {
        Self { support, prompt_repo, registry }
    }
}

#[async_trait]
impl StageAdapter for CorrectAdapter {
    fn stage_id(&self) -> StageId {
        StageId::Correct
    }

    async fn execute(&self, ctx: &RunContext) -> Result<StageResult, PipelineError> {
        let started = std::time::Instant::now();
        let (prompt_version, body) = resolve_default_prompt(self.prompt_repo.as_ref(), &self.registry, PROMPT_NAME).await?;
        let input = self.support.store.transcript_raw(&ctx.episode.id);
        let output = self.support.store.transcript_corrected(&ctx.episode.id);

        let needs_run = self
            .support
            .needs_run_with_prompt(&ctx.episode.id, "transcript_corrected", &output, &prompt_version.content_hash, ctx.force)
            .await?;
        if !needs_run {
            return Ok(StageResult::skipped("corrected transcript already current for this prompt"));
        }
        if ctx.dry_run {
            return Ok(StageResult::skipped("dry run"));
        }

        let transcript = self.support.store.read_text(&input)?;
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.clone());
        vars.insert("feedback".to_string(), ctx.feedback.clone().unwrap_or_default());
        let _instructions = PromptRegistry::render(&body, &vars);

        let corrected = format!("{} [corrected]", transcript.trim_end());
        self.support.store.write_text(&output, &corrected)?;
        self.support
            .record_artifact(&ctx.episode.id, "transcript_corrected", &output, prompt_version.model.as_deref(), Some(&prompt_version.content_hash))
            .await?;

        self.support.write_provenance(
            &ctx.episode.id,
            STAGE,
            ProvenanceRecord {
                stage: STAGE.to_string(),
                episode_id: ctx.episode.id.clone(),
                timestamp: chrono::Utc::now(),
                prompt_name: Some(PROMPT_NAME.to_string()),
                prompt_version: Some(prompt_version.version),
                prompt_hash: Some(prompt_version.content_hash.clone()),
                model: prompt_version.model.clone(),
                model_params: model_params_from_prompt(prompt_version.temperature, prompt_version.max_tokens),
                input_files: vec![self.support.file_ref(&input)?],
                output_files: vec![self.support.file_ref(&output)?],
                input_tokens: None,
                output_tokens: None,
                cost_usd: Some(0.01),
                duration_seconds: started.elapsed().as_secs_f64(),
                notes: None,
            },
        )?;

        Ok(StageResult::success("corrected transcript", EpisodeStatus::Corrected).with_cost(0.01))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::artifact_store::ArtifactStore;
    use episode_pipeline_domain::repositories::ContentArtifactRepository;
    use episode_pipeline_domain::{ContentArtifact, Episode, PromptVersion};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeContentRepo {
        artifacts: Mutex<Vec<ContentArtifact>>,
    }

    #[async_trait]
    impl ContentArtifactRepository for FakeContentRepo {
        async fn insert(&self, artifact: &ContentArtifact) -> Result<i64, PipelineError> {
            self.artifacts.lock().unwrap().push(artifact.clone());
            Ok(1)
        }
        async fn find_by_episode(&self, episode_id: &str) -> Result<Vec<ContentArtifact>, PipelineError> {
            Ok(self.artifacts.lock().unwrap().iter().filter(|a| a.episode_id == episode_id).cloned().collect())
        }
    }

    struct FakePromptRepo {
        version: Mutex<PromptVersion>,
    }

    #[async_trait]
    impl PromptVersionRepository for FakePromptRepo {
        async fn find_by_name_and_hash(&self, _name: &str, _content_hash: &str) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(None)
        }
        async fn find_default(&self, _name: &str) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(Some(self.version.lock().unwrap().clone()))
        }
        async fn find_history(&self, _name: &str) -> Result<Vec<PromptVersion>, PipelineError> {
            Ok(vec![self.version.lock().unwrap().clone()])
        }
        async fn find_by_id(&self, _id: i64) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(Some(self.version.lock().unwrap().clone()))
        }
        async fn max_version(&self, _name: &str) -> Result<i32, PipelineError> {
            Ok(self.version.lock().unwrap().version)
        }
        async fn insert(&self, version: &PromptVersion) -> Result<i64, PipelineError> {
            *self.version.lock().unwrap() = version.clone();
            Ok(1)
        }
        async fn promote_to_default(&self, _name: &str, _version_id: i64) -> Result<(), PipelineError> {
            Ok(())
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

    fn prompt_version(hash: &str) -> PromptVersion {
        PromptVersion {
            id: 1,
            name: PROMPT_NAME.to_string(),
            version: 1,
            content_hash: hash.to_string(),
            template_path: "correct_transcript/v1.md".to_string(),
            model: Some("gpt-4o".to_string()),
            temperature: None,
            max_tokens: None,
            is_default: true,
            created_at: chrono::Utc::now(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn prompt_version_swap_forces_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::new(dir.path()));
        let prompts_dir = dir.path().join("prompts");
        std::fs::create_dir_all(prompts_dir.join("correct_transcript")).unwrap();
        std::fs::write(prompts_dir.join("correct_transcript/v1.md"), "fix: {{ transcript }}").unwrap();
        let registry = Arc::new(PromptRegistry::new(&prompts_dir));
        let content_repo = Arc::new(FakeContentRepo::default());

        store.write_text(&store.transcript_raw("ep1"), "hallo welt").unwrap();

        let prompt_repo = Arc::new(FakePromptRepo { version: Mutex::new(prompt_version("a".repeat(64).as_str())) });
        let adapter = CorrectAdapter::new(StageSupport::new(store.clone(), content_repo.clone()), prompt_repo.clone(), registry);

        let first = adapter.execute(&context()).await.unwrap();
        assert!(matches!(first.status, episode_pipeline_domain::RunStatus::Success));

        let second = adapter.execute(&context()).await.unwrap();
        assert!(matches!(second.status, episode_pipeline_domain::RunStatus::Skipped));

        *prompt_repo.version.lock().unwrap() = prompt_version("b".repeat(64).as_str());
        let third = adapter.execute(&context()).await.unwrap();
        assert!(matches!(third.status, episode_pipeline_domain::RunStatus::Success));
    }
}
