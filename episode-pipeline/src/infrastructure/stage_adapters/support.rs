// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared plumbing every stage adapter leans on: deciding whether there's
//! actually anything new to do, and recording the artifact/provenance pair
//! that results when there is.

use std::sync::Arc;

use chrono::Utc;
use episode_pipeline_domain::repositories::{ContentArtifactRepository, PromptVersionRepository};
use episode_pipeline_domain::services::{ContentHasher, Sha256ContentHasher};
use episode_pipeline_domain::{ContentArtifact, PipelineError};

use crate::infrastructure::artifact_store::ArtifactStore;
use crate::infrastructure::prompt_registry::PromptRegistry;
use crate::infrastructure::provenance_writer::{FileRef, ProvenanceRecord, ProvenanceWriter};

pub struct StageSupport {
    pub store: Arc<ArtifactStore>,
    pub content_repo: Arc<dyn ContentArtifactRepository>,
    pub hasher: Sha256ContentHasher,
}

impl StageSupport {
    pub fn new(store: Arc<ArtifactStore>, content_repo: Arc<dyn ContentArtifactRepository>) -> Self {
        Self { store, content_repo, hasher: Sha256ContentHasher }
    }

    /// No prompt involved: the output is stale (missing or explicitly
    /// invalidated) or the caller forced it.
    pub fn needs_run(&self, output_path: &str, force: bool) -> bool {
        force || self.store.is_stale(output_path)
    }

    /// Prompt-driven stages additionally re-run when the default prompt's
    /// content hash has moved on since the artifact on file was produced -
    /// a prompt version swap invalidates every downstream artifact it feeds.
    pub async fn needs_run_with_prompt(
        &self,
        episode_id: &str,
        artifact_type: &str,
        output_path: &str,
        current_prompt_hash: &str,
        force: bool,
    ) -> Result<bool, PipelineError> {
        if force || self.store.is_stale(output_path) {
            return Ok(true);
        }
        let artifacts = self.content_repo.find_by_episode(episode_id).await?;
        let last = artifacts.iter().rev().find(|a| a.artifact_type == artifact_type);
        Ok(match last {
            Some(a) => a.prompt_hash.as_deref() != Some(current_prompt_hash),
            None => true,
        })
    }

    pub async fn record_artifact(
        &self,
        episode_id: &str,
        artifact_type: &str,
        file_path: &str,
        model: Option<&str>,
        prompt_hash: Option<&str>,
    ) -> Result<(), PipelineError> {
        self.content_repo
            .insert(&ContentArtifact {
                id: 0,
                episode_id: episode_id.to_string(),
                artifact_type: artifact_type.to_string(),
                file_path: file_path.to_string(),
                model: model.map(str::to_string),
                prompt_hash: prompt_hash.map(str::to_string),
                created_at: Utc::now(),
            })
            .await
            .map(|_| ())
    }

    pub fn write_provenance(
        &self,
        episode_id: &str,
        stage: &str,
        record: ProvenanceRecord,
    ) -> Result<(), PipelineError> {
        ProvenanceWriter::new(&self.store).write(&record)?;
        let _ = (episode_id, stage);
        Ok(())
    }

    /// Hashes the file at `relative` (resolved against the artifact store's
    /// data root) and pairs it with its path, the shape every provenance
    /// record's `input_files`/`output_files` entries take.
    pub fn file_ref(&self, relative: &str) -> Result<FileRef, PipelineError> {
        let hash = self.hasher.hash_file(&self.store.data_root().join(relative))?;
        Ok(FileRef { path: relative.to_string(), hash: hash.as_str().to_string() })
    }
}

/// Resolves the active prompt for a stage: the default version if one is
/// registered, else an error - every prompt-driven stage requires a default
/// to exist before it can run.
pub async fn resolve_default_prompt(
    prompt_repo: &dyn PromptVersionRepository,
    registry: &PromptRegistry,
    stage: &str,
) -> Result<(episode_pipeline_domain::PromptVersion, String), PipelineError> {
    let version = prompt_repo
        .find_default(stage)
        .await?
        .ok_or_else(|| PipelineError::NoDefault(stage.to_string()))?;
    let template = registry.load_template(stage, &format!("v{}", version.version))?;
    Ok((version, template.body))
}

/// Registers the template at `name/version_label` as a `PromptVersion`,
/// deduping on `(name, content_hash)`: a body byte-identical to one already
/// registered returns that existing record untouched. Otherwise inserts a
/// new record one past the highest version on file for `name`, marking it
/// the default when it's the first version registered for that name.
/// `model`/`temperature`/`max_tokens` come from the template's frontmatter,
/// not from the caller.
pub async fn register_version(
    prompt_repo: &dyn PromptVersionRepository,
    registry: &PromptRegistry,
    name: &str,
    version_label: &str,
) -> Result<episode_pipeline_domain::PromptVersion, PipelineError> {
    let template = registry.load_template(name, version_label)?;
    let content_hash = template.content_hash.as_str().to_string();

    if let Some(existing) = prompt_repo.find_by_name_and_hash(name, &content_hash).await? {
        return Ok(existing);
    }

    let current_max = prompt_repo.max_version(name).await?;
    let version = episode_pipeline_domain::PromptVersion {
        id: 0,
        name: name.to_string(),
        version: current_max + 1,
        content_hash,
        template_path: format!("{name}/{version_label}.md"),
        model: template.model,
        temperature: template.temperature,
        max_tokens: template.max_tokens,
        is_default: current_max == 0,
        created_at: Utc::now(),
        notes: None,
    };
    let id = prompt_repo.insert(&version).await?;
    Ok(episode_pipeline_domain::PromptVersion { id, ..version })
}

#[cfg(test)]
mod tests {
    use super::*;
    use episode_pipeline_domain::PromptVersion;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePromptRepo {
        versions: Mutex<Vec<PromptVersion>>,
        next_id: Mutex<i64>,
    }

    #[async_trait::async_trait]
    impl PromptVersionRepository for FakePromptRepo {
        async fn find_by_name_and_hash(&self, name: &str, content_hash: &str) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(self.versions.lock().unwrap().iter().find(|v| v.name == name && v.content_hash == content_hash).cloned())
        }
        async fn find_default(&self, name: &str) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(self.versions.lock().unwrap().iter().find(|v| v.name == name && v.is_default).cloned())
        }
        async fn find_history(&self, name: &str) -> Result<Vec<PromptVersion>, PipelineError> {
            Ok(self.versions.lock().unwrap().iter().filter(|v| v.name == name).cloned().collect())
        }
        async fn find_by_id(&self, id: i64) -> Result<Option<PromptVersion>, PipelineError> {
            Ok(self.versions.lock().unwrap().iter().find(|v| v.id == id).cloned())
        }
        async fn max_version(&self, name: &str) -> Result<i32, PipelineError> {
            Ok(self.versions.lock().unwrap().iter().filter(|v| v.name == name).map(|v| v.version).max().unwrap_or(0))
        }
        async fn insert(&self, version: &PromptVersion) -> Result<i64, PipelineError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let mut versions = self.versions.lock().unwrap();
            if version.is_default {
                for v in versions.iter_mut().filter(|v| v.name == version.name) {
                    v.is_default = false;
                }
            }
            let mut version = version.clone();
            version.id = *next_id;
            versions.push(version);
            Ok(*next_id)
        }
        async fn promote_to_default(&self, name: &str, version_id: i64) -> Result<(), PipelineError> {
            let mut versions = self.versions.lock().unwrap();
            for v in versions.iter_mut().filter(|v| v.name == name) {
                v.is_default = v.id == version_id;
            }
            Ok(())
        }
    }

    fn write_template(dir: &std::path::Path, name: &str, version_label: &str, content: &str) {
        let stage_dir = dir.join(name);
        std::fs::create_dir_all(&stage_dir).unwrap();
        std::fs::write(stage_dir.join(format!("{version_label}.md")), content).unwrap();
    }

    #[tokio::test]
    async fn first_registration_of_a_name_becomes_the_default() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "correct_transcript", "v1", "---\nmodel: gpt-4o\n---\nfix: {{ transcript }}");
        let registry = PromptRegistry::new(dir.path());
        let repo = FakePromptRepo::default();

        let version = register_version(&repo, &registry, "correct_transcript", "v1").await.unwrap();
        assert_eq!(version.version, 1);
        assert!(version.is_default);
        assert_eq!(version.model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn registering_identical_bytes_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "correct_transcript", "v1", "fix: {{ transcript }}");
        let registry = PromptRegistry::new(dir.path());
        let repo = FakePromptRepo::default();

        let first = register_version(&repo, &registry, "correct_transcript", "v1").await.unwrap();
        let second = register_version(&repo, &registry, "correct_transcript", "v1").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.version, second.version);
        assert_eq!(first.is_default, second.is_default);
        assert_eq!(repo.versions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn a_later_version_with_new_bytes_is_not_made_default() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path(), "correct_transcript", "v1", "fix v1: {{ transcript }}");
        write_template(dir.path(), "correct_transcript", "v2", "fix v2: {{ transcript }}");
        let registry = PromptRegistry::new(dir.path());
        let repo = FakePromptRepo::default();

        register_version(&repo, &registry, "correct_transcript", "v1").await.unwrap();
        let second = register_version(&repo, &registry, "correct_transcript", "v2").await.unwrap();

        assert_eq!(second.version, 2);
        assert!(!second.is_default);
    }
}
