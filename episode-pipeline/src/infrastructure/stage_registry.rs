// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Builds the `StageId -> StageAdapter` map the orchestrator dispatches
//! through, and exposes the stage plan selected by an episode's
//! `pipeline_version`.

use std::collections::HashMap;
use std::sync::Arc;

use episode_pipeline_domain::repositories::{ContentArtifactRepository, PromptVersionRepository};
use episode_pipeline_domain::services::{plan_for_version, PlanEntry, StageAdapter};
use episode_pipeline_domain::StageId;

use super::artifact_store::ArtifactStore;
use super::prompt_registry::PromptRegistry;
use super::review_gate_service::ReviewGateService;
use super::stage_adapters::{
    support::StageSupport, AdaptAdapter, ChapterizeAdapter, CorrectAdapter, DownloadAdapter, ImageGenAdapter,
    PublishAdapter, RenderAdapter, ReviewGateAdapter, TranscribeAdapter, TranslateAdapter, TtsAdapter,
};

pub struct StageRegistry {
    adapters: HashMap<StageId, Arc<dyn StageAdapter>>,
}

impl StageRegistry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<ArtifactStore>,
        content_repo: Arc<dyn ContentArtifactRepository>,
        prompt_repo: Arc<dyn PromptVersionRepository>,
        prompt_registry: Arc<PromptRegistry>,
        review_gate_service: Arc<ReviewGateService>,
    ) -> Self {
        let support = || StageSupport::new(store.clone(), content_repo.clone());

        let mut adapters: HashMap<StageId, Arc<dyn StageAdapter>> = HashMap::new();
        adapters.insert(StageId::Download, Arc::new(DownloadAdapter::new(support())));
        adapters.insert(StageId::Transcribe, Arc::new(TranscribeAdapter::new(support())));
        adapters.insert(
            StageId::Correct,
            Arc::new(CorrectAdapter::new(support(), prompt_repo.clone(), prompt_registry.clone())),
        );
        adapters.insert(
            StageId::Translate,
            Arc::new(TranslateAdapter::new(support(), prompt_repo.clone(), prompt_registry.clone())),
        );
        adapters.insert(
            StageId::Adapt,
            Arc::new(AdaptAdapter::new(support(), prompt_repo.clone(), prompt_registry.clone())),
        );
        adapters.insert(StageId::Chapterize, Arc::new(ChapterizeAdapter::new(support())));
        adapters.insert(
            StageId::ImageGen,
            Arc::new(ImageGenAdapter::new(support(), prompt_repo.clone(), prompt_registry.clone())),
        );
        adapters.insert(StageId::Tts, Arc::new(TtsAdapter::new(support(), prompt_repo.clone(), prompt_registry)));
        adapters.insert(StageId::Render, Arc::new(RenderAdapter::new(support())));
        adapters.insert(StageId::Publish, Arc::new(PublishAdapter::new(support(), review_gate_service.clone())));

        for gate in [StageId::ReviewGate1, StageId::ReviewGate2, StageId::ReviewGate3] {
            adapters.insert(gate, Arc::new(ReviewGateAdapter::new(gate, review_gate_service.clone(), store.clone())));
        }

        Self { adapters }
    }

    pub fn get(&self, stage_id: StageId) -> Option<Arc<dyn StageAdapter>> {
        self.adapters.get(&stage_id).cloned()
    }

    pub fn plan_for(&self, pipeline_version: i32) -> Option<&'static [PlanEntry]> {
        plan_for_version(pipeline_version)
    }
}
