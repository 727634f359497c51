// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Stage plans. A plan is an ordered list of
//! `(stage_id, required_prior_status)` pairs; the orchestrator selects one by
//! `Episode.pipeline_version`. Plans are pure data - no I/O, no persistence -
//! so they live alongside the other domain services.

use crate::{EpisodeStatus, StageId};

/// One entry in a stage plan: the stage to run, and the episode status that
/// must hold (or be exceeded) before the stage may run with `force=false`.
#[derive(Debug, Clone, Copy)]
pub struct PlanEntry {
    pub stage_id: StageId,
    pub required_prior_status: EpisodeStatus,
}

const fn entry(stage_id: StageId, required_prior_status: EpisodeStatus) -> PlanEntry {
    PlanEntry { stage_id, required_prior_status }
}

/// The v2 stage plan: full localization pipeline with three review gates.
pub const V2_PLAN: &[PlanEntry] = &[
    entry(StageId::Download, EpisodeStatus::New),
    entry(StageId::Transcribe, EpisodeStatus::Downloaded),
    entry(StageId::Correct, EpisodeStatus::Transcribed),
    entry(StageId::ReviewGate1, EpisodeStatus::Corrected),
    entry(StageId::Translate, EpisodeStatus::Corrected),
    entry(StageId::Adapt, EpisodeStatus::Translated),
    entry(StageId::ReviewGate2, EpisodeStatus::Adapted),
    entry(StageId::Chapterize, EpisodeStatus::Adapted),
    entry(StageId::ImageGen, EpisodeStatus::Chapterized),
    entry(StageId::Tts, EpisodeStatus::ImagesGenerated),
    entry(StageId::Render, EpisodeStatus::TtsDone),
    entry(StageId::ReviewGate3, EpisodeStatus::Rendered),
    entry(StageId::Publish, EpisodeStatus::Approved),
];

/// The legacy (v1) stage plan: predates the translate/adapt localization
/// split, with a single review gate after `correct` and no gate before
/// publish.
pub const LEGACY_PLAN: &[PlanEntry] = &[
    entry(StageId::Download, EpisodeStatus::New),
    entry(StageId::Transcribe, EpisodeStatus::Downloaded),
    entry(StageId::Correct, EpisodeStatus::Transcribed),
    entry(StageId::ReviewGate1, EpisodeStatus::Corrected),
    entry(StageId::Chapterize, EpisodeStatus::Corrected),
    entry(StageId::ImageGen, EpisodeStatus::Chapterized),
    entry(StageId::Tts, EpisodeStatus::ImagesGenerated),
    entry(StageId::Render, EpisodeStatus::TtsDone),
    entry(StageId::Publish, EpisodeStatus::Rendered),
];

/// Selects the stage plan for a pipeline-version tag. Versions beyond 2 are
/// reserved for future plan shapes.
pub fn plan_for_version(pipeline_version: i32) -> Option<&'static [PlanEntry]> {
    match pipeline_version {
        1 => Some(LEGACY_PLAN),
        2 => Some(V2_PLAN),
        _ => None,
    }
}

/// The episode status a stage *produces* on success, used by the
/// orchestrator to decide whether a stage has already run this attempt.
/// Review gates don't produce a status of their own; they gate entry to the
/// following stage's status.
pub fn produced_status(plan: &[PlanEntry], index: usize) -> Option<EpisodeStatus> {
    plan.get(index + 1).map(|next| next.required_prior_status).or_else(|| {
        // Last entry: the terminal `publish` stage produces `PUBLISHED`,
        // which the orchestrator then promotes to `COMPLETED`.
        if plan.last().map(|e| e.stage_id) == Some(StageId::Publish) {
            Some(EpisodeStatus::Published)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_plan_has_three_gates() {
        let gates = V2_PLAN.iter().filter(|e| e.stage_id.is_review_gate()).count();
        assert_eq!(gates, 3);
    }

    #[test]
    fn legacy_plan_has_one_gate_and_no_translate_adapt() {
        let gates = LEGACY_PLAN.iter().filter(|e| e.stage_id.is_review_gate()).count();
        assert_eq!(gates, 1);
        assert!(!LEGACY_PLAN.iter().any(|e| e.stage_id == StageId::Translate));
        assert!(!LEGACY_PLAN.iter().any(|e| e.stage_id == StageId::Adapt));
    }

    #[test]
    fn plan_for_version_reserves_beyond_v2() {
        assert!(plan_for_version(3).is_none());
        assert!(plan_for_version(0).is_none());
    }
}
