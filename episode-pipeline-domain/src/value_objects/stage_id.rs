// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Stage identifiers. Unlike a [`crate::EpisodeId`] these are a small closed
//! set known at compile time, so the value object is a plain enum rather
//! than a generated id - generated identity (`ulid`-backed ids) is reserved
//! for entities, while catalog-like identifiers (stage names) stay enums.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    Download,
    Transcribe,
    Correct,
    ReviewGate1,
    Translate,
    Adapt,
    ReviewGate2,
    Chapterize,
    ImageGen,
    Tts,
    Render,
    ReviewGate3,
    Publish,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Download => "download",
            StageId::Transcribe => "transcribe",
            StageId::Correct => "correct",
            StageId::ReviewGate1 => "review_gate_1",
            StageId::Translate => "translate",
            StageId::Adapt => "adapt",
            StageId::ReviewGate2 => "review_gate_2",
            StageId::Chapterize => "chapterize",
            StageId::ImageGen => "imagegen",
            StageId::Tts => "tts",
            StageId::Render => "render",
            StageId::ReviewGate3 => "review_gate_3",
            StageId::Publish => "publish",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "download" => StageId::Download,
            "transcribe" => StageId::Transcribe,
            "correct" => StageId::Correct,
            "review_gate_1" => StageId::ReviewGate1,
            "translate" => StageId::Translate,
            "adapt" => StageId::Adapt,
            "review_gate_2" => StageId::ReviewGate2,
            "chapterize" => StageId::Chapterize,
            "imagegen" => StageId::ImageGen,
            "tts" => StageId::Tts,
            "render" => StageId::Render,
            "review_gate_3" => StageId::ReviewGate3,
            "publish" => StageId::Publish,
            _ => return None,
        })
    }

    /// The review-gate stage that precedes this stage's review, if any -
    /// used to map a gate's stage identifier to the underlying reviewed
    /// stage (`correct`, `adapt`, `render`) stored in `ReviewTask.stage_id`.
    pub fn is_review_gate(&self) -> bool {
        matches!(self, StageId::ReviewGate1 | StageId::ReviewGate2 | StageId::ReviewGate3)
    }

    /// The reviewed-stage name a gate corresponds to, matching the
    /// `ReviewTask.stage_id` values (`correct | adapt | render`).
    pub fn gated_stage(&self) -> Option<&'static str> {
        match self {
            StageId::ReviewGate1 => Some("correct"),
            StageId::ReviewGate2 => Some("adapt"),
            StageId::ReviewGate3 => Some("render"),
            _ => None,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
