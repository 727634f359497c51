// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Episode lifecycle status.
//!
//! `EpisodeStatus` is a closed, totally ordered enumeration. The derived
//! variant order matches declaration order, which is also the pipeline-v2
//! stage order, so `status >= EpisodeStatus::Corrected` is a legal
//! pre-condition check. `FAILED` and `COST_LIMIT` are terminal error states
//! that do not participate in the "≥" comparisons pre-condition checks use;
//! callers that need that distinction should call [`EpisodeStatus::is_terminal`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EpisodeStatus {
    New,
    Downloaded,
    Transcribed,
    Corrected,
    Translated,
    Adapted,
    Chapterized,
    ImagesGenerated,
    TtsDone,
    Rendered,
    Approved,
    Published,
    Completed,
    Failed,
    CostLimit,
}

impl EpisodeStatus {
    /// Stable string name used for persistence. Column values must never
    /// change once written, so this stays decoupled from variant order.
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::New => "NEW",
            EpisodeStatus::Downloaded => "DOWNLOADED",
            EpisodeStatus::Transcribed => "TRANSCRIBED",
            EpisodeStatus::Corrected => "CORRECTED",
            EpisodeStatus::Translated => "TRANSLATED",
            EpisodeStatus::Adapted => "ADAPTED",
            EpisodeStatus::Chapterized => "CHAPTERIZED",
            EpisodeStatus::ImagesGenerated => "IMAGES_GENERATED",
            EpisodeStatus::TtsDone => "TTS_DONE",
            EpisodeStatus::Rendered => "RENDERED",
            EpisodeStatus::Approved => "APPROVED",
            EpisodeStatus::Published => "PUBLISHED",
            EpisodeStatus::Completed => "COMPLETED",
            EpisodeStatus::Failed => "FAILED",
            EpisodeStatus::CostLimit => "COST_LIMIT",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "NEW" => EpisodeStatus::New,
            "DOWNLOADED" => EpisodeStatus::Downloaded,
            "TRANSCRIBED" => EpisodeStatus::Transcribed,
            "CORRECTED" => EpisodeStatus::Corrected,
            "TRANSLATED" => EpisodeStatus::Translated,
            "ADAPTED" => EpisodeStatus::Adapted,
            "CHAPTERIZED" => EpisodeStatus::Chapterized,
            "IMAGES_GENERATED" => EpisodeStatus::ImagesGenerated,
            "TTS_DONE" => EpisodeStatus::TtsDone,
            "RENDERED" => EpisodeStatus::Rendered,
            "APPROVED" => EpisodeStatus::Approved,
            "PUBLISHED" => EpisodeStatus::Published,
            "COMPLETED" => EpisodeStatus::Completed,
            "FAILED" => EpisodeStatus::Failed,
            "COST_LIMIT" => EpisodeStatus::CostLimit,
            _ => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EpisodeStatus::Completed | EpisodeStatus::Failed | EpisodeStatus::CostLimit)
    }
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EpisodeStatus {
    type Err = crate::PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_opt(s).ok_or_else(|| crate::PipelineError::ValidationError(format!("unknown episode status: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_matches_stage_progression() {
        assert!(EpisodeStatus::New < EpisodeStatus::Downloaded);
        assert!(EpisodeStatus::Corrected < EpisodeStatus::Translated);
        assert!(EpisodeStatus::Rendered < EpisodeStatus::Approved);
        assert!(EpisodeStatus::Approved < EpisodeStatus::Published);
    }

    #[test]
    fn round_trips_through_string() {
        for s in [
            EpisodeStatus::New,
            EpisodeStatus::Chapterized,
            EpisodeStatus::CostLimit,
        ] {
            assert_eq!(EpisodeStatus::from_str_opt(s.as_str()), Some(s));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(EpisodeStatus::Completed.is_terminal());
        assert!(EpisodeStatus::Failed.is_terminal());
        assert!(EpisodeStatus::CostLimit.is_terminal());
        assert!(!EpisodeStatus::Rendered.is_terminal());
    }
}
