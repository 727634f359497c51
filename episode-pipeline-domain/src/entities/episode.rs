// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Episode` entity. Created by the feed detector, mutated only by
//! the orchestrator (status, paths, timestamps) and the review gate service
//! (on rejection, status reverts). Never destroyed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EpisodeStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub duration_seconds: Option<u32>,
    pub source_url: String,
    pub status: EpisodeStatus,
    pub pipeline_version: i32,
    pub audio_path: Option<String>,
    pub transcript_path: Option<String>,
    pub output_dir: Option<String>,
    pub youtube_video_id: Option<String>,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>, title: impl Into<String>, source_url: impl Into<String>, pipeline_version: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            title: title.into(),
            duration_seconds: None,
            source_url: source_url.into(),
            status: EpisodeStatus::New,
            pipeline_version,
            audio_path: None,
            transcript_path: None,
            output_dir: None,
            youtube_video_id: None,
            retry_count: 0,
            error_message: None,
            detected_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: EpisodeStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
