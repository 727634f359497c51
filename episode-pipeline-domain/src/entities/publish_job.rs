// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PublishJob` - the outcome of a `publish` stage invocation. Distinct from
//! `Episode.youtube_video_id` so a retried or partially-failed publish
//! attempt has its own record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishJobStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishJob {
    pub id: i64,
    pub episode_id: String,
    pub platform: String,
    pub external_video_id: Option<String>,
    pub status: PublishJobStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}
