// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ReviewTask` and `ReviewDecision`. A task's `artifact_hash` is only set
//! on approval and binds the approval to exactly those bytes, giving
//! tamper detection a fixed reference point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReviewDecisionKind, ReviewStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTask {
    pub id: i64,
    pub episode_id: String,
    pub stage_id: String,
    pub status: ReviewStatus,
    pub artifact_paths: Vec<String>,
    pub diff_path: Option<String>,
    pub prompt_version_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_notes: Option<String>,
    pub artifact_hash: Option<String>,
}

impl ReviewTask {
    /// The primary artifact for the task: the first entry in
    /// `artifact_paths`, which approval hashes to produce the
    /// tamper-evident `artifact_hash`.
    pub fn primary_artifact_path(&self) -> Option<&str> {
        self.artifact_paths.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub id: i64,
    pub review_task_id: i64,
    pub decision: ReviewDecisionKind,
    pub notes: Option<String>,
    pub decided_at: DateTime<Utc>,
}
