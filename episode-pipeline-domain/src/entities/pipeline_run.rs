// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PipelineRun` - one record per attempt of one stage on one episode.
//! Append-only; never mutated once the run status is terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RunStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: i64,
    pub episode_id: String,
    pub stage_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub estimated_cost_usd: f64,
    pub error_message: Option<String>,
}

impl PipelineRun {
    pub fn new(episode_id: impl Into<String>, stage_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            episode_id: episode_id.into(),
            stage_id: stage_id.into(),
            status: RunStatus::Running,
            started_at,
            completed_at: None,
            input_tokens: None,
            output_tokens: None,
            estimated_cost_usd: 0.0,
            error_message: None,
        }
    }

    /// Runs that count toward the cost guard's aggregate: success and
    /// failed, never skipped or still-running.
    pub fn counts_toward_cost(&self) -> bool {
        matches!(self.status, RunStatus::Success | RunStatus::Failed)
    }
}
