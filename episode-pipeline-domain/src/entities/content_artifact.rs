// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `ContentArtifact` - a file produced by a stage. Immutable after
//! creation; regenerating the underlying file creates a new record rather
//! than mutating the old one, so history is reconstructible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentArtifact {
    pub id: i64,
    pub episode_id: String,
    pub artifact_type: String,
    pub file_path: String,
    pub model: Option<String>,
    pub prompt_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}
