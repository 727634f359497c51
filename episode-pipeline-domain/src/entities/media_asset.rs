// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `MediaAsset` - a binary media output (image, audio, or video).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::MediaAssetType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    pub episode_id: String,
    pub asset_type: MediaAssetType,
    pub chapter_id: Option<String>,
    pub file_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_seconds: Option<f64>,
    pub metadata: HashMap<String, String>,
    pub prompt_version_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
