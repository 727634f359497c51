// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PromptVersion` - a registered revision of a prompt template.
//!
//! Invariants enforced by the registry that owns these records, not by the
//! struct itself: `(name, version)` unique, `(name, content_hash)` unique,
//! at most one `is_default = true` per name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: i64,
    pub name: String,
    pub version: i32,
    pub content_hash: String,
    pub template_path: String,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
}
