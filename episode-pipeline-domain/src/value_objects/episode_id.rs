// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Type-safe wrapper around an episode's stable external identifier.
//!
//! This is a stable external identifier, not a database surrogate key; it
//! is the slug used to build artifact tree paths (`raw/{ep}/audio.m4a`), so
//! it is validated to be filesystem-safe.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeId(String);

impl EpisodeId {
    pub fn new(raw: impl Into<String>) -> Result<Self, PipelineError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PipelineError::ValidationError("episode id must not be empty".into()));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(PipelineError::ValidationError(format!(
                "episode id '{raw}' must be alphanumeric/-/_  (used directly in filesystem paths)"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EpisodeId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_unsafe_ids() {
        assert!(EpisodeId::new("ep/1").is_err());
        assert!(EpisodeId::new("").is_err());
        assert!(EpisodeId::new("ep_001-a").is_ok());
    }
}
