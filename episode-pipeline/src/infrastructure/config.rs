// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Settings
//!
//! Process-wide configuration. Loaded in increasing precedence: built-in
//! defaults, an optional TOML file, then `EP_`-prefixed environment
//! variables (`EP_MAX_EPISODE_COST_USD=5.00`, nested keys with `__`, e.g.
//! `EP_DATA_ROOT`).

use serde::{Deserialize, Serialize};

use episode_pipeline_domain::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub pipeline_version: i32,
    pub max_episode_cost_usd: f64,
    pub max_retries: u32,
    pub dry_run: bool,
    pub database_url: String,
    pub data_root: String,
    pub prompts_dir: String,
    /// Opt-in auto-approve rule for gate 1: skip the human decision when a
    /// punctuation-only classifier judges the correction trivial. Disabled
    /// by default - a gate only auto-resolves when explicitly configured to.
    pub auto_approve_punctuation_only: bool,
    pub run_pending_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline_version: 2,
            max_episode_cost_usd: 10.0,
            max_retries: 3,
            dry_run: false,
            database_url: "sqlite://data/episode_pipeline.db".to_string(),
            data_root: "data".to_string(),
            prompts_dir: "prompts/templates".to_string(),
            auto_approve_punctuation_only: false,
            run_pending_limit: 10,
        }
    }
}

impl Settings {
    /// Loads settings from an optional config file plus environment
    /// overrides, falling back to [`Settings::default`] for everything else.
    pub fn load(config_path: Option<&str>) -> Result<Self, PipelineError> {
        let defaults = Settings::default();
        let mut builder = config::Config::builder()
            .set_default("pipeline_version", defaults.pipeline_version as i64)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("max_episode_cost_usd", defaults.max_episode_cost_usd)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("max_retries", defaults.max_retries as i64)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("dry_run", defaults.dry_run)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("database_url", defaults.database_url.clone())
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("data_root", defaults.data_root.clone())
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("prompts_dir", defaults.prompts_dir.clone())
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("auto_approve_punctuation_only", defaults.auto_approve_punctuation_only)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?
            .set_default("run_pending_limit", defaults.run_pending_limit as i64)
            .map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("EP").separator("__"));

        let config = builder.build().map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))?;
        config.try_deserialize().map_err(|e| PipelineError::InvalidConfiguration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.pipeline_version, 2);
        assert!(!s.auto_approve_punctuation_only);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let s = Settings::load(None).unwrap();
        assert_eq!(s.max_retries, 3);
    }
}
