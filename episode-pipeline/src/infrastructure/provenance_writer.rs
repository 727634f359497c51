// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Writes the per-stage provenance record: which prompt, model, and model
//! parameters produced the stage's outputs, and the hashes of the input and
//! output files involved. An external contract downstream tooling may read
//! directly, independent of the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use episode_pipeline_domain::PipelineError;

use super::artifact_store::ArtifactStore;

/// A path and the content hash of the bytes at that path when the record was
/// written, for one input or output artifact of a stage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub hash: String,
}

/// Free-form model invocation parameters (temperature, max_tokens, ...),
/// carried through whatever the adapter passed to the model - not a closed
/// set of fields.
pub type ModelParams = serde_json::Map<String, serde_json::Value>;

/// Builds `model_params` out of a prompt version's `temperature`/
/// `max_tokens` columns, `None` if neither was set.
pub fn model_params_from_prompt(temperature: Option<f64>, max_tokens: Option<i64>) -> Option<ModelParams> {
    let mut map = serde_json::Map::new();
    if let Some(t) = temperature {
        map.insert("temperature".to_string(), serde_json::json!(t));
    }
    if let Some(m) = max_tokens {
        map.insert("max_tokens".to_string(), serde_json::json!(m));
    }
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub stage: String,
    pub episode_id: String,
    pub timestamp: DateTime<Utc>,
    pub prompt_name: Option<String>,
    pub prompt_version: Option<i32>,
    pub prompt_hash: Option<String>,
    pub model: Option<String>,
    pub model_params: Option<ModelParams>,
    pub input_files: Vec<FileRef>,
    pub output_files: Vec<FileRef>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cost_usd: Option<f64>,
    pub duration_seconds: f64,
    pub notes: Option<String>,
}

pub struct ProvenanceWriter<'a> {
    store: &'a ArtifactStore,
}

impl<'a> ProvenanceWriter<'a> {
    pub fn new(store: &'a ArtifactStore) -> Self {
        Self { store }
    }

    /// Serializes with `serde_json`'s default (non-escaping) string handling
    /// so transcript text containing umlauts or other non-ASCII characters
    /// round-trips as UTF-8 rather than `\uXXXX` escapes.
    pub fn write(&self, record: &ProvenanceRecord) -> Result<(), PipelineError> {
        let relative = self.store.provenance(&record.episode_id, &record.stage);
        let json = serde_json::to_string_pretty(record)?;
        self.store.write_text(&relative, &json)
    }

    pub fn write_publish(&self, episode_id: &str, record: &ProvenanceRecord) -> Result<(), PipelineError> {
        let relative = self.store.publish_provenance(episode_id);
        let json = serde_json::to_string_pretty(record)?;
        self.store.write_text(&relative, &json)
    }

    pub fn read(&self, episode_id: &str, stage: &str) -> Result<ProvenanceRecord, PipelineError> {
        let relative = self.store.provenance(episode_id, stage);
        let text = self.store.read_text(&relative)?;
        serde_json::from_str(&text).map_err(PipelineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ProvenanceRecord {
        ProvenanceRecord {
            stage: "correct".to_string(),
            episode_id: "ep1".to_string(),
            timestamp: Utc::now(),
            prompt_name: Some("correct_transcript".to_string()),
            prompt_version: Some(2),
            prompt_hash: Some("a".repeat(64)),
            model: Some("gpt-4o".to_string()),
            model_params: None,
            input_files: vec![FileRef { path: "transcripts/ep1/transcript.de.txt".to_string(), hash: "b".repeat(64) }],
            output_files: vec![FileRef { path: "transcripts/ep1/transcript.corrected.de.txt".to_string(), hash: "c".repeat(64) }],
            input_tokens: None,
            output_tokens: None,
            cost_usd: Some(0.12),
            duration_seconds: 1.5,
            notes: None,
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let writer = ProvenanceWriter::new(&store);
        let record = sample_record();
        writer.write(&record).unwrap();

        let read_back = writer.read("ep1", "correct").unwrap();
        assert_eq!(read_back.output_files, record.output_files);
    }

    #[test]
    fn preserves_non_ascii_text_in_related_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let writer = ProvenanceWriter::new(&store);
        let mut record = sample_record();
        record.model = Some("Über-Modell".to_string());
        writer.write(&record).unwrap();

        let relative = store.provenance("ep1", "correct");
        let raw = store.read_text(&relative).unwrap();
        assert!(raw.contains("Über-Modell"));
    }
}
