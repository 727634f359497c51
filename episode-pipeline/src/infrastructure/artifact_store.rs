// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Artifact Store
//!
//! Owns the on-disk layout rooted at `data_root`: path resolution,
//! write-then-rename, and the stale-marker sidecar protocol. Never mutates
//! database records; it only touches files.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use episode_pipeline_domain::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StaleMarker {
    invalidated_at: chrono::DateTime<Utc>,
    invalidated_by: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_root: PathBuf,
}

/// Canonical artifact kinds and their on-disk paths. Not every artifact
/// type needs a chapter id; those that do ignore `chapter_id` when
/// `None` would be a logic error at the call site, so the distinction is
/// enforced by which `resolve_*` helper is called rather than by a single
/// stringly-typed enum.
impl ArtifactStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into() }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    fn abs(&self, relative: &str) -> PathBuf {
        self.data_root.join(relative)
    }

    pub fn raw_audio(&self, ep: &str) -> String {
        format!("raw/{ep}/audio.m4a")
    }

    pub fn transcript_raw(&self, ep: &str) -> String {
        format!("transcripts/{ep}/transcript.de.txt")
    }

    pub fn transcript_corrected(&self, ep: &str) -> String {
        format!("transcripts/{ep}/transcript.corrected.de.txt")
    }

    pub fn transcript_translated(&self, ep: &str) -> String {
        format!("transcripts/{ep}/transcript.tr.txt")
    }

    pub fn script_adapted(&self, ep: &str) -> String {
        format!("outputs/{ep}/script.adapted.tr.md")
    }

    pub fn chapters_json(&self, ep: &str) -> String {
        format!("outputs/{ep}/chapters.json")
    }

    pub fn image(&self, ep: &str, chapter_id: &str) -> String {
        format!("outputs/{ep}/images/{chapter_id}.png")
    }

    pub fn images_manifest(&self, ep: &str) -> String {
        format!("outputs/{ep}/images/manifest.json")
    }

    pub fn tts_audio(&self, ep: &str, chapter_id: &str) -> String {
        format!("outputs/{ep}/tts/{chapter_id}.mp3")
    }

    pub fn tts_manifest(&self, ep: &str) -> String {
        format!("outputs/{ep}/tts/manifest.json")
    }

    pub fn render_segment(&self, ep: &str, chapter_id: &str) -> String {
        format!("outputs/{ep}/render/segments/{chapter_id}.mp4")
    }

    pub fn draft_video(&self, ep: &str) -> String {
        format!("outputs/{ep}/render/draft.mp4")
    }

    pub fn render_manifest(&self, ep: &str) -> String {
        format!("outputs/{ep}/render/render_manifest.json")
    }

    pub fn review_diff(&self, ep: &str, stage: &str) -> String {
        format!("outputs/{ep}/review/{stage}_diff.json")
    }

    pub fn review_history(&self, ep: &str) -> String {
        format!("outputs/{ep}/review/review_history.json")
    }

    pub fn provenance(&self, ep: &str, stage: &str) -> String {
        format!("outputs/{ep}/provenance/{stage}_provenance.json")
    }

    pub fn publish_provenance(&self, ep: &str) -> String {
        format!("outputs/{ep}/publish/publish_provenance.json")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.abs(relative).exists()
    }

    pub fn read_bytes(&self, relative: &str) -> Result<Vec<u8>, PipelineError> {
        let path = self.abs(relative);
        std::fs::read(&path).map_err(|e| io_error(&path, e))
    }

    pub fn read_text(&self, relative: &str) -> Result<String, PipelineError> {
        let path = self.abs(relative);
        std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))
    }

    /// Writes to a temporary sibling then atomically renames into place,
    /// creating parent directories as needed. Clears any stale marker: a
    /// fresh write supersedes it.
    pub fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        let path = self.abs(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let tmp_path = path.with_extension(format!(
            "{}.tmp-{}",
            path.extension().and_then(|e| e.to_str()).unwrap_or("out"),
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&tmp_path, bytes).map_err(|e| io_error(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| io_error(&path, e))?;
        self.clear_stale(relative)?;
        Ok(())
    }

    pub fn write_text(&self, relative: &str, text: &str) -> Result<(), PipelineError> {
        self.write(relative, text.as_bytes())
    }

    fn stale_sidecar(&self, relative: &str) -> String {
        format!("{relative}.stale")
    }

    /// Marks `relative` stale. If a marker already exists, keeps the
    /// earliest `invalidated_at`.
    pub fn mark_stale(&self, relative: &str, reason: &str, invalidated_by: &str) -> Result<(), PipelineError> {
        let sidecar = self.stale_sidecar(relative);
        let now = Utc::now();
        let marker = if let Ok(existing) = self.read_text(&sidecar) {
            if let Ok(existing) = serde_json::from_str::<StaleMarker>(&existing) {
                existing
            } else {
                StaleMarker { invalidated_at: now, invalidated_by: invalidated_by.to_string(), reason: reason.to_string() }
            }
        } else {
            StaleMarker { invalidated_at: now, invalidated_by: invalidated_by.to_string(), reason: reason.to_string() }
        };
        let json = serde_json::to_string_pretty(&marker)?;
        self.write_text(&sidecar, &json)
    }

    pub fn is_stale(&self, relative: &str) -> bool {
        !self.exists(relative) || self.exists(&self.stale_sidecar(relative))
    }

    pub fn clear_stale(&self, relative: &str) -> Result<(), PipelineError> {
        let sidecar = self.abs(&self.stale_sidecar(relative));
        if sidecar.exists() {
            std::fs::remove_file(&sidecar).map_err(|e| io_error(&sidecar, e))?;
        }
        Ok(())
    }
}

fn io_error(path: &Path, err: std::io::Error) -> PipelineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        PipelineError::NotFound(format!("{}: {err}", path.display()))
    } else {
        PipelineError::IoError(format!("{}: {err}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let rel = store.transcript_raw("ep1");
        store.write_text(&rel, "hallo welt").unwrap();
        assert_eq!(store.read_text(&rel).unwrap(), "hallo welt");
    }

    #[test]
    fn missing_file_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let rel = store.transcript_raw("ep1");
        assert!(store.is_stale(&rel));
    }

    #[test]
    fn mark_stale_keeps_earliest_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let rel = store.transcript_raw("ep1");
        store.write_text(&rel, "v1").unwrap();

        store.mark_stale(&rel, "upstream changed", "correct").unwrap();
        let first = store.read_text(&store.stale_sidecar(&rel)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.mark_stale(&rel, "again", "correct").unwrap();
        let second = store.read_text(&store.stale_sidecar(&rel)).unwrap();

        assert_eq!(first, second);
        assert!(store.is_stale(&rel));
    }

    #[test]
    fn write_clears_existing_stale_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let rel = store.transcript_raw("ep1");
        store.write_text(&rel, "v1").unwrap();
        store.mark_stale(&rel, "reason", "correct").unwrap();
        assert!(store.is_stale(&rel));

        store.write_text(&rel, "v2").unwrap();
        assert!(!store.is_stale(&rel));
    }
}
