// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `EpisodeAggregate` wraps an [`Episode`] with the invariants the
//! orchestrator and review gate service must preserve: status only moves
//! forward except for an explicit, gate-triggered revert, and every status
//! change raises a domain event the caller can fold into logging/metrics.
//!
//! A thin wrapper that holds uncommitted events alongside the entity it
//! guards, rather than an event-sourced replay target (see
//! [`crate::events`]).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::events::{EpisodeEvent, EpisodeStatusChangedEvent, StageCompletedEvent, StageStartedEvent};
use crate::{Episode, EpisodeStatus, PipelineError, RunStatus};

#[derive(Debug, Clone)]
pub struct EpisodeAggregate {
    episode: Episode,
    uncommitted_events: Vec<EpisodeEvent>,
}

impl EpisodeAggregate {
    pub fn new(episode: Episode) -> Self {
        Self { episode, uncommitted_events: Vec::new() }
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn into_episode(self) -> Episode {
        self.episode
    }

    pub fn uncommitted_events(&self) -> &[EpisodeEvent] {
        &self.uncommitted_events
    }

    pub fn mark_events_committed(&mut self) {
        self.uncommitted_events.clear();
    }

    /// Advances the episode to `to`, which must be strictly greater than the
    /// current status. Used by the orchestrator on stage success.
    pub fn advance_status(&mut self, to: EpisodeStatus, now: DateTime<Utc>) -> Result<(), PipelineError> {
        if to <= self.episode.status {
            return Err(PipelineError::InvalidTransition(format!(
                "cannot advance episode {} from {} to {} (not forward)",
                self.episode.id, self.episode.status, to
            )));
        }
        self.set_status(to, now);
        Ok(())
    }

    /// Reverts the episode to a prior status. Only the review gate service
    /// calls this, on rejection/changes-requested; it deliberately bypasses
    /// the forward-only check `advance_status` enforces.
    pub fn revert_status(&mut self, to: EpisodeStatus, now: DateTime<Utc>) {
        self.set_status(to, now);
    }

    /// Forces a terminal status (`FAILED` / `COST_LIMIT`) regardless of
    /// ordering - both are reachable from any in-flight status.
    pub fn force_terminal(&mut self, to: EpisodeStatus, error_message: Option<String>, now: DateTime<Utc>) {
        self.episode.error_message = error_message;
        self.set_status(to, now);
    }

    /// Records the uploaded video id the `publish` stage returned. Doesn't
    /// raise a status-change event; the accompanying `advance_status` call
    /// already does.
    pub fn record_youtube_video_id(&mut self, video_id: String) {
        self.episode.youtube_video_id = Some(video_id);
    }

    fn set_status(&mut self, to: EpisodeStatus, now: DateTime<Utc>) {
        let from = self.episode.status;
        self.episode.set_status(to, now);
        self.uncommitted_events.push(EpisodeEvent::StatusChanged(EpisodeStatusChangedEvent {
            event_id: Uuid::new_v4(),
            episode_id: self.episode.id.clone(),
            from,
            to,
            occurred_at: now,
        }));
    }

    pub fn record_stage_started(&mut self, stage_id: &str, now: DateTime<Utc>) {
        self.uncommitted_events.push(EpisodeEvent::StageStarted(StageStartedEvent {
            event_id: Uuid::new_v4(),
            episode_id: self.episode.id.clone(),
            stage_id: stage_id.to_string(),
            occurred_at: now,
        }));
    }

    pub fn record_stage_completed(&mut self, stage_id: &str, status: RunStatus, cost_usd: f64, now: DateTime<Utc>) {
        self.uncommitted_events.push(EpisodeEvent::StageCompleted(StageCompletedEvent {
            event_id: Uuid::new_v4(),
            episode_id: self.episode.id.clone(),
            stage_id: stage_id.to_string(),
            status,
            cost_usd,
            occurred_at: now,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Episode {
        Episode::new("ep1", "chan1", "Title", "https://example.test/ep1", 2, Utc::now())
    }

    #[test]
    fn advance_rejects_non_forward_moves() {
        let mut agg = EpisodeAggregate::new(episode());
        agg.advance_status(EpisodeStatus::Downloaded, Utc::now()).unwrap();
        let err = agg.advance_status(EpisodeStatus::New, Utc::now()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition(_)));
    }

    #[test]
    fn revert_bypasses_forward_check() {
        let mut agg = EpisodeAggregate::new(episode());
        agg.advance_status(EpisodeStatus::Downloaded, Utc::now()).unwrap();
        agg.advance_status(EpisodeStatus::Transcribed, Utc::now()).unwrap();
        agg.advance_status(EpisodeStatus::Corrected, Utc::now()).unwrap();
        agg.revert_status(EpisodeStatus::Transcribed, Utc::now());
        assert_eq!(agg.episode().status, EpisodeStatus::Transcribed);
    }

    #[test]
    fn status_change_raises_event() {
        let mut agg = EpisodeAggregate::new(episode());
        agg.advance_status(EpisodeStatus::Downloaded, Utc::now()).unwrap();
        assert_eq!(agg.uncommitted_events().len(), 1);
    }
}
