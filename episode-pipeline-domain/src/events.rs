// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain events raised by [`crate::EpisodeAggregate`].
//!
//! These are in-process notifications consumed by the orchestrator for
//! logging/metrics; they are not an event-sourcing store - the aggregate's
//! durable state lives in the `episodes`/`pipeline_runs` tables, not in
//! replayed events. Kept as a flat enum around per-occurrence structs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EpisodeStatus, RunStatus};

#[derive(Debug, Clone)]
pub struct StageStartedEvent {
    pub event_id: Uuid,
    pub episode_id: String,
    pub stage_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StageCompletedEvent {
    pub event_id: Uuid,
    pub episode_id: String,
    pub stage_id: String,
    pub status: RunStatus,
    pub cost_usd: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EpisodeStatusChangedEvent {
    pub event_id: Uuid,
    pub episode_id: String,
    pub from: EpisodeStatus,
    pub to: EpisodeStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum EpisodeEvent {
    StageStarted(StageStartedEvent),
    StageCompleted(StageCompletedEvent),
    StatusChanged(EpisodeStatusChangedEvent),
}
