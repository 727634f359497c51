// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Everything that touches the outside world: the filesystem, sqlite,
//! Prometheus, `tracing`, and process configuration. The domain never
//! imports from here; this module imports from the domain.

pub mod artifact_store;
pub mod config;
pub mod cost_guard_service;
pub mod episode_lock;
pub mod logging;
pub mod metrics;
pub mod prompt_registry;
pub mod provenance_writer;
pub mod repositories;
pub mod review_gate_service;
pub mod stage_adapters;
pub mod stage_registry;
