// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics. A side-effect of the orchestrator and stage
//! adapters - recording here never influences control flow.

use once_cell::sync::Lazy;
use prometheus::{CounterVec, GaugeVec, HistogramVec, Registry};

pub struct PipelineMetrics {
    pub registry: Registry,
    pub stage_duration_seconds: HistogramVec,
    pub stage_cost_usd_total: CounterVec,
    pub episodes_total: CounterVec,
    pub review_tasks_pending: GaugeVec,
}

static METRICS: Lazy<PipelineMetrics> = Lazy::new(PipelineMetrics::new);

impl PipelineMetrics {
    fn new() -> Self {
        let registry = Registry::new();

        let stage_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "episode_pipeline_stage_duration_seconds",
                "Stage adapter execution duration",
            ),
            &["stage"],
        )
        .expect("valid histogram metric");

        let stage_cost_usd_total = CounterVec::new(
            prometheus::Opts::new("episode_pipeline_stage_cost_usd_total", "Cumulative estimated stage cost in USD"),
            &["stage"],
        )
        .expect("valid counter metric");

        let episodes_total = CounterVec::new(
            prometheus::Opts::new("episode_pipeline_episodes_total", "Episodes reaching a terminal status"),
            &["status"],
        )
        .expect("valid counter metric");

        let review_tasks_pending = GaugeVec::new(
            prometheus::Opts::new("episode_pipeline_review_tasks_pending", "Open review tasks"),
            &["stage"],
        )
        .expect("valid gauge metric");

        registry.register(Box::new(stage_duration_seconds.clone())).ok();
        registry.register(Box::new(stage_cost_usd_total.clone())).ok();
        registry.register(Box::new(episodes_total.clone())).ok();
        registry.register(Box::new(review_tasks_pending.clone())).ok();

        Self { registry, stage_duration_seconds, stage_cost_usd_total, episodes_total, review_tasks_pending }
    }
}

pub fn metrics() -> &'static PipelineMetrics {
    &METRICS
}

pub fn record_stage_run(stage: &str, duration_seconds: f64, cost_usd: f64) {
    metrics().stage_duration_seconds.with_label_values(&[stage]).observe(duration_seconds);
    if cost_usd > 0.0 {
        metrics().stage_cost_usd_total.with_label_values(&[stage]).inc_by(cost_usd);
    }
}

pub fn record_episode_terminal(status: &str) {
    metrics().episodes_total.with_label_values(&[status]).inc();
}

pub fn set_review_tasks_pending(stage: &str, count: f64) {
    metrics().review_tasks_pending.with_label_values(&[stage]).set(count);
}
