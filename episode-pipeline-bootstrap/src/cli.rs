// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Command-line surface for the pipeline: one subcommand per use case.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "episode-pipeline", about = "Podcast episode production pipeline orchestrator")]
pub struct Cli {
    /// Path to a TOML config file. Falls back to built-in defaults plus
    /// `EP_`-prefixed environment variables when omitted.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Raises the default log level from info to debug.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Drives a single episode through its pipeline, stopping at the first
    /// review gate, cost-cap trip, or unrecoverable failure.
    Run {
        episode_id: String,
        /// Re-runs a terminal (failed/completed) episode anyway.
        #[arg(long)]
        force: bool,
    },
    /// Sweeps every actionable episode through one run each.
    RunPending,
    /// Prints an episode's current status, run history, and any open review
    /// task.
    Status { episode_id: String },
    /// Prints cumulative spend for one episode, or every episode on record.
    CostReport { episode_id: Option<String> },
    /// Records a reviewer's decision on an open review task.
    Review {
        task_id: i64,
        /// One of `approved`, `rejected`, `changes_requested`.
        decision: String,
        #[arg(long)]
        notes: Option<String>,
    },
}
