// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging init. The bootstrap crate calls
//! [`init`] once at process start; everything downstream just uses the
//! `tracing` macros and inherits the global subscriber.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // try_init rather than init: safe to call more than once (e.g. from
    // multiple test binaries sharing this crate) without panicking.
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
