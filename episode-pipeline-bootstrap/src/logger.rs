// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bootstrap owns *when* logging starts - before anything else touches the
//! filesystem or network - while `episode_pipeline::infrastructure::logging`
//! owns *how* the subscriber is configured.

pub fn init(verbose: bool) {
    episode_pipeline::infrastructure::logging::init(verbose);
}
