// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cooperative shutdown. The orchestrator checks a shared flag between
//! stages rather than stages being pre-emptively cancelled mid-flight, so an
//! in-progress write to the artifact store always finishes cleanly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Installs a `Ctrl-C` listener that flips the shared flag once. Returns the
/// flag immediately so the caller can thread it into the orchestrator before
/// the listener task ever fires.
pub fn install() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let task_flag = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, finishing the in-flight stage then stopping");
            task_flag.store(true, Ordering::Relaxed);
        }
    });
    flag
}
