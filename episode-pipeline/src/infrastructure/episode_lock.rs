// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-episode mutual exclusion. Multi-node distribution is out of scope,
//! so a single in-process keyed lock table is enough to stop two concurrent
//! `run_episode` calls (e.g. a manual retry racing `run-pending`) from
//! mutating the same episode at once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct EpisodeLockTable {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EpisodeLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, episode_id: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            locks.entry(episode_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_lock_on_same_episode_waits_for_the_first() {
        let table = Arc::new(EpisodeLockTable::new());
        let guard = table.lock("ep1").await;

        let table2 = table.clone();
        let handle = tokio::spawn(async move {
            let _guard = table2.lock("ep1").await;
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        drop(guard);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn different_episodes_do_not_contend() {
        let table = EpisodeLockTable::new();
        let a = table.lock("ep1").await;
        let b = table.lock("ep2").await;
        drop(a);
        drop(b);
    }
}
