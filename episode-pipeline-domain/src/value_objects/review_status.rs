// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Review task status and the decision kind recorded in a [`crate::ReviewDecision`].

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    InReview,
    Approved,
    Rejected,
    ChangesRequested,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::InReview => "IN_REVIEW",
            ReviewStatus::Approved => "APPROVED",
            ReviewStatus::Rejected => "REJECTED",
            ReviewStatus::ChangesRequested => "CHANGES_REQUESTED",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "PENDING" => ReviewStatus::Pending,
            "IN_REVIEW" => ReviewStatus::InReview,
            "APPROVED" => ReviewStatus::Approved,
            "REJECTED" => ReviewStatus::Rejected,
            "CHANGES_REQUESTED" => ReviewStatus::ChangesRequested,
            _ => return None,
        })
    }

    /// Non-terminal: at most one of these may exist per (episode, stage).
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Pending | ReviewStatus::InReview)
    }

    /// Blocks advancement past the gate.
    pub fn blocks_advancement(&self) -> bool {
        matches!(
            self,
            ReviewStatus::Pending | ReviewStatus::InReview | ReviewStatus::ChangesRequested
        )
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewDecisionKind {
    Approved,
    Rejected,
    ChangesRequested,
}

impl ReviewDecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecisionKind::Approved => "approved",
            ReviewDecisionKind::Rejected => "rejected",
            ReviewDecisionKind::ChangesRequested => "changes_requested",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "approved" => ReviewDecisionKind::Approved,
            "rejected" => ReviewDecisionKind::Rejected,
            "changes_requested" => ReviewDecisionKind::ChangesRequested,
            _ => return None,
        })
    }

    pub fn resulting_status(&self) -> ReviewStatus {
        match self {
            ReviewDecisionKind::Approved => ReviewStatus::Approved,
            ReviewDecisionKind::Rejected => ReviewStatus::Rejected,
            ReviewDecisionKind::ChangesRequested => ReviewStatus::ChangesRequested,
        }
    }
}

impl fmt::Display for ReviewDecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
