// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaAssetType {
    Image,
    Audio,
    Video,
}

impl MediaAssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAssetType::Image => "IMAGE",
            MediaAssetType::Audio => "AUDIO",
            MediaAssetType::Video => "VIDEO",
        }
    }
}

impl fmt::Display for MediaAssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
