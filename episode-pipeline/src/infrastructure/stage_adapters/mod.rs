// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete `StageAdapter` implementations. Every real stage here is a stub
//! that exercises the artifact store, prompt registry and provenance writer
//! the way a real LLM/ffmpeg/uploader call would, without reaching out to an
//! actual external service - the external call sites are the seam a
//! production deployment replaces.

pub mod support;

pub mod download;
pub mod transcribe;
pub mod correct;
pub mod translate;
pub mod adapt;
pub mod chapterize;
pub mod imagegen;
pub mod tts;
pub mod render;
pub mod publish;
pub mod review_gate;

pub use download::DownloadAdapter;
pub use transcribe::TranscribeAdapter;
pub use correct::CorrectAdapter;
pub use translate::TranslateAdapter;
pub use adapt::AdaptAdapter;
pub use chapterize::ChapterizeAdapter;
pub use imagegen::ImageGenAdapter;
pub use tts::TtsAdapter;
pub use render::RenderAdapter;
pub use publish::PublishAdapter;
pub use review_gate::ReviewGateAdapter;
