// /////////////////////////////////////////////////////////////////////////////
// Episode Pipeline
// Copyright (c) 2026 Episode Pipeline Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single, flat error enum for the whole engine, covering state machine
//! violations, idempotency preconditions, external-service and cost
//! failures, and I/O. Every layer above the domain converts its own failure
//! modes into one of these variants at the boundary rather than propagating
//! library-specific error types upward.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("gate conflict: {0}")]
    GateConflict(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("external service error: {0}")]
    ExternalServiceError(String),

    #[error("cost cap exceeded: {0}")]
    CostCapExceeded(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template parse error: {0}")]
    TemplateParseError(String),

    #[error("no default prompt version: {0}")]
    NoDefault(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PipelineError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// True for errors that an adapter may retry (transient external
    /// failures); everything else surfaces straight to the orchestrator.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::ExternalServiceError(_) | PipelineError::IoError(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::NotFound(_) => "not_found",
            PipelineError::InvalidTransition(_) => "invalid_transition",
            PipelineError::GateConflict(_) => "gate_conflict",
            PipelineError::PreconditionFailed(_) => "precondition_failed",
            PipelineError::ExternalServiceError(_) => "external_service",
            PipelineError::CostCapExceeded(_) => "cost_cap",
            PipelineError::IoError(_) => "io",
            PipelineError::ValidationError(_) => "validation",
            PipelineError::TemplateNotFound(_) => "template",
            PipelineError::TemplateParseError(_) => "template",
            PipelineError::NoDefault(_) => "prompt",
            PipelineError::DatabaseError(_) => "database",
            PipelineError::SerializationError(_) => "serialization",
            PipelineError::InvalidConfiguration(_) => "configuration",
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PipelineError::NotFound(err.to_string())
        } else {
            PipelineError::IoError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
