// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Error types.
//!
//! There are three families, and they travel differently:
//!
//! * [TranslateError] is returned synchronously by the call that received a malformed
//!   descriptor.  The driver never sees the request.
//! * [GpuError] is an error the *driver* reported.  It arrives as the value of an error-scope
//!   pop or as the payload of an uncaptured-error event.
//! * [OperationError] rejects an asynchronous operation, and only ever arrives through the
//!   future of that operation.

use crate::native::ErrorType;
use std::fmt::{Display, Formatter};

/// A descriptor could not be translated into its native form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("unknown value '{value}' for {field}")]
    UnknownToken { field: &'static str, value: String },
    #[error("invalid value for GPUExtent3D: at least one coordinate is required")]
    EmptyExtent,
    #[error("unknown auto layout mode '{0}'")]
    UnknownLayoutMode(String),
    #[error("bind group layout entry {binding} must set exactly one binding type, found {count}")]
    BindingTypeCount { binding: u32, count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuErrorKind {
    Validation,
    OutOfMemory,
    Internal,
}

impl Display for GpuErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuErrorKind::Validation => write!(f, "validation"),
            GpuErrorKind::OutOfMemory => write!(f, "out-of-memory"),
            GpuErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// An error reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct GpuError {
    kind: GpuErrorKind,
    message: String,
}

impl GpuError {
    pub fn new(kind: GpuErrorKind, message: impl Into<String>) -> Self {
        GpuError {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> GpuErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /**
    Classifies an error for the uncaptured-error path.

    Device-lost, unknown and unrecognised types collapse to [GpuErrorKind::Internal].  `NoError`
    is not an error and yields `None`.
    */
    pub(crate) fn classify(ty: ErrorType, message: &str) -> Option<GpuError> {
        let kind = match ty {
            ErrorType::NoError => return None,
            ErrorType::Validation => GpuErrorKind::Validation,
            ErrorType::OutOfMemory => GpuErrorKind::OutOfMemory,
            ErrorType::Internal
            | ErrorType::DeviceLost
            | ErrorType::Unknown
            | ErrorType::Unrecognized(_) => GpuErrorKind::Internal,
        };
        Some(GpuError::new(kind, message))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineErrorReason {
    Validation,
    Internal,
}

impl Display for PipelineErrorReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineErrorReason::Validation => write!(f, "validation"),
            PipelineErrorReason::Internal => write!(f, "internal"),
        }
    }
}

/// An asynchronous operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("device lost: {0}")]
    DeviceLost(String),
    #[error("unknown error: {0}")]
    Unknown(String),
    #[error("unhandled native status code {0}")]
    UnrecognizedStatus(u32),
    #[error("{reason} error creating pipeline: {message}")]
    Pipeline {
        reason: PipelineErrorReason,
        message: String,
    },
}

/// A synchronous device query failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("failed to get device limits")]
    LimitsUnavailable,
}
