//! Error types for the animation core

use serde::{Deserialize, Serialize};

/// Errors surfaced by construction-time and boundary operations.
///
/// Per-tick degradations (unknown force targets, too-short smoothing input,
/// no clip loaded) never produce one of these; they are no-ops.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// A numeric or structural parameter is out of its valid domain.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Requested motion archetype is not known to the synthesizer.
    #[error("Animation type '{name}' not supported")]
    UnsupportedMotionType { name: String },

    /// Requested export target is not known to the exporter.
    #[error("Export format '{format}' not supported")]
    UnsupportedExportFormat { format: String },

    /// A joint reference does not resolve against the skeleton.
    #[error("Joint not found: {id}")]
    MissingJoint { id: String },

    /// JSON encode/decode failure at the boundary.
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimationError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_joint(id: impl Into<String>) -> Self {
        Self::MissingJoint { id: id.into() }
    }

    /// Whether the caller can keep using the engine after this error.
    ///
    /// Skeleton construction failures leave nothing usable behind; everything else
    /// is a rejected request against an intact engine.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. }
                | Self::UnsupportedMotionType { .. }
                | Self::UnsupportedExportFormat { .. }
                | Self::Serialization { .. }
        )
    }

    /// Short label for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "parameter",
            Self::UnsupportedMotionType { .. } => "motion",
            Self::UnsupportedExportFormat { .. } => "export",
            Self::MissingJoint { .. } => "skeleton",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for AnimationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnimationError>;
