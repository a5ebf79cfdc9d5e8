//! Error types for shadow scheduling
//!
//! Nothing in the per-frame scheduling path fails: capacity exhaustion and
//! empty caster bounds degrade to "no shadow" encodings. The errors here cover
//! settings loading and call-order violations of the frame state machine.

use thiserror::Error;

use crate::shadow::state::FrameStateError;

/// Errors produced by the shadow subsystem
#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("Failed to parse shadow settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("Frame call order violated: {0}")]
    CallOrder(#[from] FrameStateError),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, ShadowError>;
