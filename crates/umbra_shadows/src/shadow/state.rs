//! Frame State Machine
//!
//! The shadow subsystem expects a strict call order per frame:
//! `setup → reserve* → render → cleanup`. `FrameState` makes that order
//! explicit and reports violations instead of silently producing garbage.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Operation being applied to the frame state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameOp {
    Setup,
    Reserve,
    Render,
    Cleanup,
}

/// Per-frame lifecycle of the shadow atlas renderer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameState {
    /// No frame in flight
    #[default]
    Idle,
    /// Counters reset, nothing reserved yet
    Setup,
    /// At least one reservation made this frame
    Reserving,
    /// Atlases are being drawn
    Rendering,
    /// Atlases drawn and still held; waiting for cleanup
    Rendered,
}

/// Call-order violation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{op:?} is not valid while the frame is {state:?}")]
pub struct FrameStateError {
    pub state: FrameState,
    pub op: FrameOp,
}

impl FrameState {
    /// Apply an operation, returning the state it leads to.
    ///
    /// `Render` lands in `Rendering`; the renderer moves to `Rendered`
    /// itself once every tile has been drawn.
    pub fn transition(self, op: FrameOp) -> Result<FrameState, FrameStateError> {
        use FrameOp as Op;
        use FrameState as S;

        match (self, op) {
            (S::Idle, Op::Setup) => Ok(S::Setup),
            (S::Setup | S::Reserving, Op::Reserve) => Ok(S::Reserving),
            (S::Setup | S::Reserving, Op::Render) => Ok(S::Rendering),
            (S::Rendered, Op::Cleanup) => Ok(S::Idle),
            (state, op) => Err(FrameStateError { state, op }),
        }
    }

    /// Whether reservations made now will be rendered this frame
    pub fn accepts_reservations(self) -> bool {
        matches!(self, Self::Setup | Self::Reserving)
    }

    /// Whether temporary atlases are currently held
    pub fn holds_atlases(self) -> bool {
        matches!(self, Self::Rendering | Self::Rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_frame_order() {
        let state = FrameState::Idle
            .transition(FrameOp::Setup)
            .and_then(|s| s.transition(FrameOp::Reserve))
            .and_then(|s| s.transition(FrameOp::Reserve))
            .and_then(|s| s.transition(FrameOp::Render))
            .unwrap();
        assert_eq!(state, FrameState::Rendering);

        // The renderer marks completion itself
        let state = FrameState::Rendered.transition(FrameOp::Cleanup).unwrap();
        assert_eq!(state, FrameState::Idle);
    }

    #[test]
    fn test_render_without_reservations() {
        let state = FrameState::Setup.transition(FrameOp::Render).unwrap();
        assert_eq!(state, FrameState::Rendering);
    }

    #[test]
    fn test_out_of_order_calls() {
        let err = FrameState::Idle.transition(FrameOp::Reserve).unwrap_err();
        assert_eq!(err.state, FrameState::Idle);
        assert_eq!(err.op, FrameOp::Reserve);

        assert!(FrameState::Idle.transition(FrameOp::Render).is_err());
        assert!(FrameState::Rendered.transition(FrameOp::Reserve).is_err());
        assert!(FrameState::Rendered.transition(FrameOp::Setup).is_err());
        assert!(FrameState::Setup.transition(FrameOp::Cleanup).is_err());
    }

    #[test]
    fn test_error_message() {
        let err = FrameState::Idle.transition(FrameOp::Render).unwrap_err();
        assert_eq!(err.to_string(), "Render is not valid while the frame is Idle");
    }

    #[test]
    fn test_state_queries() {
        assert!(FrameState::Setup.accepts_reservations());
        assert!(!FrameState::Rendered.accepts_reservations());
        assert!(FrameState::Rendered.holds_atlases());
        assert!(!FrameState::Idle.holds_atlases());
    }
}
