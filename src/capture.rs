//! Interactive region selection as an explicit state machine.
//!
//! The machine is fed discrete pointer events by whatever windowing layer
//! hosts it and never blocks or polls. A press starts a rectangle, moves
//! stretch it, and a release either captures a region or rejects a
//! degenerate one and returns to idle.

use crate::template::Roi;
use crate::util::TallyMatchError;

/// Pointer input in frame pixel coordinates. Coordinates may fall outside the
/// frame while dragging; they are clamped on release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEvent {
    Down { x: i64, y: i64 },
    Move { x: i64, y: i64 },
    Up { x: i64, y: i64 },
    /// Abandons the current selection (e.g. Escape).
    Cancel,
}

/// Current selection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Drawing {
        anchor: (i64, i64),
        current: (i64, i64),
    },
    Captured(Roi),
}

/// Result of feeding one event.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureOutcome {
    /// Nothing final happened yet.
    Pending,
    /// A valid region was selected.
    Captured(Roi),
    /// The release produced an unusable rectangle; the machine is idle again
    /// and the caller should warn the user.
    Rejected(TallyMatchError),
}

/// Region selector bound to one frame size.
#[derive(Clone, Debug)]
pub struct RoiSelector {
    frame_w: usize,
    frame_h: usize,
    state: CaptureState,
}

impl RoiSelector {
    /// Creates an idle selector for a `frame_w x frame_h` frame.
    pub fn new(frame_w: usize, frame_h: usize) -> Self {
        Self {
            frame_w,
            frame_h,
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Rectangle to preview while dragging, as raw corners.
    pub fn preview(&self) -> Option<((i64, i64), (i64, i64))> {
        match self.state {
            CaptureState::Drawing { anchor, current } => Some((anchor, current)),
            _ => None,
        }
    }

    /// Returns to idle, discarding any selection.
    pub fn reset(&mut self) {
        self.state = CaptureState::Idle;
    }

    /// Advances the machine by one event.
    pub fn handle(&mut self, event: PointerEvent) -> CaptureOutcome {
        match (self.state, event) {
            (_, PointerEvent::Down { x, y }) => {
                self.state = CaptureState::Drawing {
                    anchor: (x, y),
                    current: (x, y),
                };
                CaptureOutcome::Pending
            }
            (CaptureState::Drawing { anchor, .. }, PointerEvent::Move { x, y }) => {
                self.state = CaptureState::Drawing {
                    anchor,
                    current: (x, y),
                };
                CaptureOutcome::Pending
            }
            (CaptureState::Drawing { anchor, .. }, PointerEvent::Up { x, y }) => {
                match Roi::from_corners(anchor, (x, y), self.frame_w, self.frame_h) {
                    Ok(roi) => {
                        self.state = CaptureState::Captured(roi);
                        CaptureOutcome::Captured(roi)
                    }
                    Err(err) => {
                        self.state = CaptureState::Idle;
                        CaptureOutcome::Rejected(err)
                    }
                }
            }
            (CaptureState::Drawing { .. }, PointerEvent::Cancel) => {
                self.state = CaptureState::Idle;
                CaptureOutcome::Pending
            }
            // Stray moves/releases outside a drag, and cancels while idle or
            // captured, leave the state untouched.
            _ => CaptureOutcome::Pending,
        }
    }
}
