use crate::assoc::{BBox, Ltrb, View};
use crate::error::Error;

///
/// This class represents a bounding box detection in a single frame of one view.
///
/// frame : usize - View-local, 0-based frame index.
/// bbox : BBox in format `(x1, y1, x2, y2)`, `x1 < x2`, `y1 < y2`.
/// confidence : f32 - Detector confidence score in `[0, 1]`.
/// class : i32 - Detector category id.
/// track_id : Option<usize> - Persistent identity from an upstream single-view tracker.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub frame: usize,
    pub bbox: BBox<Ltrb>,
    pub confidence: f32,
    pub class: i32,
    pub track_id: Option<usize>,
}

/// How a detection is turned into the identity used as a vote key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IdentityMode {
    /// Position of the detection inside its frame's list.
    ///
    /// Only meaningful when the view emits detections in an identity-stable
    /// order across frames (e.g. sorted by an upstream tracker).
    Position,

    /// The detection's `track_id`; every detection must carry one.
    TrackId,
}

impl Default for IdentityMode {
    fn default() -> Self {
        IdentityMode::Position
    }
}

impl Detection {
    /// Identity of the detection found at `position` within its frame.
    pub fn identity(&self, position: usize, mode: IdentityMode, view: View) -> Result<usize, Error> {
        match mode {
            IdentityMode::Position => Ok(position),
            IdentityMode::TrackId => self.track_id.ok_or(Error::MissingTrackId {
                view,
                frame: self.frame,
                position,
            }),
        }
    }
}
