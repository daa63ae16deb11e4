use err_derive::Error;
use crate::assoc::View;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Malformed detection record #{}: {}", record, reason)]
    MalformedInput { record: usize, reason: String },

    #[error(display = "Frame {} is unavailable in the {} view", frame, view)]
    FrameUnavailable { frame: usize, view: View },

    #[error(display = "Frame {} has no detections in the {} view", frame, view)]
    EmptyAssignmentInput { frame: usize, view: View },

    #[error(display = "Detection #{} of frame {} in the {} view has no track id", position, frame, view)]
    MissingTrackId { view: View, frame: usize, position: usize },

    #[error(display = "Assignment Error: {}", _0)]
    Assignment(String),

    #[error(display = "Invalid configuration: {}", _0)]
    InvalidConfig(String),

    #[error(display = "IO Error: {}", _0)]
    Io(std::io::Error),

    #[error(display = "Json Error: {}", _0)]
    Json(serde_json::Error),

    #[error(display = "Image Error: {}", _0)]
    Image(image::ImageError),

    #[cfg(feature = "video")]
    #[error(display = "OpenCV Error: {}", _0)]
    OpenCv(opencv::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

#[cfg(feature = "video")]
impl From<opencv::Error> for Error {
    fn from(err: opencv::Error) -> Self {
        Self::OpenCv(err)
    }
}
