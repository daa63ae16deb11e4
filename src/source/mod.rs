mod image_sequence;
#[cfg(feature = "video")]
mod video;

pub use image_sequence::ImageSequence;
#[cfg(feature = "video")]
pub use video::VideoFile;

use image::RgbImage;
use crate::error::Error;

/// A frame-indexable pixel source for one view.
///
/// Access is `seek` followed by `read`; both advance a single stateful
/// cursor, so one source must not be shared between concurrent readers.
/// Any resources held by a source are released when it is dropped.
pub trait PixelSource {
    /// Position the cursor on the 0-based `frame`.
    fn seek(&mut self, frame: usize) -> Result<(), Error>;

    /// Read the frame under the cursor and advance it.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn read(&mut self) -> Result<Option<RgbImage>, Error>;
}

impl<S: PixelSource + ?Sized> PixelSource for Box<S> {
    #[inline]
    fn seek(&mut self, frame: usize) -> Result<(), Error> {
        (**self).seek(frame)
    }

    #[inline]
    fn read(&mut self) -> Result<Option<RgbImage>, Error> {
        (**self).read()
    }
}

impl<S: PixelSource + ?Sized> PixelSource for &mut S {
    #[inline]
    fn seek(&mut self, frame: usize) -> Result<(), Error> {
        (**self).seek(frame)
    }

    #[inline]
    fn read(&mut self) -> Result<Option<RgbImage>, Error> {
        (**self).read()
    }
}
