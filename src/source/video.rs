use std::ops::Index;
use std::path::Path;

use image::RgbImage;
use opencv::{
    core::{Mat, Vec3b},
    prelude::*,
    videoio,
};

use crate::error::Error;
use crate::source::PixelSource;

/// A video file decoded through OpenCV's `VideoCapture`.
pub struct VideoFile {
    cam: videoio::VideoCapture,
    frame: Mat,
}

impl VideoFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let cam = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;

        if !videoio::VideoCapture::is_opened(&cam)? {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unable to open video {}", path.display()),
            )));
        }

        Ok(Self {
            cam,
            frame: Mat::default()?,
        })
    }

    fn to_rgb(&self) -> Result<RgbImage, Error> {
        let (rows, cols) = (self.frame.rows().max(0), self.frame.cols().max(0));
        let mut img = RgbImage::new(cols as u32, rows as u32);
        let stride = cols as usize * 3;

        if stride == 0 {
            return Ok(img);
        }

        for (y, out) in img.chunks_exact_mut(stride).enumerate() {
            bgr_row_to_rgb(self.frame.at_row::<Vec3b>(y as i32)?, out);
        }

        Ok(img)
    }
}

/// Writes one row of BGR pixels into an interleaved RGB buffer.
fn bgr_row_to_rgb<P: Index<usize, Output = u8>>(row: &[P], out: &mut [u8]) {
    for (bgr, rgb) in row.iter().zip(out.chunks_exact_mut(3)) {
        rgb[0] = bgr[2];
        rgb[1] = bgr[1];
        rgb[2] = bgr[0];
    }
}

impl PixelSource for VideoFile {
    fn seek(&mut self, frame: usize) -> Result<(), Error> {
        if self.cam.set(videoio::CAP_PROP_POS_FRAMES, frame as f64)? {
            Ok(())
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unable to seek to frame {}", frame),
            )))
        }
    }

    fn read(&mut self) -> Result<Option<RgbImage>, Error> {
        if !self.cam.read(&mut self.frame)? || self.frame.empty()? {
            return Ok(None);
        }

        self.to_rgb().map(Some)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        let _ = self.cam.release();
    }
}
