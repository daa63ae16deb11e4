use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::debug;

use crate::error::Error;
use crate::source::PixelSource;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames stored as individual image files in one directory.
///
/// Frame `i` is the `i`-th image file in file-name order, so names should
/// be zero-padded (`frame_000000.png`, `frame_000001.png`, ...).
#[derive(Debug, Clone)]
pub struct ImageSequence {
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let mut files = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

            if path.is_file() && is_image {
                files.push(path);
            }
        }

        files.sort();

        debug!("{}: {} frames", dir.display(), files.len());

        Ok(Self::from_files(files))
    }

    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self { files, cursor: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl PixelSource for ImageSequence {
    fn seek(&mut self, frame: usize) -> Result<(), Error> {
        self.cursor = frame;

        Ok(())
    }

    fn read(&mut self) -> Result<Option<RgbImage>, Error> {
        let path = match self.files.get(self.cursor) {
            Some(path) => path,
            None => return Ok(None),
        };

        let img = image::open(path)?.to_rgb8();
        self.cursor += 1;

        Ok(Some(img))
    }
}
