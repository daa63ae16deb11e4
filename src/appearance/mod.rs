pub mod histogram;

pub use histogram::{HueHistogram, HistogramNorm};

use image::RgbImage;
use ndarray::prelude::*;

use crate::assoc::{BBox, Ltrb};

/// Computes a fixed-length appearance descriptor for one detection.
///
/// Implementations must be pure in `(frame, bbox)`: the same inputs always
/// yield the same vector. A box that covers no pixels of the frame yields
/// the zero vector of length `feature_len()` instead of an error.
pub trait AppearanceEncoder: Sync {
    fn feature_len(&self) -> usize;

    fn encode(&self, frame: &RgbImage, bbox: &BBox<Ltrb>) -> Array1<f32>;

    fn encode_batch<'a, I>(&self, frame: &RgbImage, bboxes: I) -> Vec<Array1<f32>>
    where
        I: IntoIterator<Item = &'a BBox<Ltrb>>,
        Self: Sized,
    {
        bboxes
            .into_iter()
            .map(|bbox| self.encode(frame, bbox))
            .collect()
    }
}
