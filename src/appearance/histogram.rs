use image::RgbImage;
use ndarray::prelude::*;

use crate::appearance::AppearanceEncoder;
use crate::assoc::{BBox, Ltrb};

/// Hue resolution of an 8-bit HSV image (2 degrees per level).
pub const DEFAULT_BINS: usize = 180;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HistogramNorm {
    /// Entries sum to one.
    L1,
    /// Unit euclidean length.
    L2,
}

impl Default for HistogramNorm {
    fn default() -> Self {
        HistogramNorm::L1
    }
}

/// Normalized histogram of the HSV hue channel inside a detection box.
#[derive(Debug, Clone)]
pub struct HueHistogram {
    bins: usize,
    norm: HistogramNorm,
}

impl Default for HueHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_BINS, HistogramNorm::L1)
    }
}

impl HueHistogram {
    pub fn new(bins: usize, norm: HistogramNorm) -> Self {
        Self { bins, norm }
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    fn bin(&self, hue: f32) -> usize {
        ((hue / 360.0 * self.bins as f32) as usize).min(self.bins - 1)
    }
}

/// Hue of an RGB pixel in degrees, `[0, 360)`. Achromatic pixels map to 0.
pub fn hue([r, g, b]: [u8; 3]) -> f32 {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    if delta <= 0.0 {
        return 0.0;
    }

    let h = if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };

    if h < 0.0 { h + 360.0 } else { h }
}

impl AppearanceEncoder for HueHistogram {
    #[inline]
    fn feature_len(&self) -> usize {
        self.bins
    }

    fn encode(&self, frame: &RgbImage, bbox: &BBox<Ltrb>) -> Array1<f32> {
        let mut hist = Array1::<f32>::zeros(self.bins);

        if self.bins == 0 {
            return hist;
        }

        let roi = match bbox.clip(frame.width(), frame.height()) {
            Some(roi) => roi,
            None => return hist,
        };

        for y in roi.top()..roi.bottom() {
            for x in roi.left()..roi.right() {
                let px = frame.get_pixel(x as u32, y as u32);
                hist[self.bin(hue(px.0))] += 1.0;
            }
        }

        let norm = match self.norm {
            HistogramNorm::L1 => hist.sum(),
            HistogramNorm::L2 => hist.fold(0.0, |a, x| a + x * x).sqrt(),
        };

        if norm > 0.0 {
            hist /= norm;
        }

        hist
    }
}
