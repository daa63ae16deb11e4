use image::RgbImage;
use tracing::{debug, warn};

use crate::assoc::{Detection, FrameGroup, View};
use crate::error::Error;
use crate::source::PixelSource;

/// One frame that both views could produce, with its pixels and detections.
#[derive(Debug, Clone)]
pub struct SampledFrame<'a> {
    pub frame: usize,
    pub secondary: &'a [Detection],
    pub secondary_pixels: RgbImage,
    pub primary: &'a [Detection],
    pub primary_pixels: RgbImage,
}

/// Selects a bounded, ascending subset of the frames present in both views.
#[derive(Debug, Copy, Clone)]
pub struct FrameSampler {
    limit: usize,
}

impl FrameSampler {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Frame indices carrying detections in both groups, ascending.
    pub fn shared_frames(a: &FrameGroup, b: &FrameGroup) -> Vec<usize> {
        a.frame_indices()
            .filter(|&frame| !b.frame(frame).is_empty())
            .collect()
    }

    /// Walk the shared frames, reading pixels from both sources.
    ///
    /// Frames without detections on either side, or that either source
    /// cannot produce, are skipped and do not count against the limit.
    pub fn sample<'a, S, P>(
        &self,
        secondary: &'a FrameGroup,
        primary: &'a FrameGroup,
        secondary_source: &'a mut S,
        primary_source: &'a mut P,
    ) -> Samples<'a, S, P>
    where
        S: PixelSource + ?Sized,
        P: PixelSource + ?Sized,
    {
        Samples {
            candidates: Self::shared_frames(secondary, primary).into_iter(),
            secondary,
            primary,
            secondary_source,
            primary_source,
            remaining: self.limit,
        }
    }

    /// The frames [`FrameSampler::sample`] would yield.
    pub fn select<S, P>(
        &self,
        secondary: &FrameGroup,
        primary: &FrameGroup,
        secondary_source: &mut S,
        primary_source: &mut P,
    ) -> Vec<usize>
    where
        S: PixelSource + ?Sized,
        P: PixelSource + ?Sized,
    {
        self.sample(secondary, primary, secondary_source, primary_source)
            .map(|s| s.frame)
            .collect()
    }
}

pub struct Samples<'a, S: ?Sized, P: ?Sized> {
    candidates: std::vec::IntoIter<usize>,
    secondary: &'a FrameGroup,
    primary: &'a FrameGroup,
    secondary_source: &'a mut S,
    primary_source: &'a mut P,
    remaining: usize,
}

fn fetch<S: PixelSource + ?Sized>(source: &mut S, frame: usize, view: View) -> Result<RgbImage, Error> {
    source.seek(frame)?;
    source.read()?.ok_or(Error::FrameUnavailable { frame, view })
}

impl<'a, S, P> Samples<'a, S, P>
where
    S: PixelSource + ?Sized,
    P: PixelSource + ?Sized,
{
    fn check_detections(&self, frame: usize) -> Result<(), Error> {
        for group in [self.secondary, self.primary].iter() {
            if group.frame(frame).is_empty() {
                return Err(Error::EmptyAssignmentInput { frame, view: group.view() });
            }
        }

        Ok(())
    }
}

impl<'a, S, P> Iterator for Samples<'a, S, P>
where
    S: PixelSource + ?Sized,
    P: PixelSource + ?Sized,
{
    type Item = SampledFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let frame = self.candidates.next()?;

            if let Err(err) = self.check_detections(frame) {
                debug!("skipping frame: {}", err);
                continue;
            }

            let secondary_pixels = match fetch(&mut *self.secondary_source, frame, View::Secondary) {
                Ok(pixels) => pixels,
                Err(err) => {
                    warn!("skipping frame {}: {}", frame, err);
                    continue;
                }
            };

            let primary_pixels = match fetch(&mut *self.primary_source, frame, View::Primary) {
                Ok(pixels) => pixels,
                Err(err) => {
                    warn!("skipping frame {}: {}", frame, err);
                    continue;
                }
            };

            self.remaining -= 1;

            let (secondary, primary): (&'a FrameGroup, &'a FrameGroup) = (self.secondary, self.primary);

            return Some(SampledFrame {
                frame,
                secondary: secondary.frame(frame),
                secondary_pixels,
                primary: primary.frame(frame),
                primary_pixels,
            });
        }

        None
    }
}
