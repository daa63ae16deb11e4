pub mod detection;
pub mod store;
pub mod sampler;
pub mod similarity;
pub mod linear_assignment;
pub mod votes;

pub use detection::{Detection, IdentityMode};
pub use store::{DetectionStore, FrameGroup};
pub use sampler::{FrameSampler, SampledFrame};
pub use linear_assignment::{Assignment, Match};
pub use votes::{VoteTally, FinalMapping};

use core::marker::PhantomData;
use std::fmt;

/// Which camera stream a detection set belongs to.
///
/// The two views are symmetric for the algorithm, except that the
/// resulting mapping is always expressed `secondary -> primary`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum View {
    Primary,
    Secondary,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Primary => f.write_str("primary"),
            View::Secondary => f.write_str("secondary"),
        }
    }
}

pub trait BBoxFormat: std::fmt::Debug {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Integer pixel-space bounding box in source-frame coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBox<F: BBoxFormat>([i32; 4], PhantomData<F>);

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_array(&self) -> [i32; 4] {
        self.0
    }
}

impl BBox<Ltwh> {
    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    #[inline]
    pub fn ltwh(x1: i32, x2: i32, x3: i32, x4: i32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: i32, x2: i32, x3: i32, x4: i32) -> Self {
        BBox(
            [x1, x2, x3, x4],
            Default::default(),
        )
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.0[3]
    }

    /// A box is degenerate when it has no positive area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.left() >= self.right() || self.top() >= self.bottom()
    }

    /// Intersect the box with a `width x height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clip(&self, width: u32, height: u32) -> Option<BBox<Ltrb>> {
        let (w, h) = (width.min(i32::MAX as u32) as i32, height.min(i32::MAX as u32) as i32);
        let clipped = BBox::ltrb(
            self.left().max(0).min(w),
            self.top().max(0).min(h),
            self.right().max(0).min(w),
            self.bottom().max(0).min(h),
        );

        if clipped.is_degenerate() {
            None
        } else {
            Some(clipped)
        }
    }
}

impl <'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] + v.0[0],
            v.0[3] + v.0[1],
        ], Default::default())
    }
}

impl <'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        Self([
            v.0[0],
            v.0[1],
            v.0[2] - v.0[0],
            v.0[3] - v.0[1],
        ], Default::default())
    }
}
