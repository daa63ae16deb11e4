use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::assoc::{BBox, Detection, View};
use crate::error::Error;

#[derive(Debug, Deserialize)]
struct DetectionRecord {
    frame: usize,
    bbox: [i32; 4],
    confidence: f32,
    class: i32,
    #[serde(default)]
    track_id: Option<usize>,
}

impl DetectionRecord {
    fn validate(self, record: usize) -> Result<Detection, Error> {
        let [x1, y1, x2, y2] = self.bbox;
        let bbox = BBox::ltrb(x1, y1, x2, y2);

        if bbox.is_degenerate() {
            return Err(Error::MalformedInput {
                record,
                reason: format!("degenerate bbox {:?}", self.bbox),
            });
        }

        if x2.checked_sub(x1).is_none() || y2.checked_sub(y1).is_none() {
            return Err(Error::MalformedInput {
                record,
                reason: format!("bbox {:?} size overflows", self.bbox),
            });
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::MalformedInput {
                record,
                reason: format!("confidence {} is outside [0, 1]", self.confidence),
            });
        }

        Ok(Detection {
            frame: self.frame,
            bbox,
            confidence: self.confidence,
            class: self.class,
            track_id: self.track_id,
        })
    }
}

/// Detections of one view bucketed by frame index.
///
/// Within a frame, detections keep the exact order they were received in;
/// that order is the per-frame identity index used by later stages.
#[derive(Debug, Clone)]
pub struct FrameGroup {
    view: View,
    frames: BTreeMap<usize, Vec<Detection>>,
    rejected: usize,
}

impl FrameGroup {
    pub fn new(view: View) -> Self {
        Self {
            view,
            frames: BTreeMap::new(),
            rejected: 0,
        }
    }

    /// Group detections by frame, preserving their relative order.
    pub fn from_detections<I: IntoIterator<Item = Detection>>(view: View, detections: I) -> Self {
        let mut group = Self::new(view);

        for det in detections {
            group.push(det);
        }

        group
    }

    #[inline]
    pub fn push(&mut self, det: Detection) {
        self.frames
            .entry(det.frame)
            .or_insert_with(Vec::new)
            .push(det);
    }

    #[inline]
    pub fn view(&self) -> View {
        self.view
    }

    /// Detections of `frame` in emission order; empty when the frame has none.
    #[inline]
    pub fn frame(&self, frame: usize) -> &[Detection] {
        self.frames
            .get(&frame)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Frame indices that carry at least one detection, ascending.
    pub fn frame_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Detection])> + '_ {
        self.frames.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn detection_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }

    /// Number of input records dropped as malformed while loading.
    #[inline]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Fails on the first detection without a persistent track id.
    pub fn require_track_ids(&self) -> Result<(), Error> {
        for (&frame, dets) in self.frames.iter() {
            if let Some(position) = dets.iter().position(|d| d.track_id.is_none()) {
                return Err(Error::MissingTrackId {
                    view: self.view,
                    frame,
                    position,
                });
            }
        }

        Ok(())
    }
}

/// Loads per-view detection files.
///
/// The input is a JSON array of records
/// `{"frame": 0, "bbox": [x1, y1, x2, y2], "confidence": 0.9, "class": 1}`
/// with an optional `"track_id"`. Invalid records are dropped with a warning;
/// only an input that is not a JSON array fails the whole load.
#[derive(Debug, Clone, Default)]
pub struct DetectionStore {
    target_class: Option<i32>,
}

impl DetectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only records of `class`; other records are skipped silently.
    pub fn with_target_class(mut self, class: Option<i32>) -> Self {
        self.target_class = class;
        self
    }

    /// Records of another class are skipped before validation; records
    /// without a readable class go on to be reported as malformed.
    fn is_target(&self, value: &serde_json::Value) -> bool {
        match (self.target_class, value.get("class").and_then(serde_json::Value::as_i64)) {
            (Some(target), Some(class)) => class == target as i64,
            _ => true,
        }
    }

    pub fn load<P: AsRef<Path>>(&self, path: P, view: View) -> Result<FrameGroup, Error> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;

        debug!("loading {} view detections from {}", view, path.display());

        self.parse(&data, view)
    }

    pub fn parse(&self, data: &str, view: View) -> Result<FrameGroup, Error> {
        let records: Vec<serde_json::Value> = serde_json::from_str(data)?;
        let mut group = FrameGroup::new(view);

        for (idx, value) in records.into_iter().enumerate() {
            if !self.is_target(&value) {
                continue;
            }

            let det = serde_json::from_value::<DetectionRecord>(value)
                .map_err(|err| Error::MalformedInput { record: idx, reason: err.to_string() })
                .and_then(|rec| rec.validate(idx));

            match det {
                Ok(det) => group.push(det),
                Err(err) => {
                    warn!("{} view: dropping record: {}", view, err);
                    group.rejected += 1;
                }
            }
        }

        debug!(
            "{} view: {} detections over {} frames, {} rejected",
            view,
            group.detection_count(),
            group.len(),
            group.rejected
        );

        Ok(group)
    }
}
