use anyhow::Result;
use image::{Rgb, RgbImage};

use player_reid::assoc::BBox;
use player_reid::error::Error;
use player_reid::source::{ImageSequence, PixelSource};
use player_reid::{
    export, CrossViewMatcher, Detection, DetectionStore, FrameGroup, IdentityMode, MatchConfig, View,
};

const RED: Rgb<u8> = Rgb([220, 20, 20]);
const GREEN: Rgb<u8> = Rgb([20, 200, 30]);
const BLUE: Rgb<u8> = Rgb([30, 40, 210]);

/// Frame made of vertical 20px stripes of the given colors.
fn stripes(colors: &[Rgb<u8>]) -> RgbImage {
    RgbImage::from_fn(20 * colors.len() as u32, 20, |x, _| colors[(x / 20) as usize])
}

fn stripe_box(idx: i32) -> BBox<player_reid::assoc::Ltrb> {
    BBox::ltrb(idx * 20 + 2, 2, idx * 20 + 18, 18)
}

fn det(frame: usize, stripe: i32, track_id: Option<usize>) -> Detection {
    Detection {
        frame,
        bbox: stripe_box(stripe),
        confidence: 0.9,
        class: 1,
        track_id,
    }
}

struct MemorySource {
    frames: Vec<Option<RgbImage>>,
    cursor: usize,
}

impl MemorySource {
    fn new(frames: Vec<Option<RgbImage>>) -> Self {
        Self { frames, cursor: 0 }
    }

    fn repeat(frame: RgbImage, n: usize) -> Self {
        Self::new(vec![Some(frame); n])
    }
}

impl PixelSource for MemorySource {
    fn seek(&mut self, frame: usize) -> Result<(), Error> {
        self.cursor = frame;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<RgbImage>, Error> {
        let frame = self.frames.get(self.cursor).cloned().flatten();
        self.cursor += 1;
        Ok(frame)
    }
}

/// Secondary: [red, green]; primary: [green, red], for frames `0..n`.
fn crossed_views(n: usize) -> (FrameGroup, FrameGroup) {
    let secondary = FrameGroup::from_detections(
        View::Secondary,
        (0..n).flat_map(|f| vec![det(f, 0, None), det(f, 1, None)]),
    );
    let primary = FrameGroup::from_detections(
        View::Primary,
        (0..n).flat_map(|f| vec![det(f, 0, None), det(f, 1, None)]),
    );

    (secondary, primary)
}

#[test]
fn crossed_players_are_mapped() -> Result<()> {
    let (secondary, primary) = crossed_views(5);
    let matcher = CrossViewMatcher::new(MatchConfig::default())?;

    let outcome = matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED, GREEN]), 5),
        MemorySource::repeat(stripes(&[GREEN, RED]), 5),
    )?;

    assert_eq!(outcome.frames, vec![0, 1, 2, 3, 4]);
    assert_eq!(outcome.tally.votes(0), &[(1, 5)]);
    assert_eq!(outcome.tally.votes(1), &[(0, 5)]);
    assert_eq!(export::mapping_to_json(&outcome.mapping)?, serde_json::json!({"0": 1, "1": 0}));

    Ok(())
}

#[test]
fn frame_limit_caps_votes() -> Result<()> {
    let (secondary, primary) = crossed_views(10);
    let matcher = CrossViewMatcher::new(MatchConfig { max_frames: 3, ..Default::default() })?;

    let outcome = matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED, GREEN]), 10),
        MemorySource::repeat(stripes(&[GREEN, RED]), 10),
    )?;

    assert_eq!(outcome.frames, vec![0, 1, 2]);
    assert_eq!(outcome.tally.total_votes(), 6);

    Ok(())
}

#[test]
fn unavailable_and_empty_frames_contribute_nothing() -> Result<()> {
    let mut secondary = FrameGroup::new(View::Secondary);
    let mut primary = FrameGroup::new(View::Primary);

    for f in 0..4 {
        secondary.push(det(f, 0, None));
        secondary.push(det(f, 1, None));
    }
    // Primary has no detections in frame 2.
    for &f in &[0, 1, 3] {
        primary.push(det(f, 0, None));
        primary.push(det(f, 1, None));
    }

    let frame = stripes(&[RED, GREEN]);
    let swapped = stripes(&[GREEN, RED]);
    // Secondary cannot produce frame 1.
    let secondary_source = MemorySource::new(vec![Some(frame.clone()), None, Some(frame.clone()), Some(frame)]);
    let primary_source = MemorySource::repeat(swapped, 4);

    let matcher = CrossViewMatcher::new(MatchConfig::default())?;
    let outcome = matcher.run(&secondary, &primary, secondary_source, primary_source)?;

    assert_eq!(outcome.frames, vec![0, 3]);
    assert_eq!(outcome.tally.total_votes(), 4);
    assert_eq!(outcome.mapping.get(0), Some(1));

    Ok(())
}

#[test]
fn no_shared_frames_gives_empty_mapping() -> Result<()> {
    let secondary = FrameGroup::from_detections(View::Secondary, vec![det(0, 0, None)]);
    let primary = FrameGroup::from_detections(View::Primary, vec![det(1, 0, None)]);

    let matcher = CrossViewMatcher::new(MatchConfig::default())?;
    let outcome = matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED]), 2),
        MemorySource::repeat(stripes(&[RED]), 2),
    )?;

    assert!(outcome.frames.is_empty());
    assert!(outcome.mapping.is_empty());
    assert_eq!(export::mapping_to_json(&outcome.mapping)?, serde_json::json!({}));

    Ok(())
}

#[test]
fn surplus_secondary_players_are_absent() -> Result<()> {
    let secondary = FrameGroup::from_detections(
        View::Secondary,
        (0..3).flat_map(|f| vec![det(f, 0, None), det(f, 1, None), det(f, 2, None)]),
    );
    let primary = FrameGroup::from_detections(
        View::Primary,
        (0..3).flat_map(|f| vec![det(f, 0, None), det(f, 1, None)]),
    );

    let matcher = CrossViewMatcher::new(MatchConfig::default())?;
    let outcome = matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED, GREEN, BLUE]), 3),
        MemorySource::repeat(stripes(&[GREEN, RED]), 3),
    )?;

    assert_eq!(outcome.mapping.iter().collect::<Vec<_>>(), vec![(0, 1), (1, 0)]);
    assert_eq!(outcome.mapping.get(2), None);

    Ok(())
}

#[test]
fn cutoff_controls_forced_matches() -> Result<()> {
    let secondary = FrameGroup::from_detections(
        View::Secondary,
        (0..2).flat_map(|f| vec![det(f, 0, None), det(f, 1, None)]),
    );
    let primary = secondary.iter()
        .flat_map(|(_, dets)| dets.to_vec())
        .collect::<Vec<_>>();
    let primary = FrameGroup::from_detections(View::Primary, primary);

    let run = |min_similarity: Option<f32>| -> Result<_> {
        let matcher = CrossViewMatcher::new(MatchConfig { min_similarity, ..Default::default() })?;

        Ok(matcher.run(
            &secondary,
            &primary,
            MemorySource::repeat(stripes(&[RED, BLUE]), 2),
            MemorySource::repeat(stripes(&[GREEN, RED]), 2),
        )?)
    };

    // Blue has nothing in common with green, but is force-matched by default.
    let forced = run(None)?;
    assert_eq!(forced.mapping.iter().collect::<Vec<_>>(), vec![(0, 1), (1, 0)]);

    let gated = run(Some(0.5))?;
    assert_eq!(gated.mapping.iter().collect::<Vec<_>>(), vec![(0, 1)]);
    assert!(gated.tally.votes(1).is_empty());

    Ok(())
}

#[test]
fn repeated_runs_are_identical() -> Result<()> {
    let (secondary, primary) = crossed_views(6);
    let matcher = CrossViewMatcher::new(MatchConfig::default())?;

    let run = || matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED, GREEN]), 6),
        MemorySource::repeat(stripes(&[GREEN, GREEN]), 6),
    );

    let (first, second) = (run()?, run()?);

    assert_eq!(first.mapping, second.mapping);
    assert_eq!(first.tally, second.tally);

    Ok(())
}

#[test]
fn worker_pool_matches_sequential() -> Result<()> {
    // Frame counts that are not multiples of the worker count leave a short last chunk.
    for &(count, workers) in &[(8, 3), (7, 4), (5, 2), (2, 6)] {
        let (secondary, primary) = crossed_views(count);
        let sources = || (
            MemorySource::repeat(stripes(&[RED, GREEN]), count),
            MemorySource::repeat(stripes(&[GREEN, RED]), count),
        );

        let sequential = CrossViewMatcher::new(MatchConfig::default())?;
        let (s, p) = sources();
        let expected = sequential.run(&secondary, &primary, s, p)?;

        let parallel = CrossViewMatcher::new(MatchConfig { workers, ..Default::default() })?;
        let (s, p) = sources();
        let actual = parallel.run(&secondary, &primary, s, p)?;

        assert_eq!(expected.frames.len(), count);
        assert_eq!(expected.frames, actual.frames);
        assert_eq!(expected.tally, actual.tally);
        assert_eq!(expected.mapping, actual.mapping);
    }

    Ok(())
}

#[test]
fn track_ids_survive_reordering() -> Result<()> {
    // Secondary emission order flips every frame; track ids stay with the player.
    let mut secondary = FrameGroup::new(View::Secondary);
    let mut primary = FrameGroup::new(View::Primary);
    let mut secondary_frames = vec![];

    for f in 0..4 {
        if f % 2 == 0 {
            secondary.push(det(f, 0, Some(7)));
            secondary.push(det(f, 1, Some(9)));
            secondary_frames.push(Some(stripes(&[RED, GREEN])));
        } else {
            secondary.push(det(f, 0, Some(9)));
            secondary.push(det(f, 1, Some(7)));
            secondary_frames.push(Some(stripes(&[GREEN, RED])));
        }

        primary.push(det(f, 0, Some(21)));
        primary.push(det(f, 1, Some(42)));
    }

    let matcher = CrossViewMatcher::new(MatchConfig { identity: IdentityMode::TrackId, ..Default::default() })?;
    let outcome = matcher.run(
        &secondary,
        &primary,
        MemorySource::new(secondary_frames),
        MemorySource::repeat(stripes(&[GREEN, RED]), 4),
    )?;

    assert_eq!(outcome.mapping.iter().collect::<Vec<_>>(), vec![(7, 42), (9, 21)]);

    Ok(())
}

#[test]
fn track_id_mode_fails_loudly_without_ids() -> Result<()> {
    let (secondary, primary) = crossed_views(2);
    let matcher = CrossViewMatcher::new(MatchConfig { identity: IdentityMode::TrackId, ..Default::default() })?;

    let res = matcher.run(
        &secondary,
        &primary,
        MemorySource::repeat(stripes(&[RED, GREEN]), 2),
        MemorySource::repeat(stripes(&[GREEN, RED]), 2),
    );

    assert!(matches!(res, Err(Error::MissingTrackId { view: View::Secondary, frame: 0, position: 0 })));

    Ok(())
}

#[test]
fn files_end_to_end() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (secondary_dir, primary_dir) = (dir.path().join("tacticam"), dir.path().join("broadcast"));
    std::fs::create_dir_all(&secondary_dir)?;
    std::fs::create_dir_all(&primary_dir)?;

    for f in 0..3 {
        stripes(&[RED, GREEN]).save(secondary_dir.join(format!("frame_{:06}.png", f)))?;
        stripes(&[GREEN, RED]).save(primary_dir.join(format!("frame_{:06}.png", f)))?;
    }

    let records = |class_noise: bool| {
        let mut out = vec![];
        for f in 0..3 {
            for stripe in 0..2 {
                out.push(serde_json::json!({
                    "frame": f,
                    "bbox": [stripe * 20 + 2, 2, stripe * 20 + 18, 18],
                    "confidence": 0.8,
                    "class": 1,
                }));
            }
            if class_noise {
                out.push(serde_json::json!({"frame": f, "bbox": [0, 0, 5, 5], "confidence": 0.5, "class": 0}));
                out.push(serde_json::json!({"frame": f, "bbox": [9, 9, 9, 9], "confidence": 0.5, "class": 1}));
            }
        }
        serde_json::Value::Array(out).to_string()
    };

    let secondary_json = dir.path().join("tacticam_detections.json");
    let primary_json = dir.path().join("broadcast_detections.json");
    std::fs::write(&secondary_json, records(true))?;
    std::fs::write(&primary_json, records(false))?;

    let config = MatchConfig { target_class: Some(1), ..Default::default() };
    let store: DetectionStore = config.detection_store();
    let secondary = store.load(&secondary_json, View::Secondary)?;
    let primary = store.load(&primary_json, View::Primary)?;

    assert_eq!(secondary.rejected(), 3);
    assert_eq!(secondary.detection_count(), 6);

    let matcher = CrossViewMatcher::new(config)?;
    let outcome = matcher.run(
        &secondary,
        &primary,
        ImageSequence::open(&secondary_dir)?,
        ImageSequence::open(&primary_dir)?,
    )?;

    let output = dir.path().join("player_id_mapping.json");
    export::write_mapping(&output, &outcome.mapping)?;

    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
    assert_eq!(written, serde_json::json!({"0": 1, "1": 0}));

    Ok(())
}
