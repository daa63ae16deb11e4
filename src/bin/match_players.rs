use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use player_reid::appearance::HistogramNorm;
use player_reid::export;
use player_reid::source::{ImageSequence, PixelSource};
use player_reid::{CrossViewMatcher, IdentityMode, MatchConfig, View};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Identity {
    /// Index of the detection within its frame
    Position,
    /// `track_id` field of every detection record
    TrackId,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Norm {
    L1,
    L2,
}

/// Map secondary-view (tacticam) player ids onto primary-view (broadcast) ids.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Primary view detections (JSON array)
    #[arg(long, default_value = "broadcast_detections.json")]
    primary_detections: PathBuf,

    /// Secondary view detections (JSON array)
    #[arg(long, default_value = "tacticam_detections.json")]
    secondary_detections: PathBuf,

    /// Primary view frames: a directory of images, or a video file with the `video` feature
    #[arg(long, default_value = "broadcast.mp4")]
    primary_source: PathBuf,

    /// Secondary view frames: a directory of images, or a video file with the `video` feature
    #[arg(long, default_value = "tacticam.mp4")]
    secondary_source: PathBuf,

    /// Where to write the resulting mapping
    #[arg(short, long, default_value = "player_id_mapping.json")]
    output: PathBuf,

    /// Maximum number of frames to process
    #[arg(long, default_value_t = 50)]
    max_frames: usize,

    /// Number of hue histogram bins
    #[arg(long, default_value_t = 180)]
    bins: usize,

    #[arg(long, value_enum, default_value = "l1")]
    norm: Norm,

    /// Reject per-frame pairs with a lower cosine similarity
    #[arg(long)]
    min_similarity: Option<f32>,

    #[arg(long, value_enum, default_value = "position")]
    identity: Identity,

    /// Detector class id to keep
    #[arg(long)]
    target_class: Option<i32>,

    /// Worker threads for per-frame matching
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Also write `broadcast_dets.txt` / `tacticam_dets.txt` tracker logs into this directory
    #[arg(long)]
    tracker_logs: Option<PathBuf>,
}

fn open_source(path: &Path) -> Result<Box<dyn PixelSource>> {
    if path.is_dir() {
        return Ok(Box::new(ImageSequence::open(path)?));
    }

    #[cfg(feature = "video")]
    {
        return Ok(Box::new(player_reid::source::VideoFile::open(path)?));
    }

    #[cfg(not(feature = "video"))]
    bail!("{} is not a frame directory; video files need the `video` feature", path.display())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("player_reid=info,match_players=info")),
        )
        .init();

    let args = Args::parse();

    let config = MatchConfig {
        max_frames: args.max_frames,
        histogram_bins: args.bins,
        histogram_norm: match args.norm {
            Norm::L1 => HistogramNorm::L1,
            Norm::L2 => HistogramNorm::L2,
        },
        min_similarity: args.min_similarity,
        identity: match args.identity {
            Identity::Position => IdentityMode::Position,
            Identity::TrackId => IdentityMode::TrackId,
        },
        workers: args.workers,
        target_class: args.target_class,
    };

    let matcher = CrossViewMatcher::new(config)?;
    let store = matcher.config().detection_store();

    let primary = store
        .load(&args.primary_detections, View::Primary)
        .with_context(|| format!("loading {}", args.primary_detections.display()))?;
    let secondary = store
        .load(&args.secondary_detections, View::Secondary)
        .with_context(|| format!("loading {}", args.secondary_detections.display()))?;

    info!(
        "primary: {} frames ({} rejected), secondary: {} frames ({} rejected)",
        primary.len(),
        primary.rejected(),
        secondary.len(),
        secondary.rejected()
    );

    if let Some(dir) = &args.tracker_logs {
        std::fs::create_dir_all(dir)?;
        export::write_tracker_log(std::fs::File::create(dir.join("broadcast_dets.txt"))?, &primary)?;
        export::write_tracker_log(std::fs::File::create(dir.join("tacticam_dets.txt"))?, &secondary)?;
    }

    let outcome = matcher.run(
        &secondary,
        &primary,
        open_source(&args.secondary_source)?,
        open_source(&args.primary_source)?,
    )?;

    export::write_mapping(&args.output, &outcome.mapping)?;
    println!("Tacticam to Broadcast Player ID Mapping:");
    println!("{}", outcome.mapping);

    Ok(())
}
