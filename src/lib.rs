pub mod appearance;
pub mod assoc;
pub mod error;
pub mod export;
pub mod source;

pub use assoc::{Detection, DetectionStore, FinalMapping, FrameGroup, IdentityMode, View, VoteTally};
use appearance::{AppearanceEncoder, HistogramNorm, HueHistogram};
use assoc::similarity::{cosine_similarity, stack_features};
use assoc::linear_assignment::max_similarity_matching;
use assoc::{FrameSampler, SampledFrame};
use error::Error;
use source::PixelSource;

use rayon::prelude::*;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Number of successfully processed frames after which sampling stops.
    pub max_frames: usize,
    pub histogram_bins: usize,
    pub histogram_norm: HistogramNorm,
    /// Reject per-frame pairs scoring below this; `None` force-matches every slot.
    pub min_similarity: Option<f32>,
    pub identity: IdentityMode,
    /// Threads used for per-frame feature extraction and assignment.
    pub workers: usize,
    /// Detector class to keep when loading detection files.
    pub target_class: Option<i32>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_frames: 50,
            histogram_bins: appearance::histogram::DEFAULT_BINS,
            histogram_norm: HistogramNorm::L1,
            min_similarity: None,
            identity: IdentityMode::Position,
            workers: 1,
            target_class: None,
        }
    }
}

impl MatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.max_frames == 0 {
            return Err(Error::InvalidConfig("max_frames must be positive".into()));
        }

        if self.histogram_bins == 0 {
            return Err(Error::InvalidConfig("histogram_bins must be positive".into()));
        }

        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be positive".into()));
        }

        if let Some(cutoff) = self.min_similarity {
            if !(-1.0..=1.0).contains(&cutoff) {
                return Err(Error::InvalidConfig(format!("min_similarity {} is outside [-1, 1]", cutoff)));
            }
        }

        Ok(())
    }

    /// Detection loader honouring `target_class`.
    pub fn detection_store(&self) -> DetectionStore {
        DetectionStore::new().with_target_class(self.target_class)
    }
}

/// Result of one matching run.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub mapping: FinalMapping,
    pub tally: VoteTally,
    /// Frames that contributed votes, in processing order.
    pub frames: Vec<usize>,
}

/// Cross-view association engine.
///
/// For every sampled frame the detections of both views are encoded,
/// scored against each other, optimally paired and the pairs are voted
/// into a tally; the final mapping is the per-identity majority.
///
/// With [`IdentityMode::Position`] a detection's identity is its index in
/// its frame's list, so the secondary view must emit detections in an
/// identity-stable order across frames (e.g. sorted by an upstream
/// tracker). Otherwise votes from different players get mixed; use
/// [`IdentityMode::TrackId`] when persistent ids are available.
pub struct CrossViewMatcher<E: AppearanceEncoder = HueHistogram> {
    config: MatchConfig,
    encoder: E,
}

impl CrossViewMatcher<HueHistogram> {
    pub fn new(config: MatchConfig) -> Result<Self, Error> {
        let encoder = HueHistogram::new(config.histogram_bins, config.histogram_norm);

        Self::with_encoder(config, encoder)
    }
}

impl<E: AppearanceEncoder> CrossViewMatcher<E> {
    pub fn with_encoder(config: MatchConfig, encoder: E) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self { config, encoder })
    }

    #[inline]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Encode, score and assign one frame.
    ///
    /// Returns `(secondary identity, primary identity)` pairs.
    pub fn process_frame(&self, sample: &SampledFrame<'_>) -> Result<Vec<(usize, usize)>, Error> {
        let len = self.encoder.feature_len();
        let secondary = self.encoder.encode_batch(&sample.secondary_pixels, sample.secondary.iter().map(|d| &d.bbox));
        let primary = self.encoder.encode_batch(&sample.primary_pixels, sample.primary.iter().map(|d| &d.bbox));

        let similarity = cosine_similarity(
            stack_features(&secondary, len).view(),
            stack_features(&primary, len).view(),
        );

        let assignment = max_similarity_matching(similarity.view(), self.config.min_similarity)?;

        debug!(
            "frame {}: {}x{} detections, {} pairs, total similarity {:.3}",
            sample.frame,
            sample.secondary.len(),
            sample.primary.len(),
            assignment.len(),
            assignment.total_similarity()
        );

        let mode = self.config.identity;

        assignment
            .pairs()
            .map(|(s, p)| -> Result<(usize, usize), Error> {
                Ok((
                    sample.secondary[s].identity(s, mode, View::Secondary)?,
                    sample.primary[p].identity(p, mode, View::Primary)?,
                ))
            })
            .collect()
    }

    /// Run the full association over two views.
    ///
    /// The pixel sources are owned by the run and released when it returns.
    /// Running out of shared frames before anything was processed yields an
    /// empty mapping, not an error.
    pub fn run<S, P>(
        &self,
        secondary: &FrameGroup,
        primary: &FrameGroup,
        mut secondary_source: S,
        mut primary_source: P,
    ) -> Result<MatchOutcome, Error>
    where
        S: PixelSource,
        P: PixelSource,
    {
        match self.config.identity {
            IdentityMode::TrackId => {
                secondary.require_track_ids()?;
                primary.require_track_ids()?;
            }
            IdentityMode::Position => {
                info!("identities are per-frame positions; the secondary view must list detections in an identity-stable order");
            }
        }

        let sampler = FrameSampler::new(self.config.max_frames);
        let samples = sampler.sample(secondary, primary, &mut secondary_source, &mut primary_source);

        let mut tally = VoteTally::new();
        let mut frames = Vec::new();
        let mut secondary_counts = BTreeSet::new();

        if self.config.workers <= 1 {
            for sample in samples {
                tally.accumulate(self.process_frame(&sample)?);
                frames.push(sample.frame);
                secondary_counts.insert(sample.secondary.len());
            }
        } else {
            let mut samples = samples;
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
                .map_err(|err| Error::InvalidConfig(err.to_string()))?;

            // At most `workers` frame pairs are decoded at a time.
            loop {
                let chunk: Vec<_> = samples.by_ref().take(self.config.workers).collect();

                if chunk.is_empty() {
                    break;
                }

                let results: Vec<Result<Vec<(usize, usize)>, Error>> = pool.install(|| {
                    chunk
                        .par_iter()
                        .map(|sample| self.process_frame(sample))
                        .collect()
                });

                for (sample, pairs) in chunk.iter().zip(results) {
                    tally.accumulate(pairs?);
                    frames.push(sample.frame);
                    secondary_counts.insert(sample.secondary.len());
                }
            }
        }

        if self.config.identity == IdentityMode::Position && secondary_counts.len() > 1 {
            warn!(
                "secondary detection count varies across sampled frames ({:?}); position identities are likely unstable",
                secondary_counts
            );
        }

        let mapping = tally.finalize();

        info!(
            "{} frames processed, {} votes, {} secondary identities mapped",
            frames.len(),
            tally.total_votes(),
            mapping.len()
        );

        Ok(MatchOutcome { mapping, tally, frames })
    }
}
