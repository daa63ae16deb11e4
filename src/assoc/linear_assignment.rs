use ndarray::prelude::*;
use crate::error::Error;

/// Cost given to the dummy rows/columns used to square up a rectangular matrix.
///
/// Every real cost lies in `[0, 2]`. The value itself does not matter for
/// optimality as long as it is the same for all dummy cells.
const PADDING_COST: f32 = 0.0;

/// One secondary/primary correspondence within a frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Match {
    pub secondary: usize,
    pub primary: usize,
    pub similarity: f32,
}

/// Per-frame one-to-one correspondence, ordered by secondary index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub matches: Vec<Match>,
    pub unmatched_secondary: Vec<usize>,
    pub unmatched_primary: Vec<usize>,
}

impl Assignment {
    #[inline]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// `(secondary, primary)` index pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.matches.iter().map(|m| (m.secondary, m.primary))
    }

    /// Sum of the similarities of all produced pairs.
    pub fn total_similarity(&self) -> f32 {
        self.matches.iter().map(|m| m.similarity).sum()
    }
}

/// Solve the rectangular linear assignment problem maximizing similarity.
///
/// Parameters
/// ----------
/// similarity : ndarray
///     The MxN similarity matrix, rows are secondary-view detections and
///     columns are primary-view detections of one frame.
/// min_similarity : Option<f32>
///     Rejection cutoff. Pairs of the optimal assignment scoring below it are
///     reported as unmatched. With `None` every row and column up to
///     `min(M, N)` is matched, however dissimilar.
///
/// Returns
/// -------
/// Assignment
///     Matched pairs plus the secondary and primary indices left unmatched.
///
pub fn max_similarity_matching(
    similarity: ArrayView2<'_, f32>,
    min_similarity: Option<f32>,
) -> Result<Assignment, Error> {
    let (nrows, ncols) = similarity.dim();

    if nrows == 0 || ncols == 0 {
        return Ok(Assignment {
            matches: vec![],
            unmatched_secondary: (0..nrows).collect(),
            unmatched_primary: (0..ncols).collect(),
        });
    }

    let n = nrows.max(ncols);
    let mut cost_matrix = Array2::from_elem((n, n), PADDING_COST);

    cost_matrix
        .slice_mut(s![..nrows, ..ncols])
        .assign(&similarity.mapv(|x| if x.is_finite() { 1.0 - x } else { 1.0 }));

    let mut weights = munkres::WeightMatrix::from_row_vec(n, cost_matrix.iter().copied().collect());
    let indices = munkres::solve_assignment(&mut weights)
        .map_err(|err| Error::Assignment(format!("{:?}", err)))?;

    let mut secondary_used = vec![false; nrows];
    let mut primary_used = vec![false; ncols];
    let mut matches = vec![];

    for pos in indices.into_iter() {
        if pos.row >= nrows || pos.column >= ncols {
            continue;
        }

        let score = similarity[(pos.row, pos.column)];

        if let Some(cutoff) = min_similarity {
            if !(score >= cutoff) {
                continue;
            }
        }

        secondary_used[pos.row] = true;
        primary_used[pos.column] = true;

        matches.push(Match {
            secondary: pos.row,
            primary: pos.column,
            similarity: score,
        });
    }

    matches.sort_by_key(|m| m.secondary);

    Ok(Assignment {
        matches,
        unmatched_secondary: (0..nrows).filter(|&i| !secondary_used[i]).collect(),
        unmatched_primary: (0..ncols).filter(|&j| !primary_used[j]).collect(),
    })
}
