use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Running count, per secondary identity, of the primary identities it was
/// matched with across processed frames.
///
/// Counts for a key are kept in first-observed order, which is what breaks
/// ties in [`VoteTally::finalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    votes: BTreeMap<usize, Vec<(usize, u32)>>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one vote for every `(secondary, primary)` pair of a frame.
    pub fn accumulate<I: IntoIterator<Item = (usize, usize)>>(&mut self, pairs: I) {
        for (secondary, primary) in pairs {
            let counts = self.votes
                .entry(secondary)
                .or_insert_with(Vec::new);

            match counts.iter_mut().find(|(p, _)| *p == primary) {
                Some((_, count)) => *count += 1,
                None => counts.push((primary, 1)),
            }
        }
    }

    /// Vote counts of `secondary`, first-observed primary first.
    pub fn votes(&self, secondary: usize) -> &[(usize, u32)] {
        self.votes
            .get(&secondary)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_votes(&self) -> u32 {
        self.votes.values().flatten().map(|&(_, c)| c).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Majority vote for every secondary identity that received votes.
    pub fn finalize(&self) -> FinalMapping {
        let map = self.votes
            .iter()
            .filter_map(|(&secondary, counts)| {
                let mut best: Option<(usize, u32)> = None;

                for &(primary, count) in counts {
                    if best.map_or(true, |(_, c)| count > c) {
                        best = Some((primary, count));
                    }
                }

                best.map(|(primary, _)| (secondary, primary))
            })
            .collect();

        FinalMapping { map }
    }
}

/// Stable secondary -> primary identity correspondence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalMapping {
    map: BTreeMap<usize, usize>,
}

impl FinalMapping {
    #[inline]
    pub fn get(&self, secondary: usize) -> Option<usize> {
        self.map.get(&secondary).copied()
    }

    /// Identity to display for a secondary detection: its mapped primary
    /// identity, or its own index when it never got matched.
    #[inline]
    pub fn display_id(&self, secondary: usize) -> usize {
        self.get(secondary).unwrap_or(secondary)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::iter::FromIterator<(usize, usize)> for FinalMapping {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self { map: iter.into_iter().collect() }
    }
}

/// Serialized as a flat object with stringified keys in numeric order.
impl Serialize for FinalMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.map.len()))?;

        for (secondary, primary) in self.map.iter() {
            map.serialize_entry(&secondary.to_string(), primary)?;
        }

        map.end()
    }
}

impl fmt::Display for FinalMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;

        for (idx, (secondary, primary)) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }

            write!(f, "'{}': {}", secondary, primary)?;
        }

        f.write_str("}")
    }
}
