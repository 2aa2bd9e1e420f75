//! Brute-force Hamming matching with mutual cross-check.

use crate::Descriptor;
use serde::{Deserialize, Serialize};

/// A correspondence between a query and a train descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMatch {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Nearest neighbour of `d` in `set`; ties resolve to the lower index.
fn nearest(d: &Descriptor, set: &[Descriptor]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, other) in set.iter().enumerate() {
        let dist = d.hamming(other);
        if best.map_or(true, |(_, b)| dist < b) {
            best = Some((i, dist));
            if dist == 0 {
                break;
            }
        }
    }
    best
}

/// Keep pairs that are each other's nearest neighbour, sorted by ascending
/// distance then query index, truncated to `max_matches`.
pub fn match_descriptors(
    query: &[Descriptor],
    train: &[Descriptor],
    max_matches: usize,
) -> Vec<FeatureMatch> {
    if query.is_empty() || train.is_empty() || max_matches == 0 {
        return Vec::new();
    }

    let backward: Vec<Option<(usize, u32)>> = train.iter().map(|t| nearest(t, query)).collect();

    let mut out: Vec<FeatureMatch> = query
        .iter()
        .enumerate()
        .filter_map(|(qi, q)| {
            let (ti, distance) = nearest(q, train)?;
            let (back, _) = backward[ti]?;
            (back == qi).then_some(FeatureMatch {
                query: qi,
                train: ti,
                distance,
            })
        })
        .collect();

    out.sort_by_key(|m| (m.distance, m.query));
    out.truncate(max_matches);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(bits: u64) -> Descriptor {
        Descriptor([bits, 0, 0, 0])
    }

    #[test]
    fn cross_check_drops_one_sided_pairs() {
        // q0 and q1 both prefer t0; only the closer one survives.
        let query = [d(0b0000), d(0b0001)];
        let train = [d(0b0011), d(0b1111_0000)];
        let m = match_descriptors(&query, &train, 10);
        assert_eq!(
            m,
            vec![FeatureMatch {
                query: 1,
                train: 0,
                distance: 1
            }]
        );
    }

    #[test]
    fn sorted_and_truncated() {
        let query = [d(0xff), d(0x0f00), d(0xf0_0000)];
        let train = [d(0xf0_0001), d(0xff), d(0x0f03)];
        let all = match_descriptors(&query, &train, 10);
        let dists: Vec<u32> = all.iter().map(|m| m.distance).collect();
        assert_eq!(dists, vec![0, 1, 2]);
        assert_eq!(all[0].query, 0);

        let two = match_descriptors(&query, &train, 2);
        assert_eq!(two, all[..2].to_vec());
    }

    #[test]
    fn empty_inputs_give_no_matches() {
        assert!(match_descriptors(&[], &[d(1)], 5).is_empty());
        assert!(match_descriptors(&[d(1)], &[], 5).is_empty());
    }
}
