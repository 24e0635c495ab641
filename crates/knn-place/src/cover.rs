//! Smallest exact cover of a point set by candidate neighbour sets.
//!
//! Sizes are tried in increasing order and combinations in lexicographic
//! order, so the first hit is a smallest cover and ties go to the earliest
//! candidates. Sets are packed into bitmasks over the sorted universe.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::geom2::PointId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoverError {
    #[error("{combinations} combinations of size {size} exceed the ceiling {ceiling}")]
    CeilingExceeded {
        size: usize,
        combinations: u128,
        ceiling: u128,
    },
}

/// Search bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoverSearch {
    /// First subset size tried (values below 1 start at 1).
    pub min_size: usize,
    /// Refuse a size whose combination count exceeds this. `None` enumerates everything.
    pub ceiling: Option<u128>,
}

/// `C(n, k)`, saturating at `u128::MAX`.
pub fn binomial(n: u128, k: u128) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) / (i + 1) stays integral at every step.
        acc = match acc.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return u128::MAX,
        };
    }
    acc
}

/// Indices of a smallest subset of `sets` whose union contains `universe`.
///
/// Identifiers outside `universe` are ignored. `Ok(None)` means no subset covers it.
pub fn smallest_cover(
    sets: &[BTreeSet<PointId>],
    universe: &BTreeSet<PointId>,
    search: CoverSearch,
) -> Result<Option<Vec<usize>>, CoverError> {
    if universe.is_empty() {
        return Ok(Some(Vec::new()));
    }
    let index: Vec<PointId> = universe.iter().copied().collect();
    let words = index.len().div_ceil(64);
    let masks: Vec<Vec<u64>> = sets
        .iter()
        .map(|set| {
            let mut m = vec![0u64; words];
            for id in set {
                if let Ok(i) = index.binary_search(id) {
                    m[i / 64] |= 1 << (i % 64);
                }
            }
            m
        })
        .collect();
    let mut full = vec![u64::MAX; words];
    let tail = index.len() % 64;
    if tail != 0 {
        full[words - 1] = (1u64 << tail) - 1;
    }

    let n = sets.len();
    let mut acc = vec![0u64; words];
    for size in search.min_size.max(1)..=n {
        let combinations = binomial(n as u128, size as u128);
        if let Some(ceiling) = search.ceiling {
            if combinations > ceiling {
                return Err(CoverError::CeilingExceeded {
                    size,
                    combinations,
                    ceiling,
                });
            }
        }
        debug!(size, combinations, "searching covers");
        let mut pick: Vec<usize> = (0..size).collect();
        loop {
            acc.iter_mut().for_each(|w| *w = 0);
            for &i in &pick {
                for (a, m) in acc.iter_mut().zip(&masks[i]) {
                    *a |= m;
                }
            }
            if acc == full {
                return Ok(Some(pick));
            }
            if !next_combination(&mut pick, n) {
                break;
            }
        }
    }
    Ok(None)
}

/// Advance to the next k-subset of `0..n` in lexicographic order.
fn next_combination(pick: &mut [usize], n: usize) -> bool {
    let k = pick.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if pick[i] < n - k + i {
            pick[i] += 1;
            for j in i + 1..k {
                pick[j] = pick[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
