//! Combination Generator & Sampler
//!
//! Enumerates every subset of a seed's missing types with size in
//! `[1, min(K, m)]`, then selects a bounded sample of subsets to request.
//! One enrichment request per combination keeps prompts small and gives
//! the model a better chance of placing each type plausibly, compared to
//! cramming all missing types into a single request.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Enumerate all subsets of `missing` with size `1..=min(max_size, m)`,
/// in deterministic order (ascending size, lexicographic within a size).
pub fn enumerate_subsets(missing: &BTreeSet<String>, max_size: usize) -> Vec<Vec<String>> {
    let items: Vec<&String> = missing.iter().collect();
    let m = items.len();
    let cap = max_size.min(m);
    let mut subsets = Vec::new();

    for k in 1..=cap {
        let mut indices: Vec<usize> = (0..k).collect();
        'combos: loop {
            subsets.push(indices.iter().map(|&i| items[i].clone()).collect());

            // Advance to the next k-combination of 0..m: bump the
            // rightmost index that has room, reset the ones after it.
            let mut i = k;
            while i > 0 {
                i -= 1;
                if indices[i] < i + m - k {
                    indices[i] += 1;
                    for j in i + 1..k {
                        indices[j] = indices[j - 1] + 1;
                    }
                    continue 'combos;
                }
            }
            break;
        }
    }

    subsets
}

/// Binomial coefficient C(m, k).
pub fn binomial(m: usize, k: usize) -> usize {
    if k > m {
        return 0;
    }
    let k = k.min(m - k);
    let mut result: usize = 1;
    for i in 0..k {
        result = result * (m - i) / (i + 1);
    }
    result
}

/// Size of the full enumeration: `sum over k in 1..=min(max_size, m) of C(m, k)`.
pub fn enumeration_count(m: usize, max_size: usize) -> usize {
    (1..=max_size.min(m)).map(|k| binomial(m, k)).sum()
}

/// Select `n` variants from the enumeration.
///
/// If `n` covers the whole enumeration, every combination is returned in
/// randomized order (fair under downstream truncation or time-boxing).
/// Otherwise `n` distinct combinations are drawn uniformly at random
/// without replacement. Deterministic for a fixed RNG.
pub fn sample_variants<R: Rng>(
    missing: &BTreeSet<String>,
    max_size: usize,
    n: usize,
    rng: &mut R,
) -> Vec<Vec<String>> {
    let mut all = enumerate_subsets(missing, max_size);
    if n >= all.len() {
        all.shuffle(rng);
        return all;
    }
    let picked = rand::seq::index::sample(rng, all.len(), n);
    picked.into_iter().map(|i| all[i].clone()).collect()
}
