//! Missing-Type Resolver
//!
//! Set difference between the registry's canonical set and the types
//! actually observed, at corpus and per-seed granularity. The corpus pass
//! is bounded to a sample of seeds; exactness over the whole corpus is
//! deliberately traded for cost control.

use std::collections::BTreeSet;

use super::extract;

/// Default bound on the number of seeds inspected for the corpus-wide pass.
pub const DEFAULT_MAX_CORPUS_SAMPLE: usize = 10;

/// Corpus-wide missing types: canonical minus the union of used types over
/// at most `max_sample` seeds. An empty result means the corpus already
/// covers every canonical type and the pipeline has zero work to do.
pub fn corpus_missing<'a, I>(
    seed_texts: I,
    canonical: &BTreeSet<String>,
    max_sample: usize,
) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used = BTreeSet::new();
    for text in seed_texts.into_iter().take(max_sample) {
        used.append(&mut extract::used_types(text, canonical));
    }
    canonical.difference(&used).cloned().collect()
}

/// Per-seed missing types: what is still missing at corpus scope minus
/// what this seed already uses. An empty result means the seed is skipped.
pub fn seed_missing(
    corpus_missing: &BTreeSet<String>,
    seed_used: &BTreeSet<String>,
) -> BTreeSet<String> {
    corpus_missing.difference(seed_used).cloned().collect()
}
