use itertools::Itertools;
use rayon::prelude::*;
use tracing::debug;

use crate::config::{IndexConfig, Scoring};
use crate::error::{Error, Result};
use crate::utils;
use super::indexer::Indexer;
use super::query::{Input, Query};
use super::signature::Signature;

/// Query result. Owned copy; holds no reference into the index.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Term id.
    pub id: String,
    /// Similarity to the query, in [0, 1].
    pub score: f64,
    /// False when no candidate reached the threshold and this is the best
    /// of the ones below it.
    pub accepted: bool,
}

/// Produced by Indexer::finish() and can be queried.
///
/// Queries take `&self` and touch no shared mutable state, so an Index can be
/// shared between any number of querying threads.
#[derive(Debug)]
pub struct Index {
    pub(super) index: Indexer,
    /// Term signatures by ordinal, kept only when scoring compares
    /// signatures. Rebuilt from the shingles on load, never persisted.
    signatures: Vec<Signature>,
}

/// Sort by score, highest first; equal scores keep insertion order.
fn ranked<I: IntoIterator<Item = (u32, f64)>>(scores: I) -> Vec<(u32, f64)> {
    scores.into_iter()
        .sorted_by(|(ordinal_a, score_a), (ordinal_b, score_b)| {
            score_b.total_cmp(score_a).then(ordinal_a.cmp(ordinal_b))
        })
        .collect()
}

impl Index {
    pub(super) fn new(indexer: Indexer) -> Index {
        let signatures = match indexer.config.scoring {
            Scoring::Exact => Vec::new(),
            Scoring::Signature | Scoring::Refined { .. } => {
                let hasher = &indexer.hasher;
                indexer.terms.par_iter()
                    .map(|term| hasher.signature(&term.shingles))
                    .collect()
            }
        };
        Index { index: indexer, signatures }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.index.config
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Shingles a text the way `Query::text` inputs are shingled.
    pub fn shingles_of(&self, text: &str) -> Vec<String> {
        self.index.text_shingles(text)
    }

    /// Distinct ordinals sharing at least one band bucket with the query.
    fn candidates(&self, band_keys: &[u64]) -> Vec<u32> {
        band_keys.iter()
            .zip(self.index.bands.iter())
            .filter_map(|(key, buckets)| buckets.get(key))
            .flatten()
            .copied()
            .sorted()
            .dedup()
            .collect()
    }

    fn rank(&self, candidates: &[u32], query_set: &[String], signature: &Signature) -> Vec<(u32, f64)> {
        let index = &self.index;
        let exact = |ordinal: u32| {
            utils::jaccard(&index.terms[ordinal as usize].shingles, query_set)
        };
        let estimate = |ordinal: u32| self.signatures[ordinal as usize].agreement(signature);

        match index.config.scoring {
            Scoring::Exact => ranked(candidates.iter().map(|&ordinal| (ordinal, exact(ordinal)))),
            Scoring::Signature => ranked(candidates.iter().map(|&ordinal| (ordinal, estimate(ordinal)))),
            Scoring::Refined { depth } => {
                let mut estimated = ranked(candidates.iter().map(|&ordinal| (ordinal, estimate(ordinal))));
                for (ordinal, score) in estimated.iter_mut().take(depth) {
                    *score = exact(*ordinal);
                }
                ranked(estimated)
            }
        }
    }

    /// Find terms similar to the query.
    ///
    /// Candidates come from the colliding LSH buckets and are ranked by score
    /// (ties: first inserted wins). Candidates below the threshold are dropped
    /// unless that would drop all of them; then only the best one is returned,
    /// with `accepted == false`. An empty result means no term collided with
    /// the query at all.
    pub fn search(&self, query: &Query) -> Result<Vec<Hit>> {
        let index = &self.index;
        if index.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let threshold = match query.threshold {
            Some(threshold) if !(0.0..=1.0).contains(&threshold) => {
                return Err(Error::invalid_config(
                    "threshold", format!("value {} is out of range [0, 1]", threshold)));
            }
            Some(threshold) => threshold,
            None => index.config.threshold,
        };

        let shingles = match &query.input {
            Input::Text(text) => index.text_shingles(text),
            Input::Shingles(shingles) => shingles.clone(),
        };
        let signature = index.hasher.signature(&shingles);
        if signature.is_no_signal() {
            debug!("Query has no shingles, nothing can match");
            return Ok(Vec::new());
        }

        let candidates = self.candidates(&signature.band_keys(index.config.rows()));
        let scored = self.rank(&candidates, &utils::shingle_set(&shingles), &signature);
        let above = scored.iter().take_while(|(_, score)| *score >= threshold).count();
        debug!(candidates = candidates.len(), above, threshold, "Ranked LSH candidates");

        let limit = query.limit.unwrap_or(usize::MAX);
        let (count, accepted) = if above > 0 {
            (above.min(limit), true)
        } else {
            (scored.len().min(1).min(limit), false)
        };
        Ok(scored.into_iter()
           .take(count)
           .map(|(ordinal, score)| Hit {
               id: index.terms[ordinal as usize].id.clone(),
               score,
               accepted,
           })
           .collect())
    }

    /// Like `search`, but only the ids.
    pub fn search_ids(&self, query: &Query) -> Result<Vec<String>> {
        Ok(self.search(query)?
           .into_iter()
           .map(|hit| hit.id)
           .collect())
    }
}
