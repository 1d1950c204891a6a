//! Maps free-text terms to vocabulary concepts with a default-concept
//! fallback.
//!
//! The index only reports what it found; deciding what an empty or weak
//! result means is done here.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::termdex::{Hit, Index, Query};
use crate::utils;
use crate::vocabulary::{Vocabulary, VocabularyRecord};

/// Generic "Disease" concept used when nothing better is found.
pub const DEFAULT_CONCEPT_ID: &str = "64572001";
pub const DEFAULT_CONCEPT_TERM: &str = "Disease";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub term: String,
}

impl Concept {
    pub fn new(id: &str, term: &str) -> Self {
        Concept { id: id.to_string(), term: term.to_string() }
    }

    fn from_record(record: &VocabularyRecord) -> Self {
        Concept::new(record.concept_id(), &record.term)
    }
}

impl Default for Concept {
    fn default() -> Self {
        Concept::new(DEFAULT_CONCEPT_ID, DEFAULT_CONCEPT_TERM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Best hit accepted.
    Matched,
    /// Hits existed but none passed the acceptance policy; default used.
    LowScore,
    /// Nothing collided with the query; default used.
    NoCandidate,
    /// Hits existed, none satisfied the caller's predicate; the best one
    /// was used anyway.
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Query as given by the caller.
    pub query: String,
    pub concept: Concept,
    /// Similarity of the chosen hit; None when the default was substituted
    /// for an empty result.
    pub score: Option<f64>,
    pub outcome: Outcome,
}

/// Looks terms up in an index and resolves hits through the vocabulary.
pub struct ConceptMapper<'a> {
    index: &'a Index,
    vocabulary: &'a Vocabulary,
    fallback: Concept,
    /// Caller's own acceptance score, on top of the index threshold.
    min_score: f64,
}

impl<'a> ConceptMapper<'a> {
    pub fn new(index: &'a Index, vocabulary: &'a Vocabulary) -> Self {
        ConceptMapper {
            index,
            vocabulary,
            fallback: Concept::default(),
            min_score: 0.0,
        }
    }

    pub fn fallback(mut self, fallback: Concept) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    fn concept(&self, hit: &Hit) -> Concept {
        match self.vocabulary.get(&hit.id) {
            Some(record) => Concept::from_record(record),
            /* Index built from another vocabulary revision */
            None => Concept::new(&hit.id, ""),
        }
    }

    fn acceptable(&self, hit: &Hit) -> bool {
        hit.accepted && hit.score >= self.min_score
    }

    fn substitute(&self, query: &str, score: Option<f64>, outcome: Outcome) -> Mapping {
        warn!(query, ?outcome, fallback = %self.fallback.id, "Using default concept");
        Mapping {
            query: query.to_string(),
            concept: self.fallback.clone(),
            score,
            outcome,
        }
    }

    /// Map a term to its best concept or the fallback.
    pub fn map(&self, text: &str) -> Result<Mapping> {
        let query = Query::text(&utils::normalize(text)).limit(Some(1));
        let hits = self.index.search(&query)?;
        Ok(match hits.first() {
            None => self.substitute(text, None, Outcome::NoCandidate),
            Some(hit) if !self.acceptable(hit) => {
                self.substitute(text, Some(hit.score), Outcome::LowScore)
            }
            Some(hit) => Mapping {
                query: text.to_string(),
                concept: self.concept(hit),
                score: Some(hit.score),
                outcome: Outcome::Matched,
            },
        })
    }

    /// Map a term, preferring the first of the top `k` hits whose concept
    /// satisfies `verify` (e.g. an is-a check against an ontology). Without
    /// such a hit the best one is used and marked `Unverified`.
    pub fn map_verified<F>(&self, text: &str, k: usize, verify: F) -> Result<Mapping>
    where
        F: Fn(&Concept) -> bool,
    {
        let query = Query::text(&utils::normalize(text)).limit(Some(k));
        let hits = self.index.search(&query)?;
        if hits.is_empty() {
            return Ok(self.substitute(text, None, Outcome::NoCandidate));
        }
        let verified = hits.iter()
            .filter(|hit| self.acceptable(hit))
            .map(|hit| (hit, self.concept(hit)))
            .find(|(_, concept)| verify(concept));
        Ok(match verified {
            Some((hit, concept)) => Mapping {
                query: text.to_string(),
                concept,
                score: Some(hit.score),
                outcome: Outcome::Matched,
            },
            None => Mapping {
                query: text.to_string(),
                concept: self.concept(&hits[0]),
                score: Some(hits[0].score),
                outcome: Outcome::Unverified,
            },
        })
    }

    /// Map a batch of terms, logging progress.
    pub fn map_all<I, S>(&self, terms: I) -> Result<Vec<Mapping>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<S> = terms.into_iter().collect();
        let total = terms.len();
        let mut mappings = Vec::with_capacity(total);
        for (done, term) in terms.iter().enumerate() {
            mappings.push(self.map(term.as_ref())?);
            if (done + 1) % 1000 == 0 {
                info!(done = done + 1, total, "Mapping terms");
            }
        }
        let fallbacks = mappings.iter().filter(|mapping| mapping.outcome != Outcome::Matched).count();
        info!(total, fallbacks, mean_score = ?mean_score(&mappings), "Mapping finished");
        Ok(mappings)
    }
}

/// Mean score of the hits that were used; substituted defaults are left out.
pub fn mean_score(mappings: &[Mapping]) -> Option<f64> {
    let scores: Vec<f64> = mappings.iter()
        .filter(|mapping| matches!(mapping.outcome, Outcome::Matched | Outcome::Unverified))
        .filter_map(|mapping| mapping.score)
        .collect();
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
