//! Index configuration.
//!
//! Sources, lowest to highest priority: built-in defaults, a TOML file,
//! `TERMDEX_*` environment variables (e.g. `TERMDEX_THRESHOLD=0.4`).

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_QGRAM: usize = 3;
pub const DEFAULT_NUM_HASHES: usize = 256;
pub const DEFAULT_BANDS: usize = 128;
pub const DEFAULT_THRESHOLD: f64 = 0.3;
pub const DEFAULT_SEED: u64 = 0x7e4d_5eed_1a2b_3c4d;

/// How candidates found through the buckets are scored before ranking.
///
/// `Signature` and `Refined` keep every term signature in memory once the
/// index is frozen (`num_hashes * 8` bytes per term); a query then costs one
/// signature plus `num_hashes` comparisons per candidate. `Exact` keeps
/// nothing extra and merges two sorted shingle sets per candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Exact Jaccard similarity of the stored and the queried shingle sets.
    #[default]
    Exact,
    /// Fraction of agreeing signature positions.
    Signature,
    /// Signature estimate for every candidate, exact Jaccard for the best
    /// `depth` of them, then re-ranked.
    Refined { depth: usize },
}

/// What happens when a term id is added a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the shingles of the existing term. The term keeps its
    /// original insertion position for tie-breaking.
    #[default]
    Overwrite,
    /// Fail with `Error::DuplicateId`.
    Reject,
}

/// Build and query parameters of an index. Persisted together with the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Length of character q-grams.
    pub qgram: usize,
    /// Signature width, the number of hash functions.
    pub num_hashes: usize,
    /// Number of LSH bands; must divide `num_hashes`. Fewer rows per band
    /// means more candidates (recall), more rows means fewer (precision).
    pub bands: usize,
    /// Minimal similarity of an accepted hit.
    pub threshold: f64,
    /// Master seed of the hash family.
    pub seed: u64,
    /// Append whitespace-split words to the q-grams of text inputs.
    pub word_tokens: bool,
    pub scoring: Scoring,
    pub duplicates: DuplicatePolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qgram: DEFAULT_QGRAM,
            num_hashes: DEFAULT_NUM_HASHES,
            bands: DEFAULT_BANDS,
            threshold: DEFAULT_THRESHOLD,
            seed: DEFAULT_SEED,
            word_tokens: true,
            scoring: Scoring::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl IndexConfig {
    /// Load configuration from a TOML file merged with `TERMDEX_*`
    /// environment variables. A missing file leaves the defaults in place.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: IndexConfig = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TERMDEX_"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: IndexConfig = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn qgram(mut self, qgram: usize) -> Self {
        self.qgram = qgram;
        self
    }

    pub fn num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    pub fn bands(mut self, bands: usize) -> Self {
        self.bands = bands;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn word_tokens(mut self, word_tokens: bool) -> Self {
        self.word_tokens = word_tokens;
        self
    }

    pub fn scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Rows per band.
    pub fn rows(&self) -> usize {
        self.num_hashes / self.bands.max(1)
    }

    /// Similarity at which a pair becomes a candidate with roughly 50%
    /// probability: `(1/b)^(1/r)`.
    pub fn lsh_threshold(&self) -> f64 {
        let rows = self.rows().max(1) as f64;
        (1.0 / self.bands.max(1) as f64).powf(1.0 / rows)
    }

    pub fn validate(&self) -> Result<()> {
        if self.qgram == 0 {
            return Err(Error::invalid_config("qgram", "q-gram length must be positive"));
        }
        if self.num_hashes == 0 {
            return Err(Error::invalid_config("num_hashes", "at least one hash function is required"));
        }
        if self.bands == 0 {
            return Err(Error::invalid_config("bands", "at least one band is required"));
        }
        if self.num_hashes % self.bands != 0 {
            return Err(Error::invalid_config(
                "bands",
                format!("{} bands do not evenly divide {} hashes", self.bands, self.num_hashes),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::invalid_config(
                "threshold",
                format!("value {} is out of range [0, 1]", self.threshold),
            ));
        }
        if let Scoring::Refined { depth: 0 } = self.scoring {
            return Err(Error::invalid_config("scoring", "refine depth must be positive"));
        }
        Ok(())
    }
}
