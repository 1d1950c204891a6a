use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{DuplicatePolicy, IndexConfig};
use crate::error::{Error, Result};
use crate::utils::{self, Shingler};
use super::signature::MinHasher;
use super::{Buckets, FastHash, Index, PreparedTerm, TermEntry};

/// Index in the "building" state: gathers terms, can't be queried.
#[derive(Debug)]
pub struct Indexer {
    pub(super) config: IndexConfig,
    pub(super) shingler: Shingler,
    pub(super) hasher: MinHasher,
    /// One bucket table per band.
    pub(super) bands: Vec<Buckets>,
    /// Reverse store, addressed by ordinal (insertion position).
    pub(super) terms: Vec<TermEntry>,
    pub(super) ids: HashMap<String, u32, FastHash>,
}

impl Indexer {
    /// Create an empty index. Fails if the configuration is invalid.
    pub fn new(config: IndexConfig) -> Result<Indexer> {
        config.validate()?;
        let bands = (0..config.bands)
            .map(|_| HashMap::with_hasher(FastHash::new()))
            .collect();
        Ok(Indexer {
            shingler: Shingler::new(config.qgram)?,
            hasher: MinHasher::new(config.num_hashes, config.seed),
            bands,
            terms: Vec::new(),
            ids: HashMap::with_capacity_and_hasher(1024, FastHash::new()),
            config,
        })
    }

    /// Reassemble a previously built index.
    pub(super) fn from_parts(config: IndexConfig, terms: Vec<TermEntry>,
                             bands: Vec<Buckets>) -> Result<Indexer> {
        let mut indexer = Indexer::new(config)?;
        if bands.len() != indexer.config.bands {
            return Err(Error::InvalidFormat(format!(
                "{} bucket tables stored, configuration expects {}",
                bands.len(), indexer.config.bands)));
        }
        if u32::try_from(terms.len()).is_err() {
            return Err(Error::TooManyTerms(u32::MAX as usize));
        }
        for (ordinal, term) in terms.iter().enumerate() {
            if indexer.ids.insert(term.id.clone(), ordinal as u32).is_some() {
                return Err(Error::InvalidFormat(format!("term id '{}' stored twice", term.id)));
            }
        }
        let out_of_range = bands.iter()
            .flat_map(|buckets| buckets.values())
            .flatten()
            .any(|&ordinal| ordinal as usize >= terms.len());
        if out_of_range {
            return Err(Error::InvalidFormat("bucket references a missing term".to_string()));
        }
        indexer.terms = terms;
        indexer.bands = bands;
        Ok(indexer)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn shingler(&self) -> &Shingler {
        &self.shingler
    }

    /// Number of distinct term ids.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Shingles of a text using the configured view (q-grams, plus words
    /// when `word_tokens` is set).
    pub(super) fn text_shingles(&self, text: &str) -> Vec<String> {
        if self.config.word_tokens {
            self.shingler.term_shingles(text)
        } else {
            self.shingler.transform(text)
        }
    }

    fn prepare<S: AsRef<str>>(&self, id: &str, shingles: &[S]) -> PreparedTerm {
        let signature = self.hasher.signature(shingles);
        let band_keys = if signature.is_no_signal() {
            None
        } else {
            Some(signature.band_keys(self.config.rows()))
        };
        PreparedTerm {
            id: id.to_string(),
            shingles: utils::shingle_set(shingles),
            band_keys,
        }
    }

    /// Remove the term from every bucket it was filed under.
    fn unlink(&mut self, ordinal: u32) {
        let signature = self.hasher.signature(&self.terms[ordinal as usize].shingles);
        if signature.is_no_signal() {
            return;
        }
        for (band, key) in signature.band_keys(self.config.rows()).into_iter().enumerate() {
            let buckets = &mut self.bands[band];
            if let Some(bucket) = buckets.get_mut(&key) {
                bucket.retain(|&member| member != ordinal);
                if bucket.is_empty() {
                    buckets.remove(&key);
                }
            }
        }
    }

    fn insert(&mut self, term: PreparedTerm) -> Result<()> {
        let PreparedTerm { id, shingles, band_keys } = term;

        let ordinal = match self.ids.get(&id) {
            Some(&ordinal) => {
                if self.config.duplicates == DuplicatePolicy::Reject {
                    return Err(Error::DuplicateId(id));
                }
                warn!(id = %id, "Overwriting duplicate term id");
                self.unlink(ordinal);
                self.terms[ordinal as usize].shingles = shingles;
                ordinal
            }
            None => {
                let ordinal = u32::try_from(self.terms.len())
                    .map_err(|_| Error::TooManyTerms(u32::MAX as usize))?;
                self.ids.insert(id.clone(), ordinal);
                self.terms.push(TermEntry { id, shingles });
                ordinal
            }
        };

        match band_keys {
            Some(keys) => {
                for (band, key) in keys.into_iter().enumerate() {
                    self.bands[band].entry(key).or_default().push(ordinal);
                }
            }
            None => {
                debug!(id = %self.terms[ordinal as usize].id,
                       "Empty shingle set; term stored but never a candidate");
            }
        }
        Ok(())
    }

    /// Add a term by its shingles. Re-adding an existing id follows the
    /// configured `DuplicatePolicy`.
    pub fn add_shingles<S: AsRef<str>>(&mut self, id: &str, shingles: &[S]) -> Result<()> {
        let term = self.prepare(id, shingles);
        self.insert(term)
    }

    /// Add a term by its (normalized) text.
    pub fn add_term(&mut self, id: &str, text: &str) -> Result<()> {
        let shingles = self.text_shingles(text);
        self.add_shingles(id, &shingles)
    }

    /// Add many `(id, text)` terms. Shingles and signatures are computed in
    /// parallel, insertion happens in slice order so ordinals (and with them
    /// tie-breaking) do not depend on thread scheduling.
    ///
    /// Under `DuplicatePolicy::Reject` the whole batch is checked first; a
    /// rejected batch leaves the indexer unchanged.
    pub fn extend_terms<I, T>(&mut self, terms: &[(I, T)]) -> Result<()>
    where
        I: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        if self.config.duplicates == DuplicatePolicy::Reject {
            let mut seen: HashSet<&str, FastHash> = HashSet::with_capacity_and_hasher(terms.len(), FastHash::new());
            for (id, _) in terms {
                let id = id.as_ref();
                if self.ids.contains_key(id) || !seen.insert(id) {
                    return Err(Error::DuplicateId(id.to_string()));
                }
            }
        }
        let prepared: Vec<PreparedTerm> = {
            let this = &*self;
            terms.par_iter()
                .map(|(id, text)| this.prepare(id.as_ref(), &this.text_shingles(text.as_ref())))
                .collect()
        };
        for term in prepared {
            self.insert(term)?;
        }
        debug!(added = terms.len(), total = self.terms.len(), "Extended index");
        Ok(())
    }

    /// Consume the Indexer and return an immutable Index with querying ability.
    pub fn finish(self) -> Index {
        let buckets: usize = self.bands.iter().map(|buckets| buckets.len()).sum();
        info!(terms = self.terms.len(), bands = self.bands.len(),
              rows = self.config.rows(), buckets, "Index finished");
        Index::new(self)
    }
}
