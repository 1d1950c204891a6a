use std::path::Path;

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use super::{Hit, Index, Indexer, Query};

/// Index whose state is only known at runtime: building (accepts terms) or
/// frozen (answers queries). The first query or save freezes it.
#[derive(Debug)]
pub struct TermDex {
    /* Will become None after the index is frozen */
    indexer: Option<Indexer>,
    index: Option<Index>,
}

impl TermDex {
    pub fn new(config: IndexConfig) -> Result<TermDex> {
        Ok(TermDex {
            indexer: Some(Indexer::new(config)?),
            index: None,
        })
    }

    /// Load a persisted index; it starts frozen.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TermDex> {
        Ok(TermDex::from(Index::load(path)?))
    }

    pub fn is_frozen(&self) -> bool {
        self.index.is_some()
    }

    /// Number of terms, building or frozen.
    pub fn len(&self) -> usize {
        match (&self.indexer, &self.index) {
            (Some(indexer), _) => indexer.len(),
            (None, Some(index)) => index.len(),
            (None, None) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_shingles<S: AsRef<str>>(&mut self, id: &str, shingles: &[S]) -> Result<()> {
        match &mut self.indexer {
            Some(indexer) => indexer.add_shingles(id, shingles),
            None => Err(Error::AlreadyFinished),
        }
    }

    pub fn add_term(&mut self, id: &str, text: &str) -> Result<()> {
        match &mut self.indexer {
            Some(indexer) => indexer.add_term(id, text),
            None => Err(Error::AlreadyFinished),
        }
    }

    /// Freeze the index explicitly.
    pub fn finish(&mut self) -> Result<()> {
        match self.indexer.take() {
            Some(indexer) => {
                self.index = Some(indexer.finish());
                Ok(())
            }
            None => Err(Error::AlreadyFinished),
        }
    }

    /// Frozen index, freezing it first when still building.
    pub fn ready(&mut self) -> Result<&Index> {
        if self.indexer.is_some() {
            self.finish()?;
        }
        self.index.as_ref().ok_or(Error::AlreadyFinished)
    }

    /// Frozen index for shared, concurrent querying; None while building.
    pub fn frozen(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    pub fn search(&mut self, query: &Query) -> Result<Vec<Hit>> {
        self.ready()?.search(query)
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.ready()?.save(path)
    }
}

impl From<Index> for TermDex {
    fn from(index: Index) -> Self {
        TermDex {
            indexer: None,
            index: Some(index),
        }
    }
}
