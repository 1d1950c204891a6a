//! Fuzzy lookup of free-text terms in a large controlled vocabulary.
//!
//! Terms are split into character q-grams, summarized by MinHash signatures
//! and filed into banded LSH buckets. A query only scores the terms it
//! collides with, so lookups stay far below a scan of the vocabulary.
//!
//! ```no_run
//! use termdex::{IndexConfig, Indexer, Query};
//!
//! let mut indexer = Indexer::new(IndexConfig::default())?;
//! indexer.add_term("38341003", "hypertension")?;
//! indexer.add_term("195967001", "asthma")?;
//! let index = indexer.finish();
//!
//! let hits = index.search(&Query::text("hypertention").limit(Some(1)))?;
//! assert_eq!(hits[0].id, "38341003");
//! # Ok::<(), termdex::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod mapping;
pub mod termdex;
pub mod utils;
pub mod vocabulary;

#[cfg(feature = "python")]
mod python;

pub use config::{DuplicatePolicy, IndexConfig, Scoring};
pub use error::{Error, Result};
pub use mapping::{Concept, ConceptMapper, Mapping, Outcome};
pub use termdex::{Hit, Index, Indexer, Input, Query, TermDex};
pub use utils::Shingler;
pub use vocabulary::{Vocabulary, VocabularyRecord};
