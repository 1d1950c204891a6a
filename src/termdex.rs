//! LSH index over term shingle sets.
//!
//! An [`Indexer`] gathers terms; [`Indexer::finish`] turns it into an
//! immutable [`Index`] that answers queries. [`TermDex`] wraps both states for
//! callers that only learn at runtime which state they are in.

use std::collections::HashMap;

mod indexer;
mod persist;
mod seeker;
mod state;
pub mod query;
pub mod signature;


pub use indexer::Indexer;
pub use query::{Input, Query};
pub use seeker::{Hit, Index};
pub use state::TermDex;

/* Fast hashing, but requires AES-ni extensions */
pub(crate) type FastHash = ahash::RandomState;

/// Bucket table of a single band: band key -> term ordinals.
type Buckets = HashMap<u64, Vec<u32>, FastHash>;

/// Reverse store entry, addressed by the term ordinal.
#[derive(Debug, Clone)]
struct TermEntry {
    /// External term identifier.
    id: String,
    /// Sorted, deduplicated shingles.
    shingles: Vec<String>,
}

/// Term prepared outside of the index: shingle set and band keys computed,
/// ready for a single writer to insert.
#[derive(Debug)]
struct PreparedTerm {
    id: String,
    shingles: Vec<String>,
    /// None for an empty shingle set.
    band_keys: Option<Vec<u64>>,
}
