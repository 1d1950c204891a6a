//! MinHash signatures.
//!
//! Hash function `i` is `mix(xxh3(shingle) ^ seed_i)`: one strong base hash
//! salted with a per-function seed derived from the master seed. For two
//! shingle sets A and B, the probability that position `i` agrees is close
//! to the Jaccard similarity |A ∩ B| / |A ∪ B|, so the fraction of agreeing
//! positions estimates it.
//!
//! Everything here is a pure function of the master seed, so an index built
//! in one process and queried in another sees the same family.

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// Signature value of an empty shingle set at every position.
pub const NO_SIGNAL: u64 = u64::MAX;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    values: Vec<u64>,
}

impl Signature {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Signature of an empty shingle set; never collides in the buckets.
    pub fn is_no_signal(&self) -> bool {
        self.values.iter().all(|&value| value == NO_SIGNAL)
    }

    /// Fraction of positions with equal values.
    pub fn agreement(&self, other: &Signature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self.values.iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b && **a != NO_SIGNAL)
            .count();
        matches as f64 / self.values.len() as f64
    }

    /// Bucket key of every band. `rows` must divide the signature length.
    pub fn band_keys(&self, rows: usize) -> Vec<u64> {
        self.values
            .chunks(rows)
            .enumerate()
            .map(|(band, chunk)| {
                let bytes: Vec<u8> = chunk.iter().flat_map(|value| value.to_le_bytes()).collect();
                xxh3_64_with_seed(&bytes, band as u64)
            })
            .collect()
    }
}

/// Seeded family of hash functions producing fixed-width signatures.
#[derive(Debug, Clone)]
pub struct MinHasher {
    seed: u64,
    seeds: Vec<u64>,
}

impl MinHasher {
    pub fn new(num_hashes: usize, seed: u64) -> MinHasher {
        let mut state = seed;
        let seeds = (0..num_hashes)
            .map(|_| {
                state = splitmix64(state);
                state
            })
            .collect();
        MinHasher { seed, seeds }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn num_hashes(&self) -> usize {
        self.seeds.len()
    }

    /// Per-function minima over the shingles. Duplicated shingles do not
    /// change the result.
    pub fn signature<S: AsRef<str>>(&self, shingles: &[S]) -> Signature {
        let mut values = vec![NO_SIGNAL; self.seeds.len()];
        for shingle in shingles {
            let base = xxh3_64(shingle.as_ref().as_bytes());
            for (value, &seed) in values.iter_mut().zip(self.seeds.iter()) {
                let hash = splitmix64(base ^ seed);
                if hash < *value {
                    *value = hash;
                }
            }
        }
        Signature { values }
    }
}
