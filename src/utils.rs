use std::cmp::Ordering;
use std::iter::FromIterator;
use itertools::Itertools;
use regex::Regex;
use lazy_static::lazy_static;

use unicode_segmentation::UnicodeSegmentation;
use unicode_normalization::UnicodeNormalization;
use unicode_categories::UnicodeCategories;

use crate::error::{Error, Result};

lazy_static! {
    /* Whitespace and quoting left over from extracted condition strings */
    static ref SEPARATOR: Regex = Regex::new("[\\s\"'`’„]+").expect("invalid regexp");
}

/// Splits text into fixed-length character q-grams.
///
/// Windows are taken over extended grapheme clusters so that multi-byte
/// characters are never cut in half. Windows span word boundaries; no case
/// folding is done here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shingler {
    qgram: usize,
}

impl Shingler {
    pub fn new(qgram: usize) -> Result<Shingler> {
        if qgram == 0 {
            return Err(Error::invalid_config("qgram", "q-gram length must be positive"));
        }
        Ok(Shingler { qgram })
    }

    pub fn qgram(&self) -> usize {
        self.qgram
    }

    /// All `len - q + 1` contiguous q-grams, or none for shorter inputs.
    pub fn transform(&self, text: &str) -> Vec<String> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        if graphemes.len() < self.qgram {
            return Vec::new();
        }
        Vec::from_iter(graphemes.windows(self.qgram).map(|window| window.concat()))
    }

    /// q-grams followed by whole words. Words keep short and abbreviated
    /// terms ("hiv", "copd") findable when they produce few q-grams.
    pub fn term_shingles(&self, text: &str) -> Vec<String> {
        let mut shingles = self.transform(text);
        shingles.extend(words(text));
        shingles
    }
}

impl Default for Shingler {
    fn default() -> Self {
        Shingler { qgram: crate::config::DEFAULT_QGRAM }
    }
}

pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(|word| word.to_string()).collect()
}

/// Caller-side normalization applied by the mapping jobs before querying:
/// lowercase, accents removed, quotes dropped and whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfd()
        .filter(|ch| !ch.is_mark_nonspacing())
        .collect::<String>()
        .to_lowercase();
    SEPARATOR.replace_all(folded.trim(), " ").trim().to_string()
}

/// Sorted, deduplicated shingle set.
pub fn shingle_set<S: AsRef<str>>(shingles: &[S]) -> Vec<String> {
    shingles.iter()
        .map(|shingle| shingle.as_ref())
        .sorted()
        .dedup()
        .map(|shingle| shingle.to_string())
        .collect()
}

/// Exact Jaccard similarity of two sorted, deduplicated sets. Two empty sets
/// share nothing.
pub fn jaccard<T: Ord>(side_a: &[T], side_b: &[T]) -> f64 {
    let (mut idx_a, mut idx_b, mut common) = (0, 0, 0);
    while idx_a < side_a.len() && idx_b < side_b.len() {
        match side_a[idx_a].cmp(&side_b[idx_b]) {
            Ordering::Less => idx_a += 1,
            Ordering::Greater => idx_b += 1,
            Ordering::Equal => {
                common += 1;
                idx_a += 1;
                idx_b += 1;
            }
        }
    }
    let union = side_a.len() + side_b.len() - common;
    if union == 0 {
        0.0
    } else {
        common as f64 / union as f64
    }
}
