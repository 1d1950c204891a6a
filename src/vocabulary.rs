//! Controlled vocabulary and the index build job.
//!
//! The vocabulary file is a JSON object `key -> {"term", "id", "concept"?}`.
//! Records are kept in key order, which is also the order terms are fed to
//! the indexer, so two builds from the same file produce identical indexes.
//! Records sharing an id are all kept; the index build applies the
//! configured `DuplicatePolicy` to them.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::termdex::{FastHash, Index, Indexer};
use crate::utils;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyRecord {
    /// Canonical surface form.
    pub term: String,
    /// Stable identifier stored in the index.
    pub id: String,
    /// Concept code, when it differs from `id` (e.g. a description id
    /// pointing at its concept).
    #[serde(default)]
    pub concept: Option<String>,
}

impl VocabularyRecord {
    pub fn concept_id(&self) -> &str {
        self.concept.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    records: Vec<VocabularyRecord>,
    by_id: HashMap<String, usize, FastHash>,
}

impl Vocabulary {
    pub fn from_records<I: IntoIterator<Item = VocabularyRecord>>(records: I) -> Vocabulary {
        let mut vocabulary = Vocabulary::default();
        for record in records {
            /* Lookups see the last record, as an overwriting index build does */
            vocabulary.by_id.insert(record.id.clone(), vocabulary.records.len());
            vocabulary.records.push(record);
        }
        vocabulary
    }

    pub fn from_json_str(json: &str) -> Result<Vocabulary> {
        let entries: BTreeMap<String, VocabularyRecord> = serde_json::from_str(json)?;
        Ok(Vocabulary::from_records(entries.into_values()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vocabulary> {
        let path = path.as_ref();
        let entries: BTreeMap<String, VocabularyRecord> =
            serde_json::from_reader(BufReader::new(File::open(path)?))?;
        let vocabulary = Vocabulary::from_records(entries.into_values());
        info!(path = %path.display(), records = vocabulary.len(), "Vocabulary loaded");
        Ok(vocabulary)
    }

    /// Number of records, repeated ids included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Number of distinct ids.
    pub fn distinct(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VocabularyRecord> {
        self.by_id.get(id).map(|&position| &self.records[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyRecord> {
        self.records.iter()
    }

    /// Index every term in vocabulary order, normalized the way
    /// `ConceptMapper` normalizes its queries.
    pub fn build_index(&self, config: IndexConfig) -> Result<Index> {
        let mut indexer = Indexer::new(config)?;
        let terms: Vec<(&str, String)> = self.records.iter()
            .map(|record| (record.id.as_str(), utils::normalize(&record.term)))
            .collect();
        indexer.extend_terms(&terms)?;
        Ok(indexer.finish())
    }
}

/// Build an index from a vocabulary file and persist it.
pub fn build_index_file<P: AsRef<Path>, Q: AsRef<Path>>(vocabulary_path: P, config: IndexConfig,
                                                        index_path: Q) -> Result<Index> {
    let vocabulary = Vocabulary::load(vocabulary_path)?;
    let index = vocabulary.build_index(config)?;
    index.save(index_path)?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::Error;
    use crate::termdex::Query;

    const JSON: &str = r#"{
        "b": {"term": "Hypertension", "id": "38341003"},
        "a": {"term": "Disease", "id": "64572001"},
        "c": {"term": "Asthma", "id": "d-195967001", "concept": "195967001"}
    }"#;

    #[test]
    fn it_reads_records_in_key_order() {
        let vocabulary = Vocabulary::from_json_str(JSON).unwrap();
        assert_eq!(vocabulary.len(), 3);
        let ids: Vec<&str> = vocabulary.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["64572001", "38341003", "d-195967001"]);

        let asthma = vocabulary.get("d-195967001").unwrap();
        assert_eq!(asthma.concept_id(), "195967001");
        assert_eq!(vocabulary.get("38341003").unwrap().concept_id(), "38341003");
        assert!(vocabulary.get("195967001").is_none());
    }

    #[test]
    fn it_builds_normalized_index() {
        let vocabulary = Vocabulary::from_json_str(JSON).unwrap();
        let index = vocabulary.build_index(IndexConfig::default()).unwrap();
        assert_eq!(index.len(), 3);
        let hits = index.search(&Query::text("asthma").limit(Some(1))).unwrap();
        assert_eq!(hits[0].id, "d-195967001");
        assert_eq!(hits[0].score, 1.0);

        let vocabulary = Vocabulary::from_records(vec![
            VocabularyRecord { term: "Crohn's disease".into(), id: "34000006".into(), concept: None },
            VocabularyRecord { term: "Sjögren's syndrome".into(), id: "83901003".into(), concept: None },
        ]);
        let index = vocabulary.build_index(IndexConfig::default()).unwrap();
        for (text, id) in [("crohn s disease", "34000006"), ("sjogren s syndrome", "83901003")] {
            let hits = index.search(&Query::text(text).limit(Some(1))).unwrap();
            assert_eq!(hits[0].id, id);
            assert_eq!(hits[0].score, 1.0);
        }
    }

    #[test]
    fn it_keeps_repeated_ids() {
        let vocabulary = Vocabulary::from_records(vec![
            VocabularyRecord { term: "asthma".into(), id: "1".into(), concept: None },
            VocabularyRecord { term: "disease".into(), id: "2".into(), concept: None },
            VocabularyRecord { term: "bronchial asthma".into(), id: "1".into(), concept: None },
        ]);
        assert_eq!(vocabulary.len(), 3);
        assert_eq!(vocabulary.distinct(), 2);
        assert_eq!(vocabulary.get("1").unwrap().term, "bronchial asthma");

        /* Overwrite: the later record replaces the term */
        let index = vocabulary.build_index(IndexConfig::default()).unwrap();
        assert_eq!(index.len(), 2);
        let hits = index.search(&Query::text("bronchial asthma").limit(Some(1))).unwrap();
        assert_eq!(hits[0].id, "1");
        assert_eq!(hits[0].score, 1.0);
    }

    #[test]
    fn it_rejects_repeated_ids_when_asked() {
        let json = r#"{
            "k1": {"term": "Asthma", "id": "1"},
            "k2": {"term": "Hypertension", "id": "1"}
        }"#;
        let vocabulary = Vocabulary::from_json_str(json).unwrap();
        let config = IndexConfig::default().duplicates(DuplicatePolicy::Reject);
        match vocabulary.build_index(config) {
            Err(Error::DuplicateId(id)) => assert_eq!(id, "1"),
            other => panic!("Expected duplicate id error, got {:?}", other.map(|index| index.len())),
        }
        assert!(vocabulary.build_index(IndexConfig::default()).is_ok());
    }

    #[test]
    fn it_rejects_malformed_files() {
        assert!(Vocabulary::from_json_str("[1, 2]").is_err());
        assert!(Vocabulary::from_json_str(r#"{"a": {"term": "x"}}"#).is_err());
    }
}
