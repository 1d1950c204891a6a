use std::collections::BTreeSet;

use proptest::collection::btree_set;
use proptest::prelude::*;

use termdex::{Index, IndexConfig, Indexer, Query, Scoring};

fn build(terms: &BTreeSet<String>, config: IndexConfig) -> Index {
    let terms: Vec<(String, &String)> = terms.iter()
        .enumerate()
        .map(|(position, term)| (format!("t{}", position), term))
        .collect();
    let mut indexer = Indexer::new(config).unwrap();
    indexer.extend_terms(&terms).unwrap();
    indexer.finish()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_term_finds_itself(terms in btree_set("[a-z]{4,12}", 1..20)) {
        let index = build(&terms, IndexConfig::default());
        for (position, term) in terms.iter().enumerate() {
            let hits = index.search(&Query::text(term).limit(Some(1))).unwrap();
            prop_assert_eq!(hits.len(), 1);
            prop_assert_eq!(&hits[0].id, &format!("t{}", position));
            prop_assert_eq!(hits[0].score, 1.0);
            prop_assert!(hits[0].accepted);
        }
    }

    #[test]
    fn builds_are_deterministic(terms in btree_set("[a-z]{4,12}", 1..20), lookup in "[a-z]{3,10}") {
        let config = IndexConfig::default().scoring(Scoring::Signature);
        let first = build(&terms, config.clone());
        let second = build(&terms, config);
        let query = Query::text(&lookup).threshold(Some(0.0));
        prop_assert_eq!(first.search(&query).unwrap(), second.search(&query).unwrap());
    }

    #[test]
    fn persisted_index_answers_the_same(terms in btree_set("[a-z]{4,12}", 1..20), lookup in "[a-z]{3,10}") {
        let index = build(&terms, IndexConfig::default());
        let mut blob = Vec::new();
        index.write_to(&mut blob).unwrap();
        let restored = Index::read_from(blob.as_slice()).unwrap();

        prop_assert_eq!(restored.len(), index.len());
        prop_assert_eq!(restored.config(), index.config());
        for text in terms.iter().chain(std::iter::once(&lookup)) {
            let query = Query::text(text).limit(Some(5));
            prop_assert_eq!(restored.search(&query).unwrap(), index.search(&query).unwrap());
        }
    }

    #[test]
    fn raising_threshold_never_adds_results(terms in btree_set("[a-z]{4,12}", 1..20),
                                            lookup in "[a-z]{3,10}",
                                            low in 0.0f64..=1.0, high in 0.0f64..=1.0) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let index = build(&terms, IndexConfig::default().bands(256));
        let loose = index.search_ids(&Query::text(&lookup).threshold(Some(low))).unwrap();
        let strict = index.search_ids(&Query::text(&lookup).threshold(Some(high))).unwrap();
        prop_assert!(strict.len() <= loose.len());
        prop_assert!(strict.iter().all(|id| loose.contains(id)));
    }

    #[test]
    fn results_respect_the_limit(terms in btree_set("[a-z]{4,12}", 1..20),
                                 lookup in "[a-z]{3,10}", limit in 0usize..5) {
        let index = build(&terms, IndexConfig::default().bands(256));
        let hits = index.search(&Query::text(&lookup).threshold(Some(0.0)).limit(Some(limit))).unwrap();
        prop_assert!(hits.len() <= limit);
        prop_assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }
}

/// Higher Jaccard similarity must rank higher, whatever the seed.
#[test]
fn closer_sets_rank_higher() {
    let query: Vec<String> = (0..20).map(|n| format!("q{}", n)).collect();
    /* 16 shared of 24 distinct: J = 2/3 */
    let close: Vec<String> = (0..16).map(|n| format!("q{}", n))
        .chain((0..4).map(|n| format!("b{}", n)))
        .collect();
    /* 10 shared of 30 distinct: J = 1/3 */
    let far: Vec<String> = (0..10).map(|n| format!("q{}", n))
        .chain((0..10).map(|n| format!("c{}", n)))
        .collect();

    for seed in 0..20u64 {
        let config = IndexConfig::default()
            .bands(256)
            .threshold(0.0)
            .scoring(Scoring::Signature)
            .seed(seed);
        let mut indexer = Indexer::new(config).unwrap();
        indexer.add_shingles("far", &far).unwrap();
        indexer.add_shingles("close", &close).unwrap();
        let index = indexer.finish();

        let hits = index.search(&Query::shingles(&query)).unwrap();
        assert_eq!(hits.len(), 2, "seed {}", seed);
        assert_eq!(hits[0].id, "close", "seed {}", seed);
        assert!(hits[0].score > hits[1].score, "seed {}", seed);
    }
}
