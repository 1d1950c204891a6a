use std::fs;

use termdex::mapping::{mean_score, DEFAULT_CONCEPT_ID, DEFAULT_CONCEPT_TERM};
use termdex::vocabulary::build_index_file;
use termdex::{
    Concept, ConceptMapper, IndexConfig, Indexer, Outcome, Query, Shingler, TermDex, Vocabulary,
};

const VOCABULARY_JSON: &str = r#"{
    "64572001": {"term": "Disease", "id": "64572001"},
    "38341003": {"term": "Hypertension", "id": "38341003"},
    "195967001": {"term": "Asthma", "id": "195967001"},
    "73211009": {"term": "Diabetes mellitus", "id": "73211009"},
    "15771004": {"term": "Diabetes insipidus", "id": "15771004"}
}"#;

#[test]
fn misspelled_condition_finds_its_concept() {
    let shingler = Shingler::new(3).unwrap();
    let mut indexer = Indexer::new(IndexConfig::default()).unwrap();
    for (id, term) in [("64572001", "disease"), ("38341003", "hypertension"), ("195967001", "asthma")] {
        indexer.add_shingles(id, &shingler.transform(term)).unwrap();
    }
    let index = indexer.finish();

    let hits = index.search(&Query::shingles(&shingler.transform("hypertention")).limit(Some(1))).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "38341003");
    assert!(hits[0].score > 0.5);

    let hits = index.search(&Query::shingles(&shingler.transform("xyzxyz")).limit(Some(1))).unwrap();
    assert!(hits.iter().all(|hit| hit.score < 0.1));
}

#[test]
fn mapper_falls_back_to_default_concept() {
    let vocabulary = Vocabulary::from_json_str(VOCABULARY_JSON).unwrap();
    let index = vocabulary.build_index(IndexConfig::default().word_tokens(false)).unwrap();
    let mapper = ConceptMapper::new(&index, &vocabulary);

    let mapping = mapper.map("Hypertention").unwrap();
    println!("Mapped {:?}", mapping);
    assert_eq!(mapping.outcome, Outcome::Matched);
    assert_eq!(mapping.concept, Concept::new("38341003", "Hypertension"));
    assert!(mapping.score.unwrap() > 0.5);

    let mapping = mapper.map("xyzxyz").unwrap();
    assert_eq!(mapping.outcome, Outcome::NoCandidate);
    assert_eq!(mapping.concept, Concept::new(DEFAULT_CONCEPT_ID, DEFAULT_CONCEPT_TERM));
    assert_eq!(mapping.score, None);

    /* Found, but not good enough for this caller */
    let strict = ConceptMapper::new(&index, &vocabulary).min_score(0.9);
    let mapping = strict.map("hypertention").unwrap();
    assert_eq!(mapping.outcome, Outcome::LowScore);
    assert_eq!(mapping.concept.id, DEFAULT_CONCEPT_ID);
    assert!(mapping.score.is_some());

    let mappings = mapper.map_all(["asthma", "xyzxyz", "diabetes melitus"]).unwrap();
    let outcomes: Vec<Outcome> = mappings.iter().map(|mapping| mapping.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Matched, Outcome::NoCandidate, Outcome::Matched]);
    assert_eq!(mappings[2].concept.id, "73211009");

    let expected = (mappings[0].score.unwrap() + mappings[2].score.unwrap()) / 2.0;
    assert!((mean_score(&mappings).unwrap() - expected).abs() < 1e-12);
    assert_eq!(mean_score(&mappings[1..2]), None);
}

#[test]
fn mapper_finds_vocabulary_terms_as_written() {
    let vocabulary = Vocabulary::from_json_str(r#"{
        "1": {"term": "Crohn's disease", "id": "34000006"},
        "2": {"term": "Sjögren's syndrome", "id": "83901003"},
        "3": {"term": "Hodgkin’s lymphoma", "id": "118599009"},
        "4": {"term": "Disease", "id": "64572001"}
    }"#).unwrap();
    let index = vocabulary.build_index(IndexConfig::default()).unwrap();
    let mapper = ConceptMapper::new(&index, &vocabulary);

    for record in vocabulary.iter() {
        let mapping = mapper.map(&record.term).unwrap();
        println!("Mapped {:?}", mapping);
        assert_eq!(mapping.outcome, Outcome::Matched);
        assert_eq!(mapping.concept.id, record.id);
        assert_eq!(mapping.score, Some(1.0));
    }

    /* Accents and quoting do not matter either */
    let mapping = mapper.map("SJOGREN'S  syndrome").unwrap();
    assert_eq!(mapping.concept.id, "83901003");
    assert_eq!(mapping.score, Some(1.0));
}

#[test]
fn mapper_prefers_verified_concepts() {
    let vocabulary = Vocabulary::from_json_str(VOCABULARY_JSON).unwrap();
    let index = vocabulary.build_index(IndexConfig::default().bands(256).threshold(0.1)).unwrap();
    let mapper = ConceptMapper::new(&index, &vocabulary);

    /* Best hit is diabetes mellitus, the predicate only accepts insipidus */
    let mapping = mapper
        .map_verified("diabetes mellitus", 5, |concept| concept.id == "15771004")
        .unwrap();
    assert_eq!(mapping.outcome, Outcome::Matched);
    assert_eq!(mapping.concept.id, "15771004");

    let mapping = mapper.map_verified("diabetes mellitus", 5, |_| false).unwrap();
    assert_eq!(mapping.outcome, Outcome::Unverified);
    assert_eq!(mapping.concept.id, "73211009");

    let mapping = mapper.map_verified("qqqq", 5, |_| true).unwrap();
    assert_eq!(mapping.outcome, Outcome::NoCandidate);
}

#[test]
fn build_job_persists_a_queryable_index() {
    let dir = tempfile::tempdir().unwrap();
    let vocabulary_path = dir.path().join("vocabulary.json");
    let index_path = dir.path().join("processed").join("lsh_index.bin");
    fs::write(&vocabulary_path, VOCABULARY_JSON).unwrap();

    let built = build_index_file(&vocabulary_path, IndexConfig::default(), &index_path).unwrap();
    assert_eq!(built.len(), 5);

    let mut dex = TermDex::load(&index_path).unwrap();
    assert!(dex.is_frozen());
    let query = Query::text("asthma").limit(Some(1));
    assert_eq!(dex.search(&query).unwrap(), built.search(&query).unwrap());
    assert!(dex.add_term("1", "copd").is_err());
}
