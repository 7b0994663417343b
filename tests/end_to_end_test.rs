use std::sync::Arc;

use lexis::lexical::PageRankTable;
use lexis::storage::memory::{MemoryStorage, MemoryStorageConfig};
use lexis::{Engine, EngineConfig, IndexKind, Query, QueryType, RankingType, Storage};

fn storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
}

fn cat_engine(kind: IndexKind) -> Engine {
    let mut config = EngineConfig {
        index: kind,
        ..Default::default()
    };
    config.persistent.table_size = 101;
    config.scalable.persistent.table_size = 101;
    config.scalable.block_size = 2;

    let mut engine = Engine::new(storage(), config).unwrap();
    engine.index_document("doc1", "the cat sat").unwrap();
    engine.index_document("doc2", "the cat ran").unwrap();
    let summary = engine.finalize().unwrap();
    assert_eq!(summary.terms, 4);
    assert_eq!(summary.documents, 2);
    engine
}

fn names(engine: &Engine, text: &str, query_type: QueryType, ranking: RankingType) -> Vec<String> {
    engine
        .search(text, query_type, ranking)
        .unwrap()
        .map(|list| {
            list.iter()
                .map(|entry| engine.document_name(entry.doc_id).unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_boolean_and_phrase_queries() {
    for kind in [IndexKind::InMemory, IndexKind::Persistent, IndexKind::Scalable] {
        let engine = cat_engine(kind);
        assert_eq!(
            names(&engine, "cat", QueryType::Intersection, RankingType::TfIdf),
            vec!["doc1", "doc2"],
            "{kind:?}"
        );
        assert_eq!(
            names(&engine, "the cat", QueryType::Phrase, RankingType::TfIdf),
            vec!["doc1", "doc2"],
            "{kind:?}"
        );
        assert_eq!(
            names(&engine, "cat sat", QueryType::Phrase, RankingType::TfIdf),
            vec!["doc1"],
            "{kind:?}"
        );
        assert!(names(&engine, "sat ran", QueryType::Intersection, RankingType::TfIdf).is_empty());
        assert!(names(&engine, "cat dog", QueryType::Intersection, RankingType::TfIdf).is_empty());
    }
}

#[test]
fn test_ranked_tf_idf_tie() {
    let engine = cat_engine(IndexKind::InMemory);
    let result = engine
        .search("cat", QueryType::Ranked, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.get(0).unwrap().score, result.get(1).unwrap().score);
    assert_eq!(result.doc_ids(), vec![0, 1]);
}

#[test]
fn test_ranked_with_unknown_term_finds_nothing() {
    let engine = cat_engine(IndexKind::Persistent);
    let result = engine
        .search("cat dog", QueryType::Ranked, RankingType::TfIdf)
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn test_page_rank_breaks_tie() {
    let mut engine = cat_engine(IndexKind::InMemory);
    engine.set_page_rank(
        [("doc1".to_string(), 0.2), ("doc2".to_string(), 0.5)]
            .into_iter()
            .collect::<PageRankTable>(),
    );
    assert_eq!(
        names(&engine, "cat", QueryType::Ranked, RankingType::Combination),
        vec!["doc2", "doc1"]
    );
    assert_eq!(
        names(&engine, "cat", QueryType::Ranked, RankingType::PageRank),
        vec!["doc2", "doc1"]
    );
}

#[test]
fn test_wildcard_queries() {
    let engine = cat_engine(IndexKind::Scalable);
    assert_eq!(
        names(&engine, "the *a*", QueryType::Phrase, RankingType::TfIdf),
        vec!["doc1", "doc2"]
    );
    assert_eq!(
        names(&engine, "cat s*", QueryType::Phrase, RankingType::TfIdf),
        vec!["doc1"]
    );
    let ranked = engine
        .search("s* r*", QueryType::Ranked, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    assert_eq!(ranked.len(), 2);
}

#[test]
fn test_relevance_feedback_moves_query() {
    let engine = cat_engine(IndexKind::InMemory);
    let mut query = Query::parse("cat");
    let results = engine
        .search_query(&query, QueryType::Ranked, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    let relevant: Vec<bool> = results
        .iter()
        .map(|entry| engine.document_name(entry.doc_id) == Some("doc1"))
        .collect();

    assert!(engine.relevance_feedback(&mut query, &results, &relevant));
    let sat = query.terms().iter().find(|qt| qt.term == "sat").unwrap();
    assert!(sat.weight > 0.0);
    assert!(query.terms().iter().all(|qt| qt.term != "ran"));

    assert_eq!(
        names(&engine, &query.to_string(), QueryType::Intersection, RankingType::TfIdf),
        vec!["doc1"]
    );
    let ranked = engine
        .search_query(&query, QueryType::Ranked, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    assert_eq!(ranked.doc_ids()[0], 0);
}

#[test]
fn test_feedback_without_relevant_documents() {
    let engine = cat_engine(IndexKind::InMemory);
    let mut query = Query::parse("cat");
    let results = engine
        .search_query(&query, QueryType::Ranked, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    assert!(!engine.relevance_feedback(&mut query, &results, &[false, false]));
    assert_eq!(query.to_string(), "cat");
}
