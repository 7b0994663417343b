//! A single entry point tying an index to its auxiliary structures.
//!
//! [`Engine`] owns the chosen [`Index`] implementation together with the
//! k-gram index, per-document term counts and page rank scores, and keeps
//! them consistent as documents are added.

pub mod config;

use std::sync::Arc;

use log::info;

use crate::analysis::SimpleTokenizer;
use crate::error::Result;
use crate::lexical::core::posting::{DocId, PostingsList, QueryType};
use crate::lexical::index::Index;
use crate::lexical::index::kgram::KGramIndex;
use crate::lexical::index::memory::HashedIndex;
use crate::lexical::index::persistent::PersistentIndex;
use crate::lexical::index::scalable::{IndexSummary, ScalableIndex};
use crate::lexical::query::{Query, TermFrequencyTable};
use crate::lexical::search::page_rank::PageRankTable;
use crate::lexical::search::searcher::{RankingType, Searcher};
use crate::lexical::writer::IndexWriter;
use crate::spelling::SpellChecker;
use crate::storage::Storage;

use self::config::{EngineConfig, IndexKind};

#[derive(Debug)]
enum IndexHandle {
    InMemory(HashedIndex),
    Persistent(PersistentIndex),
    Scalable(ScalableIndex),
}

impl IndexHandle {
    fn open(storage: Arc<dyn Storage>, config: &EngineConfig) -> Result<Self> {
        Ok(match config.index {
            IndexKind::InMemory => IndexHandle::InMemory(HashedIndex::new()),
            IndexKind::Persistent => {
                IndexHandle::Persistent(PersistentIndex::open(storage, config.persistent.clone())?)
            }
            IndexKind::Scalable => {
                IndexHandle::Scalable(ScalableIndex::open(storage, config.scalable.clone())?)
            }
        })
    }

    fn as_index(&self) -> &dyn Index {
        match self {
            IndexHandle::InMemory(index) => index,
            IndexHandle::Persistent(index) => index,
            IndexHandle::Scalable(index) => index,
        }
    }

    fn as_index_mut(&mut self) -> &mut dyn Index {
        match self {
            IndexHandle::InMemory(index) => index,
            IndexHandle::Persistent(index) => index,
            IndexHandle::Scalable(index) => index,
        }
    }

    /// Terms already on disk when the engine opens.
    fn stored_terms(&self) -> Result<Vec<String>> {
        match self {
            IndexHandle::InMemory(_) => Ok(Vec::new()),
            IndexHandle::Persistent(index) => index.terms(),
            IndexHandle::Scalable(index) => index.terms(),
        }
    }

    fn finalize(&mut self) -> Result<IndexSummary> {
        match self {
            IndexHandle::InMemory(index) => Ok(IndexSummary {
                terms: index.term_count() as u64,
                documents: index.documents().len(),
            }),
            IndexHandle::Persistent(index) => {
                index.cleanup()?;
                Ok(IndexSummary {
                    terms: index.term_count()?,
                    documents: index.documents().len(),
                })
            }
            IndexHandle::Scalable(index) => index.finalize(),
        }
    }
}

/// Indexes documents and answers boolean, phrase and ranked queries,
/// wildcard expansion, spelling suggestions and relevance feedback.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    index: IndexHandle,
    kgram: KGramIndex,
    frequencies: TermFrequencyTable,
    page_rank: PageRankTable,
    tokenizer: SimpleTokenizer,
    next_doc: DocId,
}

impl Engine {
    /// Open an engine over `storage`. In-memory engines ignore the storage.
    ///
    /// When a persistent index already holds documents, the k-gram index is
    /// rebuilt from its vocabulary and new documents continue after the
    /// highest stored id. Term counts for relevance feedback only cover
    /// documents indexed by this engine.
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let index = IndexHandle::open(storage, &config)?;
        let mut kgram = KGramIndex::new(config.kgram_size)?;
        for term in index.stored_terms()? {
            kgram.insert(&term);
        }
        let next_doc = index
            .as_index()
            .documents()
            .iter()
            .map(|(doc_id, _)| doc_id + 1)
            .max()
            .unwrap_or(0);
        if next_doc > 0 {
            info!(
                "opened index with {} documents and {} terms",
                index.as_index().documents().len(),
                kgram.term_count()
            );
        }
        Ok(Engine {
            config,
            index,
            kgram,
            frequencies: TermFrequencyTable::new(),
            page_rank: PageRankTable::new(),
            tokenizer: SimpleTokenizer::new(),
            next_doc,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &dyn Index {
        self.index.as_index()
    }

    pub fn kgram_index(&self) -> &KGramIndex {
        &self.kgram
    }

    pub fn set_page_rank(&mut self, page_rank: PageRankTable) {
        self.page_rank = page_rank;
    }

    pub fn document_name(&self, doc_id: DocId) -> Option<&str> {
        self.index().documents().name(doc_id)
    }

    /// Tokenize and index `text` under `name`, assigning the next document id.
    pub fn index_document(&mut self, name: &str, text: &str) -> Result<DocId> {
        let doc_id = self.next_doc;
        let mut writer = IndexWriter::new(self.index.as_index_mut(), &self.tokenizer)
            .with_kgram_index(&mut self.kgram)
            .with_term_frequencies(&mut self.frequencies);
        writer.add_document(doc_id, name, text)?;
        self.next_doc += 1;
        Ok(doc_id)
    }

    /// Make everything indexed so far durable and searchable.
    pub fn finalize(&mut self) -> Result<IndexSummary> {
        let summary = self.index.finalize()?;
        info!(
            "engine finalized with {} terms in {} documents",
            summary.terms, summary.documents
        );
        Ok(summary)
    }

    fn searcher(&self) -> Searcher<'_> {
        Searcher::new(self.index())
            .with_kgram_index(&self.kgram)
            .with_page_rank(&self.page_rank)
    }

    /// Parse `text` as whitespace-separated terms and run it.
    pub fn search(
        &self,
        text: &str,
        query_type: QueryType,
        ranking: RankingType,
    ) -> Result<Option<PostingsList>> {
        self.search_query(&Query::parse(text), query_type, ranking)
    }

    pub fn search_query(
        &self,
        query: &Query,
        query_type: QueryType,
        ranking: RankingType,
    ) -> Result<Option<PostingsList>> {
        self.searcher().search(query, query_type, ranking)
    }

    /// Up to `limit` corrected forms of `text`, padded with empty strings.
    pub fn suggest(&self, text: &str, limit: usize) -> Result<Vec<String>> {
        SpellChecker::new(self.index(), &self.kgram, self.config.spelling)
            .check(&Query::parse(text), limit)
    }

    /// Rewrite `query` towards the results flagged in `relevant`.
    pub fn relevance_feedback(&self, query: &mut Query, results: &PostingsList, relevant: &[bool]) -> bool {
        query.relevance_feedback(
            results,
            relevant,
            self.index(),
            &self.frequencies,
            &self.config.feedback,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryStorage, MemoryStorageConfig};

    fn storage() -> Arc<dyn Storage> {
        Arc::new(MemoryStorage::new(MemoryStorageConfig::default()))
    }

    fn engine(kind: IndexKind) -> Engine {
        let mut config = EngineConfig {
            index: kind,
            ..Default::default()
        };
        config.persistent.table_size = 1009;
        config.scalable.persistent.table_size = 1009;
        config.scalable.block_size = 3;
        let mut engine = Engine::new(storage(), config).unwrap();
        engine.index_document("one.txt", "the cat sat").unwrap();
        engine.index_document("two.txt", "the cat ran").unwrap();
        engine.finalize().unwrap();
        engine
    }

    #[test]
    fn test_every_kind_answers_alike() {
        for kind in [IndexKind::InMemory, IndexKind::Persistent, IndexKind::Scalable] {
            let engine = engine(kind);
            let hits = engine
                .search("cat", QueryType::Intersection, RankingType::TfIdf)
                .unwrap()
                .unwrap();
            assert_eq!(hits.doc_ids(), vec![0, 1], "{kind:?}");
            let phrase = engine
                .search("cat sat", QueryType::Phrase, RankingType::TfIdf)
                .unwrap()
                .unwrap();
            assert_eq!(phrase.doc_ids(), vec![0], "{kind:?}");
            assert_eq!(engine.document_name(1), Some("two.txt"));
        }
    }

    #[test]
    fn test_wildcard_and_suggestion() {
        let engine = engine(IndexKind::InMemory);
        let hits = engine
            .search("r*n", QueryType::Intersection, RankingType::TfIdf)
            .unwrap()
            .unwrap();
        assert_eq!(hits.doc_ids(), vec![1]);
        let suggestions = engine.suggest("rann", 2).unwrap();
        assert_eq!(suggestions, vec!["ran", ""]);
    }

    #[test]
    fn test_reopen_continues_ids() {
        let storage = storage();
        let config = EngineConfig {
            index: IndexKind::Persistent,
            persistent: crate::lexical::index::config::PersistentIndexConfig {
                table_size: 1009,
                ..Default::default()
            },
            ..Default::default()
        };
        {
            let mut engine = Engine::new(storage.clone(), config.clone()).unwrap();
            engine.index_document("a", "alpha beta").unwrap();
            engine.finalize().unwrap();
        }
        let mut engine = Engine::new(storage, config).unwrap();
        assert!(engine.kgram_index().id_of("alpha").is_some());
        assert_eq!(engine.index_document("b", "beta gamma").unwrap(), 1);
        engine.finalize().unwrap();
        let hits = engine
            .search("beta", QueryType::Intersection, RankingType::TfIdf)
            .unwrap()
            .unwrap();
        assert_eq!(hits.doc_ids(), vec![0, 1]);
    }
}
