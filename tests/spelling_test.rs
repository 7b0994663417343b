use lexis::analysis::SimpleTokenizer;
use lexis::lexical::{HashedIndex, Index, IndexWriter, KGramIndex};
use lexis::spelling::{SpellChecker, SpellingConfig};
use lexis::{Query, QueryType, RankingType};

fn build(docs: &[&str], k: usize) -> (HashedIndex, KGramIndex) {
    let mut index = HashedIndex::new();
    let mut kgram = KGramIndex::new(k).unwrap();
    let tokenizer = SimpleTokenizer::new();
    {
        let mut writer = IndexWriter::new(&mut index, &tokenizer).with_kgram_index(&mut kgram);
        for (doc, text) in docs.iter().enumerate() {
            writer.add_document(doc as u32, &format!("doc{doc}"), text).unwrap();
        }
        writer.commit().unwrap();
    }
    (index, kgram)
}

#[test]
fn test_candidates_ranked_by_distance_minus_jaccard() {
    let (index, kgram) = build(&["hello", "hallo", "hullo"], 2);
    let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
    let candidates = checker.candidates("hxllo");

    let terms: Vec<&str> = candidates.iter().map(|c| c.term.as_str()).collect();
    assert!(terms.contains(&"hallo"));
    assert!(terms.contains(&"hullo"));
    for pair in candidates.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
    for candidate in &candidates {
        assert!(candidate.edit_distance <= 2);
        assert!(candidate.jaccard >= 0.4);
        assert_eq!(
            candidate.score,
            candidate.edit_distance as f64 - candidate.jaccard
        );
    }
}

#[test]
fn test_insertion_beats_substitution() {
    let (index, kgram) = build(&["search", "starch"], 2);
    let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
    let candidates = checker.candidates("serch");
    assert_eq!(candidates[0].term, "search");
    assert_eq!(candidates[0].edit_distance, 1);
}

#[test]
fn test_whole_query_correction() {
    let (index, kgram) = build(
        &["quick brown fox", "quick brown dog", "quick frown fox"],
        2,
    );
    let checker = SpellChecker::new(&index, &kgram, SpellingConfig::default());
    let suggestions = checker.check(&Query::parse("quck brwn"), 2).unwrap();
    assert_eq!(suggestions, vec!["quick brown", ""]);
}

#[test]
fn test_wildcard_lookup_through_kgrams() {
    let (index, kgram) = build(&["the pilot flew", "the plot thickens", "a pile of logs"], 2);
    let mut matches = kgram.matching_terms("pi*").unwrap();
    matches.sort();
    assert_eq!(matches, vec!["pile", "pilot"]);

    let mut matches = kgram.matching_terms("p*t").unwrap();
    matches.sort();
    assert_eq!(matches, vec!["pilot", "plot"]);

    let searcher = lexis::lexical::Searcher::new(&index).with_kgram_index(&kgram);
    let result = searcher
        .search(&Query::parse("the p*t"), QueryType::Phrase, RankingType::TfIdf)
        .unwrap()
        .unwrap();
    assert_eq!(result.doc_ids(), vec![0, 1]);
    assert_eq!(index.documents().len(), 3);
}

#[test]
fn test_short_terms_stay_out_of_kgram_index() {
    let (_, kgram) = build(&["a bb ccc"], 3);
    assert!(kgram.id_of("a").is_none());
    assert!(kgram.id_of("bb").is_none());
    assert!(kgram.id_of("ccc").is_some());

    let a = kgram.get_postings("$cc").map(<[u32]>::to_vec);
    assert_eq!(a, Some(vec![kgram.id_of("ccc").unwrap()]));
}
