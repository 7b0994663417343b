//! Text encoding of postings records in the data file.
//!
//! A record is `<term> <docID>:<offsets>:<docID>:<offsets>...` where the
//! offsets of one document are joined by `.`. Records carry no length
//! prefix; the dictionary entry that points at a record stores its length.
//! The leading term is checked on read to confirm that the pointer landed on
//! the intended record.

use crate::error::{LexisError, Result};
use crate::lexical::core::posting::{DocId, PostingsEntry, PostingsList};

/// Serialize the postings of `term`.
pub fn encode(term: &str, postings: &PostingsList) -> String {
    format!("{term} {postings}")
}

/// The term a record belongs to.
pub fn term_of(record: &str) -> &str {
    record
        .split_once(' ')
        .map(|(term, _)| term)
        .unwrap_or(record)
}

/// Parse a record back into its term and postings.
pub fn decode(record: &str) -> Result<(&str, PostingsList)> {
    let (term, body) = record
        .split_once(' ')
        .ok_or_else(|| LexisError::index(format!("postings record without body: {record:?}")))?;

    let mut postings = PostingsList::new();
    let mut groups = body.split(':');
    while let Some(doc) = groups.next() {
        let doc_id: DocId = doc
            .parse()
            .map_err(|_| LexisError::index(format!("bad document id {doc:?} in record of {term:?}")))?;
        let offsets = groups.next().ok_or_else(|| {
            LexisError::index(format!("document {doc_id} has no offsets in record of {term:?}"))
        })?;
        let offsets = if offsets.is_empty() {
            Vec::new()
        } else {
            offsets
                .split('.')
                .map(|o| {
                    o.parse::<u32>().map_err(|_| {
                        LexisError::index(format!("bad offset {o:?} in record of {term:?}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };
        postings.push_entry(PostingsEntry::with_offsets(doc_id, offsets));
    }
    Ok((term, postings))
}

/// Append the document groups of `newer` to the record `older`.
///
/// Both records must belong to the same term, and every document in `newer`
/// must follow the documents of `older`, except that the last document of
/// `older` may continue in `newer` when its postings straddle a block
/// boundary. That case is folded into a single group so document ids stay
/// unique.
pub fn concat(older: &str, newer: &str) -> Result<String> {
    let (old_term, old_postings) = decode(older)?;
    let (new_term, new_postings) = decode(newer)?;
    if old_term != new_term {
        return Err(LexisError::index(format!(
            "cannot merge records of {old_term:?} and {new_term:?}"
        )));
    }

    let straddles = match (old_postings.entries().last(), new_postings.get(0)) {
        (Some(last), Some(first)) => last.doc_id == first.doc_id,
        _ => false,
    };
    if !straddles {
        let (_, new_body) = newer.split_once(' ').unwrap_or((newer, ""));
        return Ok(format!("{older}:{new_body}"));
    }

    let mut merged = old_postings;
    for entry in new_postings.into_entries() {
        for offset in entry.offsets {
            merged.add_entry(entry.doc_id, offset);
        }
    }
    Ok(encode(old_term, &merged))
}
