#![allow(dead_code)]

use std::cmp::Reverse;

use tagsieve_index::{Corpus, Document, QueryType};

/// `d0:[a] d1:[a,b] d2:[b] d3:[] d4:[a]`, every ordering is `d0..d4`.
pub fn five_document_corpus() -> Corpus {
    let documents = vec![
        Document::new(0, ["a"]),
        Document::new(1, ["a", "b"]),
        Document::new(2, ["b"]),
        Document::new(3, Vec::<String>::new()),
        Document::new(4, ["a"]),
    ];
    Corpus::from_documents(documents).unwrap()
}

/// Random corpus where every query type is a differently ordered subset:
/// `LastActivityDate` keeps every document, the others drop a pseudo-random share.
pub fn random_corpus(seed: u64, documents: usize, tags: usize) -> Corpus {
    let mut rng = fastrand::Rng::with_seed(seed);
    let tag_names: Vec<String> = (0..tags).map(|i| format!("tag-{i}")).collect();
    let mut keys = Vec::with_capacity(documents);
    let docs: Vec<Document> = (0..documents as u32)
        .map(|id| {
            let mut doc_tags: Vec<&str> = Vec::new();
            for _ in 0..rng.usize(0..5) {
                // Skew towards low tag indices so counts differ.
                let tag = &tag_names[rng.usize(0..tags).min(rng.usize(0..tags))];
                if !doc_tags.contains(&tag.as_str()) {
                    doc_tags.push(tag);
                }
            }
            keys.push([rng.u32(..), rng.u32(..), rng.u32(..), rng.u32(..), rng.u32(..)]);
            Document::new(id, doc_tags)
        })
        .collect();

    Corpus::from_documents_with(docs, |query_type, doc| {
        let key = keys[doc.id as usize][query_type.index()];
        match query_type {
            QueryType::LastActivityDate => Some(Reverse(key)),
            _ if key % 4 == 0 => None,
            _ => Some(Reverse(key)),
        }
    })
    .unwrap()
}

/// Positions of the documents carrying `tag` in the `query_type` ordering.
pub fn expected_positions(corpus: &Corpus, tags: &[&str], query_type: QueryType) -> Vec<u64> {
    corpus
        .ordering(query_type)
        .all_positions()
        .iter()
        .enumerate()
        .filter(|(_, id)| {
            let doc = corpus.document(**id).unwrap();
            doc.tags.iter().any(|t| tags.contains(&t.as_str()))
        })
        .map(|(pos, _)| pos as u64)
        .collect()
}
