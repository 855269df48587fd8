//! Corpus loading for tagsieve-cmd: JSON files and seeded synthetic collections.

use std::{cmp::Reverse, collections::BTreeMap, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use tagsieve_index::{Corpus, Document, QueryType};

use crate::CorpusArgs;

#[derive(Deserialize)]
struct CorpusFile {
    documents: Vec<CorpusDocument>,
}

#[derive(Deserialize)]
struct CorpusDocument {
    id: u32,
    #[serde(default)]
    tags: Vec<String>,
    /// Sort key per query type name; higher keys come first. A document without
    /// a key for a query type is left out of that ordering.
    #[serde(default)]
    keys: BTreeMap<String, i64>,
}

pub fn load_corpus(args: &CorpusArgs) -> Result<Corpus> {
    match &args.corpus {
        Some(path) => {
            let corpus = read_corpus_file(path)?;
            info!(
                "Loaded {} documents with {} distinct tags from {path}",
                corpus.document_count(),
                corpus.catalog().len()
            );
            Ok(corpus)
        }
        None => {
            let corpus = synthetic_corpus(args.synthetic_docs, args.synthetic_tags, args.seed)?;
            info!(
                "Generated {} documents with {} distinct tags (seed {})",
                corpus.document_count(),
                corpus.catalog().len(),
                args.seed
            );
            Ok(corpus)
        }
    }
}

/// Reads a JSON corpus. When no document carries sort keys, every query type
/// orders the documents by id.
pub fn read_corpus_file(path: impl AsRef<Path>) -> Result<Corpus> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
    let parsed: CorpusFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;

    let mut entries = parsed.documents;
    entries.sort_by_key(|doc| doc.id);

    let mut keys: Vec<[Option<i64>; QueryType::COUNT]> = Vec::with_capacity(entries.len());
    let mut keyed = false;
    for entry in &entries {
        let mut doc_keys = [None; QueryType::COUNT];
        for (name, &key) in &entry.keys {
            let query_type: QueryType = name
                .parse()
                .with_context(|| format!("Document {} has an unknown key '{name}'", entry.id))?;
            doc_keys[query_type.index()] = Some(key);
            keyed = true;
        }
        keys.push(doc_keys);
    }

    let documents: Vec<Document> = entries
        .into_iter()
        .map(|entry| Document::new(entry.id, entry.tags))
        .collect();
    let corpus = if keyed {
        Corpus::from_documents_with(documents, |query_type, doc| {
            keys.get(doc.id as usize)
                .and_then(|doc_keys| doc_keys[query_type.index()])
                .map(Reverse)
        })
    } else {
        Corpus::from_documents(documents)
    };
    corpus.with_context(|| format!("Invalid corpus in {}", path.display()))
}

/// A seeded collection with a skewed tag distribution. The date orderings cover
/// every document; `AnswerCount` only covers the documents that have answers.
pub fn synthetic_corpus(documents: u32, tags: usize, seed: u64) -> Result<Corpus> {
    anyhow::ensure!(tags > 0, "synthetic corpus needs at least one tag");
    let mut rng = fastrand::Rng::with_seed(seed);
    let tag_names: Vec<String> = (0..tags).map(|i| format!("tag{i:05}")).collect();

    let mut keys = Vec::with_capacity(documents as usize);
    let mut docs = Vec::with_capacity(documents as usize);
    for id in 0..documents {
        let tag_count = rng.usize(1..=5);
        let mut doc_tags: Vec<String> = Vec::with_capacity(tag_count);
        for _ in 0..tag_count {
            // Cubing a uniform sample favors the low tag numbers.
            let slot = ((rng.f64().powi(3) * tags as f64) as usize).min(tags - 1);
            if !doc_tags.contains(&tag_names[slot]) {
                doc_tags.push(tag_names[slot].clone());
            }
        }
        let created = id as i64;
        let last_activity = created + rng.i64(0..10_000);
        let score = rng.i64(-10..200);
        let views = rng.i64(0..100_000);
        let answers = rng.i64(-5..20);
        keys.push([
            Some(last_activity),
            Some(created),
            Some(score),
            Some(views),
            (answers > 0).then_some(answers),
        ]);
        docs.push(Document::new(id, doc_tags));
    }

    let corpus = Corpus::from_documents_with(docs, |query_type, doc| {
        keys[doc.id as usize][query_type.index()].map(Reverse)
    })?;
    Ok(corpus)
}
