//! The in-memory document collection the index is built over.
//!
//! A [`Corpus`] holds the documents (densely numbered by id), a [`TagCatalog`]
//! with global per-tag document counts, and one [`QueryOrdering`] per
//! [`QueryType`]. It is immutable once constructed and validated.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tagsieve_common::{Result, error::Error, verify_data};

use crate::query_type::QueryType;

pub type DocumentId = u32;

/// A tagged document. `id` equals its index in [`Corpus::documents`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Document {
    pub fn new(id: DocumentId, tags: impl IntoIterator<Item = impl Into<String>>) -> Document {
        Document {
            id,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Global tag to document-count table. Iteration follows insertion order.
#[derive(Debug, Default, Clone)]
pub struct TagCatalog {
    entries: Vec<(String, u64)>,
    lookup: AHashMap<String, usize>,
}

impl TagCatalog {
    pub fn new() -> TagCatalog {
        TagCatalog::default()
    }

    /// Counts tags over `documents`; tags are ordered by first appearance.
    pub fn from_documents(documents: &[Document]) -> TagCatalog {
        let mut catalog = TagCatalog::new();
        for doc in documents {
            for tag in &doc.tags {
                catalog.add(tag, 1);
            }
        }
        catalog
    }

    /// Adds `count` to `tag`, appending the tag if it is new.
    pub fn add(&mut self, tag: &str, count: u64) {
        match self.lookup.get(tag) {
            Some(&slot) => self.entries[slot].1 += count,
            None => {
                self.lookup.insert(tag.to_string(), self.entries.len());
                self.entries.push((tag.to_string(), count));
            }
        }
    }

    pub fn count(&self, tag: &str) -> Option<u64> {
        self.lookup.get(tag).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lookup.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(tag, count)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(tag, count)| (tag.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for TagCatalog {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> TagCatalog {
        let mut catalog = TagCatalog::new();
        for (tag, count) in iter {
            catalog.add(&tag.into(), count);
        }
        catalog
    }
}

/// The documents of one query type in order, plus each tag's documents in the
/// same order.
#[derive(Debug, Default, Clone)]
pub struct QueryOrdering {
    all_positions: Vec<DocumentId>,
    tag_doc_ids: AHashMap<String, Vec<DocumentId>>,
}

impl QueryOrdering {
    pub fn new(
        all_positions: Vec<DocumentId>,
        tag_doc_ids: AHashMap<String, Vec<DocumentId>>,
    ) -> QueryOrdering {
        QueryOrdering {
            all_positions,
            tag_doc_ids,
        }
    }

    /// Derives the per-tag lists by walking `all_positions`. Ids with no matching
    /// document are kept in `all_positions` and left for validation to reject.
    pub fn from_positions(all_positions: Vec<DocumentId>, documents: &[Document]) -> QueryOrdering {
        let mut tag_doc_ids: AHashMap<String, Vec<DocumentId>> = AHashMap::new();
        for &id in &all_positions {
            let Some(doc) = documents.get(id as usize) else {
                continue;
            };
            for tag in &doc.tags {
                match tag_doc_ids.get_mut(tag.as_str()) {
                    Some(ids) => ids.push(id),
                    None => {
                        tag_doc_ids.insert(tag.clone(), vec![id]);
                    }
                }
            }
        }
        QueryOrdering::new(all_positions, tag_doc_ids)
    }

    /// Document ids by position.
    pub fn all_positions(&self) -> &[DocumentId] {
        &self.all_positions
    }

    /// Ids of the documents carrying `tag`, in ordering order.
    pub fn tag_doc_ids(&self, tag: &str) -> Option<&[DocumentId]> {
        self.tag_doc_ids.get(tag).map(Vec::as_slice)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tag_doc_ids.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.all_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_positions.is_empty()
    }

    /// Whether the ordering covers every document of a collection of
    /// `document_count` documents.
    pub fn is_complete(&self, document_count: usize) -> bool {
        self.all_positions.len() == document_count
    }
}

#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    catalog: TagCatalog,
    orderings: [QueryOrdering; QueryType::COUNT],
}

impl Corpus {
    /// Assembles and validates a corpus.
    pub fn new(
        documents: Vec<Document>,
        catalog: TagCatalog,
        orderings: [QueryOrdering; QueryType::COUNT],
    ) -> Result<Corpus> {
        let corpus = Corpus {
            documents,
            catalog,
            orderings,
        };
        corpus.validate()?;
        Ok(corpus)
    }

    /// Every query type orders all documents by id.
    pub fn from_documents(documents: Vec<Document>) -> Result<Corpus> {
        Self::from_documents_with(documents, |_, doc| Some(doc.id))
    }

    /// Derives the orderings from a sort key per query type. Documents for which
    /// `sort_key` returns `None` are left out of that query type's ordering;
    /// equal keys keep id order. The catalog counts every document.
    pub fn from_documents_with<K: Ord>(
        documents: Vec<Document>,
        mut sort_key: impl FnMut(QueryType, &Document) -> Option<K>,
    ) -> Result<Corpus> {
        let catalog = TagCatalog::from_documents(&documents);
        let orderings = QueryType::ALL.map(|query_type| {
            let mut keyed: Vec<(K, DocumentId)> = documents
                .iter()
                .filter_map(|doc| sort_key(query_type, doc).map(|key| (key, doc.id)))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            let all_positions = keyed.into_iter().map(|(_, id)| id).collect();
            QueryOrdering::from_positions(all_positions, &documents)
        });
        Corpus::new(documents, catalog, orderings)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id as usize)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn ordering(&self, query_type: QueryType) -> &QueryOrdering {
        &self.orderings[query_type.index()]
    }

    /// Checks the structural invariants the builder and compiler rely on:
    /// - document ids are dense (`documents[i].id == i`) and no document repeats a tag;
    /// - every ordering lists in-range ids without duplicates;
    /// - every per-tag list follows its ordering (a subset, in the same order, without
    ///   duplicates) and holds exactly the documents of the ordering that carry the tag.
    pub fn validate(&self) -> Result<()> {
        let document_count = self.documents.len();
        verify_data!(document_count, document_count <= DocumentId::MAX as usize);

        for (index, doc) in self.documents.iter().enumerate() {
            if doc.id as usize != index {
                return Err(Error::invalid_corpus(format!(
                    "document at index {index} has id {}",
                    doc.id
                )));
            }
            let mut tags: Vec<&str> = doc.tags.iter().map(String::as_str).collect();
            tags.sort_unstable();
            if let Some(pair) = tags.windows(2).find(|pair| pair[0] == pair[1]) {
                return Err(Error::invalid_corpus(format!(
                    "document {} repeats tag '{}'",
                    doc.id, pair[0]
                )));
            }
        }

        for query_type in QueryType::ALL {
            self.validate_ordering(query_type)?;
        }
        Ok(())
    }

    fn validate_ordering(&self, query_type: QueryType) -> Result<()> {
        let ordering = self.ordering(query_type);
        let document_count = self.documents.len();
        let mut position_of = vec![u32::MAX; document_count];
        for (position, &id) in ordering.all_positions().iter().enumerate() {
            let Some(slot) = position_of.get_mut(id as usize) else {
                return Err(Error::invalid_corpus(format!(
                    "{query_type} ordering references unknown document {id}"
                )));
            };
            if *slot != u32::MAX {
                return Err(Error::invalid_corpus(format!(
                    "{query_type} ordering lists document {id} more than once"
                )));
            }
            *slot = position as u32;
        }

        for (tag, ids) in &ordering.tag_doc_ids {
            let mut next_position = 0u64;
            for &id in ids {
                let position = position_of
                    .get(id as usize)
                    .copied()
                    .filter(|&p| p != u32::MAX)
                    .ok_or_else(|| {
                        Error::invalid_corpus(format!(
                            "{query_type} tag '{tag}' lists document {id} outside the ordering"
                        ))
                    })?;
                if (position as u64) < next_position {
                    return Err(Error::invalid_corpus(format!(
                        "{query_type} tag '{tag}' lists document {id} out of ordering order"
                    )));
                }
                next_position = position as u64 + 1;
                if !self.documents[id as usize].tags.iter().any(|t| t == tag) {
                    return Err(Error::invalid_corpus(format!(
                        "{query_type} tag '{tag}' lists document {id}, which does not carry it"
                    )));
                }
            }
        }

        // Every tagged document of the ordering must appear in its tag's list.
        let mut carried: AHashMap<&str, usize> = AHashMap::new();
        for &id in ordering.all_positions() {
            for tag in &self.documents[id as usize].tags {
                *carried.entry(tag.as_str()).or_default() += 1;
            }
        }
        for (tag, count) in carried {
            let listed = ordering.tag_doc_ids(tag).map_or(0, <[DocumentId]>::len);
            if listed != count {
                return Err(Error::invalid_corpus(format!(
                    "{query_type} tag '{tag}' lists {listed} of its {count} documents"
                )));
            }
        }
        Ok(())
    }
}
