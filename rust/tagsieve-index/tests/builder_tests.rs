mod common;

use tagsieve_index::{
    BitmapIndexBuilder, BuildOptions, CompileOptions, Corpus, CountMismatch, Document,
    ExclusionBitmapCompiler, MemorySnapshot, QueryOrdering, QueryType, TagCatalog,
};

use common::{expected_positions, five_document_corpus, random_corpus};

fn quiet() -> BuildOptions {
    BuildOptions::default().with_track_memory(false)
}

#[test]
fn test_select_tags_for_indexing() {
    // Catalog order: c(2), a(3), b(2), d(1).
    let corpus = Corpus::from_documents(vec![
        Document::new(0, ["c", "a"]),
        Document::new(1, ["a", "b"]),
        Document::new(2, ["b", "c"]),
        Document::new(3, ["d", "a"]),
    ])
    .unwrap();
    let builder = BitmapIndexBuilder::new(&corpus, quiet());
    assert_eq!(builder.select_tags_for_indexing(0), ["a", "c", "b", "d"]);
    assert_eq!(builder.select_tags_for_indexing(1), ["a", "c", "b"]);
    assert_eq!(builder.select_tags_for_indexing(2), ["a"]);
    assert!(builder.select_tags_for_indexing(3).is_empty());
}

#[test]
fn test_build_five_document_corpus() {
    let corpus = five_document_corpus();
    let (index, report) = BitmapIndexBuilder::new(&corpus, quiet()).build().unwrap();

    assert_eq!(index.tags(), ["a", "b"]);
    assert_eq!(index.bitmap_count(), 10);
    assert_eq!(index.document_count(), 5);
    assert!(!index.contains_tag("c"));
    assert!(index.get("c", QueryType::Score).is_none());
    for query_type in QueryType::ALL {
        let a = index.get("a", query_type).unwrap();
        assert_eq!(a.span(), 5);
        assert_eq!(a.positions().collect::<Vec<_>>(), vec![0, 1, 4]);
        let b = index.get("b", query_type).unwrap();
        assert_eq!(b.positions().collect::<Vec<_>>(), vec![1, 2]);
    }

    assert_eq!(report.tags_indexed, 2);
    assert_eq!(report.bitmap_count, 10);
    assert_eq!(report.document_count, 5);
    assert_eq!(report.populate_times.len(), QueryType::COUNT);
    assert!(report.mismatches.is_empty());
    assert!(report.memory_before.is_none());
    assert!(report.memory_after_allocate.is_none());
    assert_eq!(report.segment_stats.total(), 10);
    assert_eq!(report.heap_size_bytes, index.heap_size_bytes());
}

#[test]
fn test_memory_snapshots_follow_track_memory() {
    let corpus = five_document_corpus();
    let options = BuildOptions::default().with_track_memory(true);
    let (_, report) = BitmapIndexBuilder::new(&corpus, options).build().unwrap();
    let supported = MemorySnapshot::capture().is_some();
    assert_eq!(report.memory_before.is_some(), supported);
    assert_eq!(report.memory_after_allocate.is_some(), supported);
    assert_eq!(report.memory_after_post_process.is_some(), supported);
    if let Some(before) = report.memory_before {
        assert!(before.physical_bytes > 0);
    }
}

#[test]
fn test_min_docs_per_tag_threshold() {
    let corpus = five_document_corpus();
    let (index, report) =
        BitmapIndexBuilder::new(&corpus, quiet().with_min_docs_per_tag(2))
            .build()
            .unwrap();
    assert_eq!(index.tags(), ["a"]);
    assert_eq!(report.bitmap_count, QueryType::COUNT);
}

#[test]
fn test_bitmaps_match_tag_positions() {
    let corpus = random_corpus(5, 70_000, 40);
    let (index, report) = BitmapIndexBuilder::new(&corpus, quiet().with_min_docs_per_tag(10))
        .build()
        .unwrap();
    assert!(report.mismatches.is_empty());
    assert!(!index.is_empty());
    for tag in index.tags() {
        for query_type in QueryType::ALL {
            let bitmap = index.get(tag, query_type).unwrap();
            assert_eq!(bitmap.span(), 70_000);
            let ids = corpus.ordering(query_type).tag_doc_ids(tag).unwrap_or(&[]);
            assert_eq!(bitmap.cardinality(), ids.len() as u64);
            assert_eq!(
                bitmap.positions().collect::<Vec<_>>(),
                expected_positions(&corpus, &[tag.as_str()], query_type)
            );
        }
    }
}

#[test]
fn test_parallel_and_sequential_post_process_agree() {
    let corpus = random_corpus(9, 30_000, 50);
    let (parallel, _) = BitmapIndexBuilder::new(&corpus, quiet()).build().unwrap();
    let (sequential, _) =
        BitmapIndexBuilder::new(&corpus, quiet().with_parallel_post_process(false))
            .build()
            .unwrap();
    assert_eq!(parallel.tags(), sequential.tags());
    for tag in parallel.tags() {
        for query_type in QueryType::ALL {
            assert_eq!(
                parallel.get(tag, query_type),
                sequential.get(tag, query_type)
            );
        }
    }
}

#[test]
fn test_index_union_matches_exclusion_bitmap() {
    let corpus = random_corpus(13, 40_000, 80);
    let (index, _) = BitmapIndexBuilder::new(&corpus, quiet()).build().unwrap();
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let tags = &index.tags()[..3];
    for query_type in QueryType::ALL {
        let union = tags[1..]
            .iter()
            .fold(index.get(&tags[0], query_type).unwrap().clone(), |acc, tag| {
                acc.or(index.get(tag, query_type).unwrap())
            });
        let excluded = compiler.compile(tags, query_type).unwrap();
        assert_eq!(excluded.bitmap(), &union);
    }
}

#[test]
fn test_count_mismatches_are_recorded() {
    let documents = vec![
        Document::new(0, ["a"]),
        Document::new(1, ["a", "b"]),
        Document::new(2, ["b"]),
        Document::new(3, Vec::<String>::new()),
        Document::new(4, ["a"]),
    ];
    // `a` claims more documents than exist, `b` fewer.
    let catalog: TagCatalog = [("a", 5), ("b", 1)].into_iter().collect();
    let orderings = QueryType::ALL.map(|query_type| {
        let positions = match query_type {
            QueryType::Score => vec![0, 1, 2],
            _ => (0..5).collect(),
        };
        QueryOrdering::from_positions(positions, &documents)
    });
    let corpus = Corpus::new(documents, catalog, orderings).unwrap();
    let (index, report) = BitmapIndexBuilder::new(&corpus, quiet()).build().unwrap();

    // The Score subset under-counts `a` without a mismatch.
    assert!(
        !report
            .mismatches
            .iter()
            .any(|m| m.tag == "a" && m.query_type == QueryType::Score)
    );
    assert_eq!(report.mismatches.len(), 4 + 5);
    assert!(report.mismatches.contains(&CountMismatch {
        tag: "a".to_string(),
        query_type: QueryType::ViewCount,
        expected: 5,
        observed: 3,
    }));
    assert!(report.mismatches.contains(&CountMismatch {
        tag: "b".to_string(),
        query_type: QueryType::Score,
        expected: 1,
        observed: 2,
    }));

    // Mismatches do not abort the build; the Score subset is padded.
    let a = index.get("a", QueryType::Score).unwrap();
    assert_eq!(a.span(), 5);
    assert_eq!(a.positions().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_build_empty_corpus() {
    let corpus = Corpus::from_documents(Vec::new()).unwrap();
    let (index, report) = BitmapIndexBuilder::new(&corpus, quiet()).build().unwrap();
    assert!(index.is_empty());
    assert_eq!(index.bitmap_count(), 0);
    assert_eq!(report.segment_stats.total(), 0);
}
