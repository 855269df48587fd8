mod common;

use std::sync::Arc;

use tagsieve_collections::{ScratchRepresentation, ScratchSetCache};
use tagsieve_index::{CompileOptions, Corpus, Document, ExclusionBitmapCompiler, QueryType};

use common::{expected_positions, five_document_corpus, random_corpus};

fn bits(corpus: &Corpus, bitmap: &tagsieve_bitmap::CompressedBitmap) -> Vec<u8> {
    (0..corpus.document_count() as u64)
        .map(|pos| bitmap.contains(pos) as u8)
        .collect()
}

#[test]
fn test_five_document_scenario() {
    let corpus = five_document_corpus();
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let mut scratch = compiler.new_scratch_cache();

    let excluded = compiler
        .compile_with_scratch(&["a"], QueryType::Score, &mut scratch)
        .unwrap();
    assert_eq!(bits(&corpus, excluded.bitmap()), vec![1, 1, 0, 0, 1]);
    assert_eq!(excluded.stats().cardinality, 3);
    assert_eq!(excluded.stats().allowed_count, 2);
    assert_eq!(excluded.stats().collected_documents, 3);

    let excluded = compiler
        .compile_with_scratch(&["a", "b"], QueryType::Score, &mut scratch)
        .unwrap();
    assert_eq!(bits(&corpus, excluded.bitmap()), vec![1, 1, 1, 0, 1]);
    assert_eq!(excluded.stats().cardinality, 4);
    assert_eq!(excluded.stats().bits_set, 4);
    assert_eq!(excluded.stats().excluded_tags, 2);
    assert_eq!(excluded.bitmap().span(), 5);
}

#[test]
fn test_empty_exclusion_set() {
    let corpus = random_corpus(3, 2_000, 40);
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    for query_type in QueryType::ALL {
        let excluded = compiler.compile::<&str>(&[], query_type).unwrap();
        assert_eq!(excluded.stats().cardinality, 0);
        assert_eq!(excluded.stats().allowed_count, 2_000);
        assert_eq!(excluded.bitmap().span(), 2_000);
    }
}

#[test]
fn test_all_tags_of_one_document() {
    let corpus = Corpus::from_documents(vec![
        Document::new(0, ["x"]),
        Document::new(1, ["y", "z"]),
        Document::new(2, ["x"]),
    ])
    .unwrap();
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let excluded = compiler.compile(&["y", "z"], QueryType::ViewCount).unwrap();
    assert_eq!(excluded.stats().cardinality, 1);
    assert!(excluded.is_excluded(1));
    assert_eq!(excluded.bitmap().positions().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn test_unknown_tags_contribute_nothing() {
    let corpus = five_document_corpus();
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let excluded = compiler
        .compile(&["b", "no-such-tag", "b"], QueryType::CreationDate)
        .unwrap();
    assert_eq!(excluded.stats().excluded_tags, 2);
    assert_eq!(excluded.stats().unknown_tags, 1);
    assert_eq!(excluded.bitmap().positions().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_subset_ordering_is_padded() {
    let corpus = random_corpus(11, 5_000, 60);
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    for query_type in QueryType::ALL {
        let ordering_len = corpus.ordering(query_type).len() as u64;
        let excluded = compiler.compile(&["tag-0", "tag-3"], query_type).unwrap();
        assert_eq!(excluded.bitmap().span(), 5_000);
        assert_eq!(
            excluded.bitmap().positions().collect::<Vec<_>>(),
            expected_positions(&corpus, &["tag-0", "tag-3"], query_type)
        );
        assert!(
            excluded
                .bitmap()
                .positions()
                .all(|pos| pos < ordering_len)
        );
        assert_eq!(
            excluded.stats().allowed_count,
            5_000 - excluded.stats().cardinality
        );
    }
}

#[test]
fn test_representations_agree() {
    let corpus = random_corpus(21, 3_000, 30);
    let hash = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let bits = ExclusionBitmapCompiler::new(
        &corpus,
        CompileOptions::default().with_scratch_representation(ScratchRepresentation::BitArray),
    );
    let tags = ["tag-1", "tag-2", "tag-7"];
    for query_type in QueryType::ALL {
        let a = hash.compile(&tags, query_type).unwrap();
        let b = bits.compile(&tags, query_type).unwrap();
        assert_eq!(a.bitmap(), b.bitmap());
        assert_eq!(a.stats().collected_documents, b.stats().collected_documents);
    }
}

#[test]
fn test_scratch_is_cleared_between_calls() {
    let corpus = five_document_corpus();
    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let mut scratch = ScratchSetCache::new(corpus.document_count());
    compiler
        .compile_with_scratch(&["a"], QueryType::Score, &mut scratch)
        .unwrap();
    let excluded = compiler
        .compile_with_scratch(&["b"], QueryType::Score, &mut scratch)
        .unwrap();
    assert_eq!(excluded.bitmap().positions().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(excluded.stats().collected_documents, 2);
}

#[test]
fn test_concurrent_compilation_is_deterministic() {
    let corpus = Arc::new(random_corpus(7, 20_000, 200));
    let tags = ["tag-0", "tag-5", "tag-17", "tag-150"];
    let reference = {
        let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
        QueryType::ALL.map(|qt| compiler.compile(&tags, qt).unwrap().into_bitmap())
    };

    let compiler = ExclusionBitmapCompiler::new(&corpus, CompileOptions::default());
    let pool = compiler.scratch_pool();
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let compiler = &compiler;
            let pool = &pool;
            let reference = &reference;
            scope.spawn(move || {
                for round in 0..10 {
                    for query_type in QueryType::ALL {
                        let bitmap = match (worker + round) % 3 {
                            0 => compiler.compile(&tags, query_type).unwrap(),
                            1 => {
                                let mut scratch = pool.acquire();
                                compiler
                                    .compile_with_scratch(&tags, query_type, &mut scratch)
                                    .unwrap()
                            }
                            _ => {
                                let mut scratch = compiler.new_scratch_cache();
                                compiler
                                    .compile_with_scratch(&tags, query_type, &mut scratch)
                                    .unwrap()
                            }
                        };
                        assert_eq!(bitmap.bitmap(), &reference[query_type.index()]);
                    }
                }
            });
        }
    });
}
