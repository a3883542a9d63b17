//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docqa_rag::document::Chunk;
use docqa_rag::inmemory::InMemoryVectorStore;
use docqa_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn chunk(id: String, embedding: Vec<f32>) -> Chunk {
    Chunk {
        text: format!("text of {id}"),
        id,
        start: 0,
        embedding,
        metadata: HashMap::new(),
        document_id: "doc_1".to_string(),
    }
}

/// Generate chunks with distinct IDs and normalized embeddings.
fn arb_chunks(dim: usize) -> impl Strategy<Value = Vec<Chunk>> {
    proptest::collection::vec(arb_normalized_embedding(dim), 1..20).prop_map(|embeddings| {
        embeddings.into_iter().enumerate().map(|(i, e)| chunk(format!("c{i}"), e)).collect()
    })
}

mod prop_inmemory_search {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_sized_min_of_k_and_count(
            chunks in arb_chunks(DIM),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (first, second) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();
                store.upsert("test", &chunks).await.unwrap();
                let first = store.search("test", &query, top_k).await.unwrap();
                let second = store.search("test", &query, top_k).await.unwrap();
                (first, second)
            });

            // Never more than k; fewer only when the store holds fewer records
            prop_assert_eq!(first.len(), top_k.min(chunks.len()));

            for window in first.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }

            // Same query, unchanged store: identical ordered result
            let first_ids: Vec<&str> = first.iter().map(|r| r.chunk.id.as_str()).collect();
            let second_ids: Vec<&str> = second.iter().map(|r| r.chunk.id.as_str()).collect();
            prop_assert_eq!(first_ids, second_ids);
        }
    }
}

#[tokio::test]
async fn equal_scores_keep_insertion_order() {
    let store = InMemoryVectorStore::new();
    store.create_collection("test", 2).await.unwrap();
    let chunks: Vec<Chunk> =
        ["z", "a", "m", "b"].iter().map(|id| chunk(id.to_string(), vec![0.6, 0.8])).collect();
    store.upsert("test", &chunks).await.unwrap();

    let results = store.search("test", &[0.6, 0.8], 3).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, ["z", "a", "m"]);
}
