use std::{collections::HashSet, sync::Arc};

use serde_json::{Map, Value, json};

use sift_domain::{Collection, ConversationTurn, SearchEngine, SearchMode};
use sift_service::{
	MetadataSearchRequest, QueryKind, SearchRequest, SearchService, SessionContext,
};
use sift_testkit::{FakeIndex, FakeLlm, FakeReranker, fake_providers, index_hit, test_config};

fn service(
	vector: Arc<FakeIndex>,
	fulltext: Arc<FakeIndex>,
	rerank: Arc<FakeReranker>,
) -> SearchService {
	SearchService::with_providers(
		test_config(),
		fake_providers(vector, fulltext, rerank, FakeLlm::with_response("")),
	)
}

fn filters(value: Value) -> Map<String, Value> {
	value.as_object().cloned().unwrap_or_default()
}

fn document_request(query: &str) -> SearchRequest {
	SearchRequest {
		query: Some(query.to_string()),
		collections: Some("documents".to_string()),
		..Default::default()
	}
}

#[tokio::test]
async fn content_search_merges_streams_with_fulltext_precedence() {
	let vector = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("x", 0.9, "shared passage from the vector index", json!({})),
			index_hit("y", 0.8, "a second vector-only passage", json!({})),
		],
	);
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("x", 2.0, "shared passage from the fulltext index", json!({}))],
	);
	let service = service(vector, fulltext, FakeReranker::with_scores(vec![0.5]));
	let session = SessionContext::new();
	let response = service.search(&session, &document_request("allan deviation")).await.unwrap();

	assert_eq!(response.hits.len(), 2);
	// The full-text copy of the shared passage wins the merge.
	assert_eq!(response.hits[0].passage.id, "x");
	assert_eq!(response.hits[0].passage.engine, SearchEngine::FullText);
	assert_eq!(response.hits[1].passage.id, "y");
	assert!(!response.cache_hit);
}

#[tokio::test]
async fn vector_hits_below_the_similarity_threshold_are_dropped() {
	let vector = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("close", 0.9, "a close match", json!({})),
			index_hit("far", 0.3, "a distant match", json!({})),
		],
	);
	let fulltext = FakeIndex::new();
	let service = service(vector, fulltext, FakeReranker::with_scores(vec![0.5]));
	let session = SessionContext::new();
	let response = service.search(&session, &document_request("oscillator")).await.unwrap();

	assert_eq!(response.hits.len(), 1);
	assert_eq!(response.hits[0].passage.id, "close");

	// A per-request threshold overrides the configured one.
	let request = SearchRequest {
		similarity_threshold: Some(0.2),
		..document_request("oscillator")
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();

	assert_eq!(response.hits.len(), 2);
}

#[tokio::test]
async fn rerank_scores_reorder_the_results() {
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("a", 0.9, "passage about crystal ovens", json!({})),
			index_hit("b", 0.8, "passage about cesium references", json!({})),
		],
	);
	let rerank = FakeReranker::with_scores(vec![0.1, 0.95]);
	let service = service(FakeIndex::new(), fulltext, rerank.clone());
	let session = SessionContext::new();
	let response = service.search(&session, &document_request("cesium")).await.unwrap();

	assert_eq!(rerank.calls(), 1);
	assert_eq!(response.hits[0].passage.id, "b");
	assert_eq!(response.hits[0].explain.rerank_score, Some(0.95));
	assert_eq!(response.hits[1].passage.id, "a");
}

#[tokio::test]
async fn rerank_failure_keeps_the_retrieval_order() {
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("a", 0.9, "passage about crystal ovens", json!({})),
			index_hit("b", 0.8, "passage about cesium references", json!({})),
		],
	);
	let rerank = FakeReranker::failing();
	let service = service(FakeIndex::new(), fulltext, rerank.clone());
	let response =
		service.search(&SessionContext::new(), &document_request("cesium")).await.unwrap();

	assert_eq!(rerank.calls(), 1);
	assert_eq!(response.hits[0].passage.id, "a");
	assert_eq!(response.hits[0].explain.rerank_score, None);
}

#[tokio::test]
async fn reranking_can_be_disabled_per_request() {
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("a", 0.9, "passage about crystal ovens", json!({})),
			index_hit("b", 0.8, "passage about cesium references", json!({})),
		],
	);
	let rerank = FakeReranker::with_scores(vec![0.99]);
	let service = service(FakeIndex::new(), fulltext, rerank.clone());
	let request = SearchRequest { use_reranking: Some(false), ..document_request("cesium") };

	service.search(&SessionContext::new(), &request).await.unwrap();

	assert_eq!(rerank.calls(), 0);
}

#[tokio::test]
async fn repeated_query_is_served_from_the_session_cache() {
	let vector = FakeIndex::new();
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("a", 0.9, "passage about crystal ovens", json!({}))],
	);
	let service = service(vector.clone(), fulltext.clone(), FakeReranker::with_scores(vec![0.5]));
	let session = SessionContext::new();
	let request = document_request("crystal ovens");
	let first = service.search(&session, &request).await.unwrap();

	assert!(!first.cache_hit);

	let calls_after_first = fulltext.calls() + vector.calls();
	let second = service.search(&session, &request).await.unwrap();

	assert!(second.cache_hit);
	assert_eq!(fulltext.calls() + vector.calls(), calls_after_first);
	assert_eq!(second.hits.len(), first.hits.len());

	// A different query goes back to the indices.
	let third = service.search(&session, &document_request("rubidium")).await.unwrap();

	assert!(!third.cache_hit);
}

#[tokio::test]
async fn metadata_only_search_collapses_chunks_and_skips_content_streams() {
	let vector = FakeIndex::new();
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![
			index_hit("c1", 1.0, "chapter one", json!({ "parent_hash": "book", "chunk_number": 1 })),
			index_hit("c2", 3.0, "chapter two", json!({ "parent_hash": "book", "chunk_number": 2 })),
			index_hit("solo", 2.0, "standalone note", json!({})),
		],
	);
	let service = service(vector.clone(), fulltext, FakeReranker::with_scores(vec![0.5]));
	let request = SearchRequest {
		collections: Some("documents".to_string()),
		filters: filters(json!({ "author": "Riley" })),
		..Default::default()
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();

	assert_eq!(vector.calls(), 0);
	assert!(response.provenance.is_none());
	assert_eq!(response.hits.len(), 2);
	// The best chunk represents the whole document.
	assert_eq!(response.hits[0].passage.id, "c2");
}

#[tokio::test]
async fn metadata_only_search_keeps_raw_index_scores() {
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("doc", 4.2, "standalone reference", json!({}))],
	);
	let service = service(FakeIndex::new(), fulltext, FakeReranker::with_scores(vec![0.5]));
	let request = SearchRequest {
		collections: Some("documents".to_string()),
		filters: filters(json!({ "author": "Riley" })),
		..Default::default()
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();

	// Without a content query the index's own score comes back untouched.
	assert_eq!(response.hits[0].score, 4.2);
	assert_eq!(response.hits[0].explain.final_score, None);
	assert_eq!(response.hits[0].explain.diversity_adjustment, None);
}

#[tokio::test]
async fn huge_top_k_saturates_the_candidate_limit() {
	let service = service(FakeIndex::new(), FakeIndex::new(), FakeReranker::with_scores(vec![]));
	let request = SearchRequest {
		collections: Some("documents".to_string()),
		filters: filters(json!({ "author": "Riley" })),
		top_k: Some(u32::MAX),
		..Default::default()
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();

	assert!(response.hits.is_empty());
}

#[tokio::test]
async fn combined_follow_up_searches_every_collection_in_final_score_order() {
	let fulltext = FakeIndex::new()
		.preload(
			Collection::Email,
			vec![index_hit("e", 0.9, "email thread about ocxo ovens", json!({}))],
		)
		.preload(
			Collection::Document,
			vec![index_hit("d", 0.8, "paper on temperature coefficients", json!({}))],
		)
		.preload(
			Collection::Web,
			vec![index_hit("w", 0.7, "page about oscillator stability", json!({}))],
		);
	let service = service(FakeIndex::new(), fulltext, FakeReranker::with_scores(vec![0.5]));
	let request = SearchRequest {
		query: Some("What about its stability?".to_string()),
		filters: filters(json!({ "title": "ocxo" })),
		history: vec![
			ConversationTurn::user("OCXO temperature coefficients"),
			ConversationTurn::assistant("They describe frequency shift per degree."),
		],
		..Default::default()
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();
	let provenance = response.provenance.unwrap();

	assert_eq!(provenance.kind, QueryKind::FollowUp);
	assert!(provenance.rule_changed);
	assert!(provenance.final_query.contains("ocxo temperature"));

	let collections: HashSet<Collection> =
		response.hits.iter().map(|hit| hit.passage.collection).collect();

	assert_eq!(collections.len(), 3);

	for pair in response.hits.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}

#[tokio::test]
async fn explicit_metadata_only_mode_ignores_missing_query() {
	let service = service(FakeIndex::new(), FakeIndex::new(), FakeReranker::with_scores(vec![]));
	let request = SearchRequest {
		mode: SearchMode::MetadataOnly,
		..Default::default()
	};

	assert!(service.search(&SessionContext::new(), &request).await.is_err());
}

#[tokio::test]
async fn empty_request_is_rejected() {
	let service = service(FakeIndex::new(), FakeIndex::new(), FakeReranker::with_scores(vec![]));

	assert!(service.search(&SessionContext::new(), &SearchRequest::default()).await.is_err());
}

#[tokio::test]
async fn follow_up_query_is_enhanced_with_previous_context() {
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("a", 0.9, "passage about holdover drift", json!({}))],
	);
	let service = service(FakeIndex::new(), fulltext, FakeReranker::with_scores(vec![0.5]));
	let request = SearchRequest {
		history: vec![
			ConversationTurn::user("gpsdo holdover performance"),
			ConversationTurn::assistant("It depends on the oscillator."),
		],
		..document_request("how does it drift")
	};
	let response = service.search(&SessionContext::new(), &request).await.unwrap();
	let provenance = response.provenance.unwrap();

	assert_eq!(provenance.kind, QueryKind::FollowUp);
	assert!(provenance.rule_changed);
	assert_eq!(
		provenance.final_query,
		"how does it drift (regarding gpsdo holdover, holdover performance)"
	);
	assert!(!provenance.llm_changed);
}

#[tokio::test]
async fn failing_stream_degrades_instead_of_failing_the_search() {
	let vector = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("v", 0.9, "vector passage", json!({}))],
	);
	let fulltext = FakeIndex::new().preload(
		Collection::Document,
		vec![index_hit("f", 1.5, "fulltext passage", json!({}))],
	);

	vector.fail_next();

	let service = service(vector, fulltext, FakeReranker::with_scores(vec![0.5]));
	let response =
		service.search(&SessionContext::new(), &document_request("anything")).await.unwrap();

	assert_eq!(response.hits.len(), 1);
	assert_eq!(response.hits[0].passage.id, "f");
}

#[tokio::test]
async fn results_are_truncated_to_top_k() {
	let hits = (0..8)
		.map(|i| {
			index_hit(
				&format!("doc-{i}"),
				1.0 - i as f32 * 0.1,
				&format!("distinct passage number {i}"),
				json!({}),
			)
		})
		.collect();
	let fulltext = FakeIndex::new().preload(Collection::Document, hits);
	let service = service(FakeIndex::new(), fulltext, FakeReranker::with_scores(vec![0.5]));
	let request = SearchRequest { top_k: Some(3), ..document_request("passage") };
	let response = service.search(&SessionContext::new(), &request).await.unwrap();

	assert_eq!(response.hits.len(), 3);
	assert_eq!(response.hits[0].passage.id, "doc-0");
}

#[tokio::test]
async fn metadata_lookup_returns_raw_index_scores() {
	let fulltext = FakeIndex::new().preload(
		Collection::Email,
		vec![index_hit(
			"m1",
			4.2,
			"message body",
			json!({ "subject": "GPSDO holdover", "sender": "kc7zzz at example.com" }),
		)],
	);
	let rerank = FakeReranker::with_scores(vec![0.5]);
	let service = service(FakeIndex::new(), fulltext, rerank.clone());
	let request = MetadataSearchRequest {
		collections: Some("emails".to_string()),
		filters: filters(json!({ "title": "GPSDO" })),
		..Default::default()
	};
	let hits = service.search_by_metadata(&request).await.unwrap();

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0].score, 4.2);
	assert_eq!(hits[0].passage.metadata.title(), Some("GPSDO holdover"));
	assert_eq!(rerank.calls(), 0);
}

#[tokio::test]
async fn metadata_lookup_requires_filters() {
	let service = service(FakeIndex::new(), FakeIndex::new(), FakeReranker::with_scores(vec![]));
	let request = MetadataSearchRequest::default();

	assert!(service.search_by_metadata(&request).await.is_err());
}
