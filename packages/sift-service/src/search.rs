use std::{sync::Arc, time::Duration};

use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};
use tokio::{sync::Semaphore, task::JoinSet, time::timeout};

use sift_domain::{Collection, Passage, PassageMetadata, SearchEngine, SearchHit};
use sift_providers::IndexHit;

use crate::{FullTextRequest, SearchService, filter::build_filters};

/// Cap on simultaneous index calls across one fan-out.
const MAX_CONCURRENT_CALLS: usize = 6;

/// The retrieval streams a fan-out can run per collection, in merge
/// precedence order. When one passage surfaces in several streams, the
/// earlier stream's copy wins.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamKind {
	Metadata,
	FullText,
	Vector,
}

/// One retrieval fan-out across collections and engines.
pub(crate) struct FanOut<'a> {
	pub collections: &'a [Collection],
	pub content_query: Option<&'a str>,
	pub filters: &'a Map<String, Value>,
	pub limit: u32,
	pub fuzzy: bool,
	pub similarity_threshold: f32,
}

/// Full-text fields searched for content queries, per collection.
fn content_fields(collection: Collection) -> &'static [&'static str] {
	match collection {
		Collection::Email => &["content", "subject", "sender"],
		Collection::Document => &["content", "title", "author", "publisher"],
		Collection::Web => &["content", "title", "domain", "source_url"],
	}
}

impl SearchService {
	/// Run every applicable stream concurrently and merge the results.
	///
	/// A collection gets a metadata stream when any of its filters apply, and
	/// full-text plus vector content streams when a content query is present.
	/// A stream that fails or times out degrades to empty rather than failing
	/// the whole search.
	pub(crate) async fn fan_out(&self, plan: FanOut<'_>) -> Vec<SearchHit> {
		let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_CALLS));
		let metadata_limit = plan.limit.saturating_mul(self.cfg.search.metadata_candidate_multiplier);
		let mut tasks = JoinSet::new();

		for &collection in plan.collections {
			let filters = build_filters(collection, plan.filters);

			if !filters.is_empty() {
				let provider = self.providers.fulltext.clone();
				let cfg = self.cfg.providers.fulltext.clone();
				let query = plan.content_query.map(String::from);
				let fuzzy = plan.fuzzy;
				let semaphore = semaphore.clone();

				tasks.spawn(async move {
					let Ok(_permit) = semaphore.acquire().await else {
						return (collection, StreamKind::Metadata, Vec::new());
					};
					let req = FullTextRequest {
						collection: collection.index_name(),
						query: query.as_deref(),
						fields: content_fields(collection),
						filters: &filters,
						limit: metadata_limit,
						fuzzy,
					};
					let hits = await_stream(
						collection,
						"metadata",
						cfg.timeout_ms,
						provider.search(&cfg, req),
					)
					.await;

					(collection, StreamKind::Metadata, to_hits(collection, SearchEngine::FullText, hits))
				});
			}

			let Some(query) = plan.content_query else {
				continue;
			};

			{
				let provider = self.providers.fulltext.clone();
				let cfg = self.cfg.providers.fulltext.clone();
				let query = query.to_string();
				let fuzzy = plan.fuzzy;
				let limit = plan.limit;
				let semaphore = semaphore.clone();

				tasks.spawn(async move {
					let Ok(_permit) = semaphore.acquire().await else {
						return (collection, StreamKind::FullText, Vec::new());
					};
					let req = FullTextRequest {
						collection: collection.index_name(),
						query: Some(&query),
						fields: content_fields(collection),
						filters: &[],
						limit,
						fuzzy,
					};
					let hits = await_stream(
						collection,
						"fulltext",
						cfg.timeout_ms,
						provider.search(&cfg, req),
					)
					.await;

					(collection, StreamKind::FullText, to_hits(collection, SearchEngine::FullText, hits))
				});
			}
			{
				let provider = self.providers.vector.clone();
				let cfg = self.cfg.providers.vector.clone();
				let query = query.to_string();
				let limit = plan.limit;
				let threshold = plan.similarity_threshold;
				let semaphore = semaphore.clone();

				tasks.spawn(async move {
					let Ok(_permit) = semaphore.acquire().await else {
						return (collection, StreamKind::Vector, Vec::new());
					};
					let hits = await_stream(
						collection,
						"vector",
						cfg.timeout_ms,
						provider.search(&cfg, collection, &query, &[], limit),
					)
					.await;
					let hits = to_hits(collection, SearchEngine::Vector, hits)
						.into_iter()
						.filter(|hit| hit.score >= threshold)
						.collect();

					(collection, StreamKind::Vector, hits)
				});
			}
		}

		let mut streams = Vec::new();

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok(entry) => streams.push(entry),
				Err(err) => tracing::warn!(error = %err, "Search stream task failed."),
			}
		}

		// Deterministic merge order regardless of task completion order.
		streams.sort_by_key(|(collection, kind, _)| (*kind as u8, collection.index_name()));

		let mut seen: AHashSet<String> = AHashSet::new();
		let mut merged = Vec::new();

		for (_, _, hits) in streams {
			for hit in hits {
				if seen.insert(hit.passage.id.clone()) {
					merged.push(hit);
				}
			}
		}

		merged
	}
}

async fn await_stream<F>(
	collection: Collection,
	stream: &'static str,
	timeout_ms: u64,
	fut: F,
) -> Vec<IndexHit>
where
	F: Future<Output = sift_providers::Result<Vec<IndexHit>>>,
{
	match timeout(Duration::from_millis(timeout_ms), fut).await {
		Ok(Ok(hits)) => hits,
		Ok(Err(err)) => {
			tracing::warn!(
				collection = collection.label(),
				stream,
				error = %err,
				"Search stream failed, continuing without it."
			);

			Vec::new()
		},
		Err(_) => {
			tracing::warn!(
				collection = collection.label(),
				stream,
				timeout_ms,
				"Search stream timed out, continuing without it."
			);

			Vec::new()
		},
	}
}

fn to_hits(collection: Collection, engine: SearchEngine, hits: Vec<IndexHit>) -> Vec<SearchHit> {
	hits.into_iter().map(|hit| passage_from_hit(collection, engine, hit)).collect()
}

/// Convert a raw index hit into the passage model, lifting chunk bookkeeping
/// out of the metadata bag.
pub(crate) fn passage_from_hit(
	collection: Collection,
	engine: SearchEngine,
	hit: IndexHit,
) -> SearchHit {
	let IndexHit { id, score, text, mut metadata } = hit;
	let chunk_number = take_u32(&mut metadata, "chunk_number");
	let total_chunks = take_u32(&mut metadata, "total_chunks");
	let parent_hash = take_string(&mut metadata, "parent_hash");

	metadata.remove("is_chunk");
	metadata.remove("chunk_id");

	let mut passage = Passage::new(id, collection, engine, text);

	passage.metadata = typed_metadata(collection, metadata);
	passage.chunk_number = chunk_number;
	passage.total_chunks = total_chunks;
	passage.parent_hash = parent_hash;

	SearchHit::new(passage, score)
}

fn take_u32(metadata: &mut Map<String, Value>, key: &str) -> Option<u32> {
	metadata.remove(key).and_then(|v| v.as_u64()).map(|n| n as u32)
}

fn take_string(metadata: &mut Map<String, Value>, key: &str) -> Option<String> {
	metadata.remove(key).and_then(|v| match v {
		Value::String(s) => Some(s),
		_ => None,
	})
}

fn typed_metadata(collection: Collection, metadata: Map<String, Value>) -> PassageMetadata {
	let value = Value::Object(metadata);
	let parsed = match collection {
		Collection::Email => serde_json::from_value(value).map(PassageMetadata::Email),
		Collection::Document => serde_json::from_value(value).map(PassageMetadata::Document),
		Collection::Web => serde_json::from_value(value).map(PassageMetadata::Web),
	};

	parsed.unwrap_or_else(|err| {
		tracing::warn!(
			collection = collection.label(),
			error = %err,
			"Malformed passage metadata, keeping it empty."
		);

		PassageMetadata::empty(collection)
	})
}

/// Keep only the best-scoring passage per source document. Metadata searches
/// surface documents, not chunks, so sibling chunks collapse onto one entry.
pub(crate) fn collapse_best_per_document(hits: Vec<SearchHit>) -> Vec<SearchHit> {
	let mut index_by_key: AHashMap<String, usize> = AHashMap::new();
	let mut collapsed: Vec<SearchHit> = Vec::new();

	for hit in hits {
		let key =
			hit.passage.parent_hash.clone().unwrap_or_else(|| hit.passage.id.clone());

		match index_by_key.get(&key) {
			Some(&index) =>
				if hit.score > collapsed[index].score {
					collapsed[index] = hit;
				},
			None => {
				index_by_key.insert(key, collapsed.len());
				collapsed.push(hit);
			},
		}
	}

	collapsed
}
