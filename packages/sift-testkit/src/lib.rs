//! In-memory stand-ins for the index, rerank and completion providers, plus
//! a ready-to-use configuration for service tests.

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use serde_json::Value;

use sift_config::{
	Chunking, Config, Dedupe, Enhancement, IndexProviderConfig, LlmProviderConfig, ProviderConfig,
	Providers as ProviderConfigs, Ranking, Search, Service, Session,
};
use sift_domain::{Collection, FieldFilter};
use sift_providers::{Error, IndexHit};
use sift_service::{
	BoxFuture, CompletionProvider, FullTextIndexProvider, FullTextRequest, Providers,
	RerankProvider, VectorIndexProvider,
};

fn simulated_failure() -> Error {
	Error::InvalidResponse { message: "Simulated provider failure.".to_string() }
}

/// Build a raw index hit with JSON metadata.
pub fn index_hit(id: &str, score: f32, text: &str, metadata: Value) -> IndexHit {
	IndexHit {
		id: id.to_string(),
		score,
		text: text.to_string(),
		metadata: metadata.as_object().cloned().unwrap_or_default(),
	}
}

/// A preloaded index keyed by collection, usable as either the vector or the
/// full-text provider. Records every call it receives.
#[derive(Default)]
pub struct FakeIndex {
	hits: Mutex<HashMap<String, Vec<IndexHit>>>,
	calls: AtomicUsize,
	fail: AtomicBool,
}

impl FakeIndex {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn preload(self: &Arc<Self>, collection: Collection, hits: Vec<IndexHit>) -> Arc<Self> {
		self.hits
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(collection.index_name().to_string(), hits);

		self.clone()
	}

	pub fn fail_next(&self) {
		self.fail.store(true, Ordering::SeqCst);
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn lookup(&self, collection: &str) -> sift_providers::Result<Vec<IndexHit>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if self.fail.swap(false, Ordering::SeqCst) {
			return Err(simulated_failure());
		}

		Ok(self
			.hits
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(collection)
			.cloned()
			.unwrap_or_default())
	}
}

impl VectorIndexProvider for FakeIndex {
	fn search<'a>(
		&'a self,
		_cfg: &'a IndexProviderConfig,
		collection: Collection,
		_query: &'a str,
		_filters: &'a [FieldFilter],
		_limit: u32,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>> {
		Box::pin(async move { self.lookup(collection.index_name()) })
	}
}

impl FullTextIndexProvider for FakeIndex {
	fn search<'a>(
		&'a self,
		_cfg: &'a IndexProviderConfig,
		req: FullTextRequest<'a>,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>> {
		Box::pin(async move { self.lookup(req.collection) })
	}
}

/// A reranker that scores documents from a fixed list, repeating the last
/// score when it runs out.
#[derive(Default)]
pub struct FakeReranker {
	scores: Mutex<Vec<f32>>,
	calls: AtomicUsize,
	fail: AtomicBool,
}

impl FakeReranker {
	pub fn with_scores(scores: Vec<f32>) -> Arc<Self> {
		Arc::new(Self { scores: Mutex::new(scores), ..Self::default() })
	}

	pub fn failing() -> Arc<Self> {
		let reranker = Arc::new(Self::default());

		reranker.fail.store(true, Ordering::SeqCst);

		reranker
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl RerankProvider for FakeReranker {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<f32>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if self.fail.load(Ordering::SeqCst) {
				return Err(simulated_failure());
			}

			let scores = self.scores.lock().unwrap_or_else(|err| err.into_inner());
			let last = scores.last().copied().unwrap_or_default();

			Ok((0..docs.len()).map(|i| scores.get(i).copied().unwrap_or(last)).collect())
		})
	}
}

/// A completion provider with one canned response.
#[derive(Default)]
pub struct FakeLlm {
	response: Mutex<String>,
	calls: AtomicUsize,
	fail: AtomicBool,
}

impl FakeLlm {
	pub fn with_response(response: &str) -> Arc<Self> {
		Arc::new(Self { response: Mutex::new(response.to_string()), ..Self::default() })
	}

	pub fn failing() -> Arc<Self> {
		let llm = Arc::new(Self::default());

		llm.fail.store(true, Ordering::SeqCst);

		llm
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl CompletionProvider for FakeLlm {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if self.fail.load(Ordering::SeqCst) {
				return Err(simulated_failure());
			}

			Ok(self.response.lock().unwrap_or_else(|err| err.into_inner()).clone())
		})
	}
}

/// Wire a full provider set from the individual fakes.
pub fn fake_providers(
	vector: Arc<FakeIndex>,
	fulltext: Arc<FakeIndex>,
	rerank: Arc<FakeReranker>,
	llm: Arc<FakeLlm>,
) -> Providers {
	Providers::new(vector, fulltext, rerank, llm)
}

fn index_provider_config(provider_id: &str) -> IndexProviderConfig {
	IndexProviderConfig {
		provider_id: provider_id.to_string(),
		api_base: "http://localhost:0".to_string(),
		api_key: "test-key".to_string(),
		path: "/search".to_string(),
		timeout_ms: 1_000,
		default_headers: serde_json::Map::new(),
	}
}

/// A complete configuration with neutral-ish ranking weights, suitable for
/// exercising the whole pipeline against fakes.
pub fn test_config() -> Config {
	Config {
		service: Service::default(),
		providers: ProviderConfigs {
			vector: index_provider_config("fake-vector"),
			fulltext: index_provider_config("fake-fulltext"),
			rerank: ProviderConfig {
				provider_id: "fake-rerank".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/rerank".to_string(),
				model: "test-reranker".to_string(),
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "fake-llm".to_string(),
				api_base: "http://localhost:0".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test-model".to_string(),
				temperature: 0.2,
				timeout_ms: 1_000,
				default_headers: serde_json::Map::new(),
			},
		},
		search: Search::default(),
		ranking: Ranking {
			email_weight: 1.0,
			document_weight: 1.0,
			web_weight: 1.0,
			recency_weight: 0.0,
			recency_decay_days: 365.0,
			vector_weight: 1.0,
			fulltext_weight: 1.0,
			reranker_weight: 0.5,
			diversity_factor: 0.0,
		},
		dedupe: Dedupe::default(),
		chunking: Chunking::default(),
		enhancement: Enhancement::default(),
		session: Session::default(),
	}
}
