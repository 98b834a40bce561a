mod classify;
mod dedupe;
mod enhance;
mod error;
mod filter;
mod query;
mod ranking;
mod rerank;
mod search;
mod session;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use sift_config::{Config, IndexProviderConfig, LlmProviderConfig, ProviderConfig};
use sift_domain::{Collection, FieldFilter};
use sift_providers::{fulltext, llm, rerank as rerank_http, vector};

pub use classify::QueryKind;
pub use enhance::EnhancementOutcome;
pub use error::{Error, Result};
pub use query::{MetadataSearchRequest, QueryProvenance, SearchRequest, SearchResponse};
pub use session::SessionContext;
pub use sift_providers::{IndexHit, fulltext::FullTextRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorIndexProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		collection: Collection,
		query: &'a str,
		filters: &'a [FieldFilter],
		limit: u32,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>>;
}

pub trait FullTextIndexProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		req: FullTextRequest<'a>,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<f32>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub vector: Arc<dyn VectorIndexProvider>,
	pub fulltext: Arc<dyn FullTextIndexProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub llm: Arc<dyn CompletionProvider>,
}

impl Providers {
	pub fn new(
		vector: Arc<dyn VectorIndexProvider>,
		fulltext: Arc<dyn FullTextIndexProvider>,
		rerank: Arc<dyn RerankProvider>,
		llm: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { vector, fulltext, rerank, llm }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			vector: provider.clone(),
			fulltext: provider.clone(),
			rerank: provider.clone(),
			llm: provider,
		}
	}
}

struct DefaultProviders;

impl VectorIndexProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		collection: Collection,
		query: &'a str,
		filters: &'a [FieldFilter],
		limit: u32,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>> {
		Box::pin(vector::search(cfg, collection.index_name(), query, filters, limit))
	}
}

impl FullTextIndexProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a IndexProviderConfig,
		req: FullTextRequest<'a>,
	) -> BoxFuture<'a, sift_providers::Result<Vec<IndexHit>>> {
		Box::pin(fulltext::search(cfg, req))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, sift_providers::Result<Vec<f32>>> {
		Box::pin(rerank_http::rerank(cfg, query, docs))
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, sift_providers::Result<String>> {
		Box::pin(llm::complete(cfg, messages))
	}
}

pub struct SearchService {
	pub cfg: Config,
	pub providers: Providers,
}

impl SearchService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg, providers }
	}
}
