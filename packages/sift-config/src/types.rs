use serde_json::{Map, Value};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	// Ranking weights are deliberately not defaulted; a config that is
	// silent about them is an error, not a guess.
	pub ranking: Ranking,
	#[serde(default)]
	pub dedupe: Dedupe,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub enhancement: Enhancement,
	#[serde(default)]
	pub session: Session,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}

impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Providers {
	pub vector: IndexProviderConfig,
	pub fulltext: IndexProviderConfig,
	pub rerank: ProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct IndexProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Search {
	pub top_k: u32,
	pub similarity_threshold: f32,
	pub fuzzy: bool,
	pub use_reranking: bool,
	/// Metadata searches fetch `top_k` times this many candidates so the
	/// per-document collapse has enough to pick from.
	pub metadata_candidate_multiplier: u32,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 10,
			similarity_threshold: 0.5,
			fuzzy: true,
			use_reranking: true,
			metadata_candidate_multiplier: 5,
		}
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Ranking {
	pub email_weight: f32,
	pub document_weight: f32,
	pub web_weight: f32,
	pub recency_weight: f32,
	pub recency_decay_days: f32,
	pub vector_weight: f32,
	pub fulltext_weight: f32,
	pub reranker_weight: f32,
	pub diversity_factor: f32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Dedupe {
	pub similarity_threshold: f32,
}

impl Default for Dedupe {
	fn default() -> Self {
		Self { similarity_threshold: 0.85 }
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub chunk_size: u32,
	pub chunk_overlap: u32,
	pub size_flexibility: f32,
}

impl Default for Chunking {
	fn default() -> Self {
		Self { chunk_size: 500, chunk_overlap: 75, size_flexibility: 0.15 }
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Enhancement {
	/// LLM query rewriting before retrieval.
	pub llm_rewrite: bool,
	/// Rule-based follow-up context from the previous user query.
	pub follow_up_context: bool,
}

impl Default for Enhancement {
	fn default() -> Self {
		Self { llm_rewrite: false, follow_up_context: true }
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Session {
	pub cache_ttl_secs: u64,
}

impl Default for Session {
	fn default() -> Self {
		Self { cache_ttl_secs: 300 }
	}
}
