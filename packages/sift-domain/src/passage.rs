use crate::{
	collection::{Collection, SearchEngine, provider_label},
	metadata::PassageMetadata,
};

/// How a search request combines content and metadata inputs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
	ContentOnly,
	MetadataOnly,
	Combined,
	/// Resolve from which inputs are present on the request.
	#[default]
	Auto,
}

/// One retrievable unit: a whole item or a chunk of one.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Passage {
	pub id: String,
	pub collection: Collection,
	pub engine: SearchEngine,
	/// Source tag, e.g. `Vector-Document`.
	pub search_provider: String,
	pub text: String,
	pub metadata: PassageMetadata,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chunk_number: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_chunks: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent_hash: Option<String>,
}

impl Passage {
	pub fn new(
		id: impl Into<String>,
		collection: Collection,
		engine: SearchEngine,
		text: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			collection,
			engine,
			search_provider: provider_label(engine, collection),
			text: text.into(),
			metadata: PassageMetadata::empty(collection),
			chunk_number: None,
			total_chunks: None,
			parent_hash: None,
		}
	}
}

/// Every factor that contributed to a hit's final score.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ScoreExplain {
	pub original_score: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub diversity_adjustment: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rerank_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub collection_weight: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recency_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub recency_factor: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub source_weight: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub business_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub final_score: Option<f32>,
}

/// A passage with its working score and the factors behind it.
///
/// `score` is mutated as the ranking pipeline runs; `explain.original_score`
/// always preserves the raw retrieval score.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
	pub passage: Passage,
	pub score: f32,
	pub explain: ScoreExplain,
}

impl SearchHit {
	pub fn new(passage: Passage, score: f32) -> Self {
		let score = if score.is_finite() { score } else { 0.0 };

		Self {
			passage,
			score,
			explain: ScoreExplain { original_score: score, ..Default::default() },
		}
	}
}
