use std::time::Duration;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use sift_domain::{ConversationTurn, SearchHit, SearchMode, parse_collection_filter};

use crate::{
	Error, QueryKind, Result, SearchService, SessionContext,
	classify::classify_query,
	dedupe::dedupe_hits,
	ranking::{apply_diversity, apply_final_weights, cmp_f32_desc},
	search::{FanOut, collapse_best_per_document},
};

/// One search request. Every tuning knob is optional and falls back to the
/// service configuration.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub query: Option<String>,
	/// Collection filter such as `all` or `emails,web`.
	pub collections: Option<String>,
	pub mode: SearchMode,
	pub filters: Map<String, Value>,
	pub history: Vec<ConversationTurn>,
	pub top_k: Option<u32>,
	pub similarity_threshold: Option<f32>,
	pub fuzzy: Option<bool>,
	pub use_reranking: Option<bool>,
}

/// A pure metadata lookup, optionally narrowed by a content query.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MetadataSearchRequest {
	pub collections: Option<String>,
	pub filters: Map<String, Value>,
	pub content_query: Option<String>,
	pub top_k: Option<u32>,
	pub similarity_threshold: Option<f32>,
	pub fuzzy: Option<bool>,
}

/// How the executed query relates to what the caller sent.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct QueryProvenance {
	pub original: String,
	pub after_llm: String,
	pub final_query: String,
	pub llm_changed: bool,
	pub rule_changed: bool,
	pub kind: QueryKind,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub hits: Vec<SearchHit>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub provenance: Option<QueryProvenance>,
	pub cache_hit: bool,
}

fn non_empty(query: Option<&str>) -> Option<&str> {
	query.map(str::trim).filter(|q| !q.is_empty())
}

fn resolve_mode(mode: SearchMode, query: Option<&str>, filters: &Map<String, Value>) -> Result<SearchMode> {
	match mode {
		SearchMode::Auto => match (query.is_some(), !filters.is_empty()) {
			(true, true) => Ok(SearchMode::Combined),
			(true, false) => Ok(SearchMode::ContentOnly),
			(false, true) => Ok(SearchMode::MetadataOnly),
			(false, false) =>
				Err(Error::invalid_request("A search needs a query or metadata filters.")),
		},
		SearchMode::ContentOnly | SearchMode::Combined if query.is_none() =>
			Err(Error::invalid_request("A content search needs a non-empty query.")),
		SearchMode::MetadataOnly if filters.is_empty() =>
			Err(Error::invalid_request("A metadata search needs at least one filter.")),
		other => Ok(other),
	}
}

impl SearchService {
	/// Run the full retrieval pipeline for one request.
	///
	/// Content queries are classified against the conversation, enhanced,
	/// answered from the session cache when unchanged, and otherwise fanned
	/// out, deduplicated, reranked and reweighted before the final cut.
	pub async fn search(
		&self,
		session: &SessionContext,
		req: &SearchRequest,
	) -> Result<SearchResponse> {
		let query = non_empty(req.query.as_deref());
		let mode = resolve_mode(req.mode, query, &req.filters)?;
		let collections = parse_collection_filter(req.collections.as_deref().unwrap_or("all"))?;
		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k);

		if top_k == 0 {
			return Err(Error::invalid_request("top_k must be greater than zero."));
		}

		let content_query = (mode != SearchMode::MetadataOnly).then_some(query).flatten();
		let no_filters = Map::new();
		let filters = if mode == SearchMode::ContentOnly { &no_filters } else { &req.filters };
		let provenance = match content_query {
			Some(original) => Some(self.prepare_query(original, &req.history).await),
			None => None,
		};
		let final_query = provenance.as_ref().map(|p| p.final_query.as_str());
		let ttl = Duration::from_secs(self.cfg.session.cache_ttl_secs);

		if let Some(provenance) = &provenance
			&& let Some(hits) = session.lookup(&provenance.original, &provenance.final_query, ttl)
		{
			return Ok(SearchResponse { hits, provenance: Some(provenance.clone()), cache_hit: true });
		}

		let mut hits = self
			.fan_out(FanOut {
				collections: &collections,
				content_query: final_query,
				filters,
				limit: top_k,
				fuzzy: req.fuzzy.unwrap_or(self.cfg.search.fuzzy),
				similarity_threshold: req
					.similarity_threshold
					.unwrap_or(self.cfg.search.similarity_threshold),
			})
			.await;

		// Metadata-only lookups keep the index's own ordering; the weighting
		// pipeline only applies to content searches.
		if content_query.is_none() {
			let mut hits = collapse_best_per_document(hits);

			hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
			hits.truncate(top_k as usize);

			tracing::info!(
				collections = collections.len(),
				hits = hits.len(),
				"Metadata search completed."
			);

			return Ok(SearchResponse { hits, provenance: None, cache_hit: false });
		}

		apply_diversity(&mut hits, self.cfg.ranking.diversity_factor);

		let mut hits = dedupe_hits(hits, self.cfg.dedupe.similarity_threshold);
		let use_reranking = req.use_reranking.unwrap_or(self.cfg.search.use_reranking);

		if let Some(query) = final_query
			&& use_reranking && hits.len() > 1
		{
			self.apply_rerank(query, &mut hits).await;
		}

		apply_final_weights(&mut hits, &self.cfg.ranking, OffsetDateTime::now_utc());
		hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
		hits.truncate(top_k as usize);

		if let Some(provenance) = &provenance {
			session.store(&provenance.original, &provenance.final_query, &hits);
		}

		tracing::info!(
			collections = collections.len(),
			hits = hits.len(),
			cache_hit = false,
			"Search completed."
		);

		Ok(SearchResponse { hits, provenance, cache_hit: false })
	}

	/// Metadata lookup without the ranking pipeline: raw index scores,
	/// collapsed to one entry per document unless a content query keeps the
	/// chunks meaningful.
	pub async fn search_by_metadata(&self, req: &MetadataSearchRequest) -> Result<Vec<SearchHit>> {
		if req.filters.is_empty() {
			return Err(Error::invalid_request("A metadata search needs at least one filter."));
		}

		let collections = parse_collection_filter(req.collections.as_deref().unwrap_or("all"))?;
		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k);

		if top_k == 0 {
			return Err(Error::invalid_request("top_k must be greater than zero."));
		}

		let content_query = non_empty(req.content_query.as_deref());
		let mut hits = self
			.fan_out(FanOut {
				collections: &collections,
				content_query,
				filters: &req.filters,
				limit: top_k,
				fuzzy: req.fuzzy.unwrap_or(self.cfg.search.fuzzy),
				similarity_threshold: req
					.similarity_threshold
					.unwrap_or(self.cfg.search.similarity_threshold),
			})
			.await;

		if content_query.is_none() {
			hits = collapse_best_per_document(hits);
		}

		hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
		hits.truncate(top_k as usize);

		Ok(hits)
	}

	/// Classify and enhance a content query against the conversation so far.
	async fn prepare_query(&self, original: &str, history: &[ConversationTurn]) -> QueryProvenance {
		let mut turns = history.to_vec();

		turns.push(ConversationTurn::user(original));

		let kind = classify_query(&turns);
		let outcome = self.enhance_query(original, kind, &turns).await;

		QueryProvenance {
			original: outcome.original,
			after_llm: outcome.after_llm,
			final_query: outcome.final_query,
			llm_changed: outcome.llm_changed,
			rule_changed: outcome.rule_changed,
			kind,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn auto_mode_resolves_from_inputs() {
		let filters: Map<String, Value> =
			[("author".to_string(), Value::String("Riley".to_string()))].into_iter().collect();

		assert_eq!(
			resolve_mode(SearchMode::Auto, Some("q"), &filters).unwrap(),
			SearchMode::Combined
		);
		assert_eq!(
			resolve_mode(SearchMode::Auto, Some("q"), &Map::new()).unwrap(),
			SearchMode::ContentOnly
		);
		assert_eq!(
			resolve_mode(SearchMode::Auto, None, &filters).unwrap(),
			SearchMode::MetadataOnly
		);
		assert!(resolve_mode(SearchMode::Auto, None, &Map::new()).is_err());
	}

	#[test]
	fn explicit_modes_validate_their_inputs() {
		assert!(resolve_mode(SearchMode::ContentOnly, None, &Map::new()).is_err());
		assert!(resolve_mode(SearchMode::MetadataOnly, None, &Map::new()).is_err());
		assert_eq!(
			resolve_mode(SearchMode::ContentOnly, Some("q"), &Map::new()).unwrap(),
			SearchMode::ContentOnly
		);
	}

	#[test]
	fn blank_query_counts_as_absent() {
		assert_eq!(non_empty(Some("   ")), None);
		assert_eq!(non_empty(Some(" adev ")), Some("adev"));
		assert_eq!(non_empty(None), None);
	}
}
