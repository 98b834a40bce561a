use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use sift_domain::FieldFilter;

use crate::{Error, IndexHit, Result};

/// One query against the full-text index service.
///
/// `query` terms are matched across `fields`; `filters` constrain metadata
/// independently. A request with no query is a pure metadata lookup.
#[derive(Clone, Copy, Debug)]
pub struct FullTextRequest<'a> {
	pub collection: &'a str,
	pub query: Option<&'a str>,
	pub fields: &'a [&'a str],
	pub filters: &'a [FieldFilter],
	pub limit: u32,
	pub fuzzy: bool,
}

pub async fn search(
	cfg: &sift_config::IndexProviderConfig,
	req: FullTextRequest<'_>,
) -> Result<Vec<IndexHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"collection": req.collection,
		"query": req.query,
		"fields": req.fields,
		"filters": req.filters,
		"limit": req.limit,
		"fuzzy": req.fuzzy,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<IndexHit>> {
	let items = json
		.get("hits")
		.or_else(|| json.get("results"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::invalid_response("Full-text response is missing hits array."))?;
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let score = item.get("score").and_then(|v| v.as_f64()).unwrap_or_default() as f32;

		hits.push(crate::parse_hit(item, score)?);
	}

	Ok(hits)
}
