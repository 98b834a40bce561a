use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use sift_domain::FieldFilter;

use crate::{Error, IndexHit, Result};

/// Nearest-neighbour search against the vector index service.
///
/// The service embeds the query itself; hits come back with distances, which
/// are converted to similarities here. The similarity threshold is applied by
/// the caller so degraded responses stay visible in one place.
pub async fn search(
	cfg: &sift_config::IndexProviderConfig,
	collection: &str,
	query: &str,
	filters: &[FieldFilter],
	limit: u32,
) -> Result<Vec<IndexHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"collection": collection,
		"query": query,
		"filters": filters,
		"limit": limit,
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
		.ok_or_else(|| Error::invalid_response("Vector response is missing hits array."))?;
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let distance = item
			.get("distance")
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::invalid_response("Vector hit is missing a distance."))?;
		let similarity = 1.0 - distance as f32;

		hits.push(crate::parse_hit(item, similarity)?);
	}

	Ok(hits)
}
