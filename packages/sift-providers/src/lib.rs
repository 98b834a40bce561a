mod error;
pub mod fulltext;
pub mod llm;
pub mod rerank;
pub mod vector;

pub use error::{Error, Result};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

/// A raw hit from one of the backing indices, before conversion into the
/// passage model.
#[derive(Clone, Debug)]
pub struct IndexHit {
	pub id: String,
	pub score: f32,
	pub text: String,
	pub metadata: Map<String, Value>,
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

fn parse_hit(item: &Value, score: f32) -> Result<IndexHit> {
	let id = item
		.get("id")
		.and_then(|v| v.as_str())
		.ok_or_else(|| Error::invalid_response("Index hit is missing an id."))?
		.to_string();
	let text = item
		.get("text")
		.or_else(|| item.get("content"))
		.and_then(|v| v.as_str())
		.unwrap_or_default()
		.to_string();
	let metadata = item
		.get("metadata")
		.and_then(|v| v.as_object())
		.cloned()
		.unwrap_or_default();

	Ok(IndexHit { id, score, text, metadata })
}
