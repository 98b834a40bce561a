use serde_json::{Map, Value};

use crate::collection::Collection;

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EmailMetadata {
	pub subject: Option<String>,
	pub sender: Option<String>,
	pub to: Option<String>,
	pub cc: Option<String>,
	pub date: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
	pub title: Option<String>,
	pub author: Option<String>,
	pub publisher: Option<String>,
	pub date: Option<String>,
	pub publication_date: Option<String>,
	pub file_name: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WebMetadata {
	pub title: Option<String>,
	pub domain: Option<String>,
	pub source_url: Option<String>,
	pub captured_at: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Per-collection metadata with a shared accessor surface.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassageMetadata {
	Email(EmailMetadata),
	Document(DocumentMetadata),
	Web(WebMetadata),
}

impl PassageMetadata {
	pub fn empty(collection: Collection) -> Self {
		match collection {
			Collection::Email => Self::Email(EmailMetadata::default()),
			Collection::Document => Self::Document(DocumentMetadata::default()),
			Collection::Web => Self::Web(WebMetadata::default()),
		}
	}

	pub fn collection(&self) -> Collection {
		match self {
			Self::Email(_) => Collection::Email,
			Self::Document(_) => Collection::Document,
			Self::Web(_) => Collection::Web,
		}
	}

	/// The date used for recency scoring and tie-breaking.
	///
	/// Documents prefer their publication date over the generic date field;
	/// web captures date from the capture timestamp.
	pub fn date(&self) -> Option<&str> {
		match self {
			Self::Email(meta) => meta.date.as_deref(),
			Self::Document(meta) => meta.publication_date.as_deref().or(meta.date.as_deref()),
			Self::Web(meta) => meta.captured_at.as_deref(),
		}
	}

	pub fn title(&self) -> Option<&str> {
		match self {
			Self::Email(meta) => meta.subject.as_deref(),
			Self::Document(meta) => meta.title.as_deref(),
			Self::Web(meta) => meta.title.as_deref(),
		}
	}

	pub fn author(&self) -> Option<&str> {
		match self {
			Self::Email(meta) => meta.sender.as_deref(),
			Self::Document(meta) => meta.author.as_deref(),
			Self::Web(_) => None,
		}
	}

	pub fn url(&self) -> Option<&str> {
		match self {
			Self::Email(_) => None,
			Self::Document(_) => None,
			Self::Web(meta) => meta.source_url.as_deref(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn document_prefers_publication_date() {
		let meta = PassageMetadata::Document(DocumentMetadata {
			date: Some("2020-01-01".to_string()),
			publication_date: Some("2023-05-05".to_string()),
			..Default::default()
		});

		assert_eq!(meta.date(), Some("2023-05-05"));
	}

	#[test]
	fn web_date_comes_from_capture_timestamp() {
		let meta = PassageMetadata::Web(WebMetadata {
			captured_at: Some("2024-02-02".to_string()),
			..Default::default()
		});

		assert_eq!(meta.date(), Some("2024-02-02"));
	}

	#[test]
	fn unknown_fields_land_in_extra() {
		let value = serde_json::json!({
			"kind": "email",
			"subject": "Timing",
			"list_id": "time-nuts",
		});
		let meta: PassageMetadata = serde_json::from_value(value).unwrap();
		let PassageMetadata::Email(email) = meta else { panic!("expected email metadata") };

		assert_eq!(email.subject.as_deref(), Some("Timing"));
		assert_eq!(email.extra.get("list_id").and_then(|v| v.as_str()), Some("time-nuts"));
	}
}
