use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
	Email,
	Document,
	Web,
}

impl Collection {
	pub const ALL: [Self; 3] = [Self::Email, Self::Document, Self::Web];

	pub fn label(&self) -> &'static str {
		match self {
			Self::Email => "Email",
			Self::Document => "Document",
			Self::Web => "Web",
		}
	}

	/// Index name as registered with the backing search services.
	pub fn index_name(&self) -> &'static str {
		match self {
			Self::Email => "emails",
			Self::Document => "documents",
			Self::Web => "web",
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEngine {
	Vector,
	FullText,
}

impl SearchEngine {
	pub fn label(&self) -> &'static str {
		match self {
			Self::Vector => "Vector",
			Self::FullText => "FullText",
		}
	}
}

/// Source tag attached to every hit, e.g. `FullText-Email`.
pub fn provider_label(engine: SearchEngine, collection: Collection) -> String {
	format!("{}-{}", engine.label(), collection.label())
}

/// Parse a collection filter such as `all` or `emails,web`.
///
/// Singular and plural collection names are accepted; duplicates collapse.
pub fn parse_collection_filter(filter: &str) -> Result<Vec<Collection>> {
	let trimmed = filter.trim();

	if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
		return Ok(Collection::ALL.to_vec());
	}

	let mut collections = Vec::new();

	for token in trimmed.split(',') {
		let token = token.trim();

		if token.is_empty() {
			continue;
		}

		let collection = match token.to_ascii_lowercase().as_str() {
			"email" | "emails" => Collection::Email,
			"document" | "documents" => Collection::Document,
			"web" => Collection::Web,
			_ => return Err(Error::UnknownCollection { token: token.to_string() }),
		};

		if !collections.contains(&collection) {
			collections.push(collection);
		}
	}

	if collections.is_empty() {
		return Err(Error::EmptyCollectionFilter);
	}

	Ok(collections)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn all_filter_selects_every_collection() {
		assert_eq!(parse_collection_filter("all").unwrap(), Collection::ALL.to_vec());
		assert_eq!(parse_collection_filter("  ").unwrap(), Collection::ALL.to_vec());
	}

	#[test]
	fn comma_list_selects_named_collections() {
		let collections = parse_collection_filter("emails, web").unwrap();

		assert_eq!(collections, vec![Collection::Email, Collection::Web]);
	}

	#[test]
	fn duplicates_collapse() {
		let collections = parse_collection_filter("documents,document").unwrap();

		assert_eq!(collections, vec![Collection::Document]);
	}

	#[test]
	fn unknown_token_is_rejected() {
		assert!(matches!(
			parse_collection_filter("emails,videos"),
			Err(Error::UnknownCollection { .. })
		));
	}

	#[test]
	fn provider_label_combines_engine_and_collection() {
		assert_eq!(provider_label(SearchEngine::FullText, Collection::Email), "FullText-Email");
		assert_eq!(provider_label(SearchEngine::Vector, Collection::Web), "Vector-Web");
	}
}
