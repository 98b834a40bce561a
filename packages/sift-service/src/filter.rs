use serde_json::{Map, Value};

use sift_domain::{Collection, FieldFilter, FilterValue};

/// Translate generic metadata filters into one collection's schema.
///
/// Generic field names map onto collection-specific ones, unknown fields are
/// dropped with a warning, and a field that fails to parse drops only itself.
pub(crate) fn build_filters(collection: Collection, raw: &Map<String, Value>) -> Vec<FieldFilter> {
	let mut filters = Vec::new();

	for (field, value) in raw {
		let Some(parsed) = parse_value(field, value) else {
			continue;
		};
		let Some(filter) = map_field(collection, field, parsed) else {
			continue;
		};

		filters.push(filter);
	}

	filters
}

/// Parse one raw filter value. Strings become term filters, arrays become
/// alternatives, and a date written as `START to END` becomes a closed range.
fn parse_value(field: &str, value: &Value) -> Option<FilterValue> {
	match value {
		Value::String(text) => {
			let text = text.trim();

			if text.is_empty() {
				return None;
			}
			if field == "date" && text.contains(" to ") {
				let parts: Vec<&str> = text.split(" to ").collect();

				if let [start, end] = parts.as_slice() {
					return Some(FilterValue::Range {
						start: Some(start.trim().to_string()),
						end: Some(end.trim().to_string()),
					});
				}

				tracing::warn!(field, value = %text, "Malformed date range, treating as plain filter.");
			}
			if text.contains(", ") {
				let alternatives: Vec<String> =
					text.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();

				if alternatives.len() > 1 {
					return Some(FilterValue::AnyOf(alternatives));
				}
			}

			Some(FilterValue::Text(text.to_string()))
		},
		Value::Array(items) => {
			let alternatives: Vec<String> = items
				.iter()
				.filter_map(|item| item.as_str())
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(String::from)
				.collect();

			if alternatives.is_empty() {
				tracing::warn!(field, "Filter list holds no usable values, dropping it.");

				return None;
			}

			Some(FilterValue::AnyOf(alternatives))
		},
		Value::Null => None,
		other => {
			tracing::warn!(field, value = %other, "Unsupported filter value type, dropping it.");

			None
		},
	}
}

fn map_field(collection: Collection, field: &str, value: FilterValue) -> Option<FieldFilter> {
	match collection {
		Collection::Email => match field {
			"title" | "subject" => Some(FieldFilter::new("subject", value)),
			// The email index stores senders with ` at ` in place of `@`;
			// rewrite addresses so they match.
			"author" | "from" | "sender" => Some(FieldFilter::new("sender", obfuscate(value))),
			"date" => Some(FieldFilter::new("date", value)),
			"to" | "cc" => Some(FieldFilter::new(field, value)),
			_ => drop_unknown(collection, field),
		},
		Collection::Document => match field {
			"title" | "author" | "publisher" | "date" | "file_name" =>
				Some(FieldFilter::new(field, value)),
			_ => drop_unknown(collection, field),
		},
		Collection::Web => match field {
			"url" | "source_url" => Some(FieldFilter::new("source_url", value)),
			"title" | "domain" => Some(FieldFilter::new(field, value)),
			// The web index has no reliable capture-date field to filter on;
			// dates are ignored for web rather than returning nothing.
			"date" => {
				tracing::debug!("Date filters are not applied to the web collection.");

				None
			},
			_ => drop_unknown(collection, field),
		},
	}
}

fn drop_unknown(collection: Collection, field: &str) -> Option<FieldFilter> {
	tracing::warn!(collection = collection.label(), field, "Dropping unknown metadata filter field.");

	None
}

fn obfuscate(value: FilterValue) -> FilterValue {
	let rewrite = |text: String| {
		if text.contains('@') { text.replace('@', " at ") } else { text }
	};

	match value {
		FilterValue::Text(text) => FilterValue::Text(rewrite(text)),
		FilterValue::AnyOf(items) => FilterValue::AnyOf(items.into_iter().map(rewrite).collect()),
		range => range,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(pairs: &[(&str, Value)]) -> Map<String, Value> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
	}

	#[test]
	fn title_maps_to_subject_for_emails() {
		let filters =
			build_filters(Collection::Email, &raw(&[("title", Value::String("gpsdo".into()))]));

		assert_eq!(filters, vec![FieldFilter::text("subject", "gpsdo")]);
	}

	#[test]
	fn email_sender_address_is_rewritten() {
		let filters = build_filters(
			Collection::Email,
			&raw(&[("author", Value::String("kc7zzz@example.com".into()))]),
		);

		assert_eq!(filters, vec![FieldFilter::text("sender", "kc7zzz at example.com")]);
	}

	#[test]
	fn document_author_is_not_rewritten() {
		let filters = build_filters(
			Collection::Document,
			&raw(&[("author", Value::String("someone@example.com".into()))]),
		);

		assert_eq!(filters, vec![FieldFilter::text("author", "someone@example.com")]);
	}

	#[test]
	fn date_range_parses_to_closed_interval() {
		let filters = build_filters(
			Collection::Document,
			&raw(&[("date", Value::String("2023-01-01 to 2023-06-30".into()))]),
		);

		assert_eq!(filters, vec![FieldFilter::new(
			"date",
			FilterValue::Range {
				start: Some("2023-01-01".to_string()),
				end: Some("2023-06-30".to_string()),
			}
		)]);
	}

	#[test]
	fn web_date_filter_is_dropped() {
		let filters = build_filters(
			Collection::Web,
			&raw(&[
				("date", Value::String("2023-01-01".into())),
				("domain", Value::String("febo.com".into())),
			]),
		);

		assert_eq!(filters, vec![FieldFilter::text("domain", "febo.com")]);
	}

	#[test]
	fn url_maps_to_source_url_for_web() {
		let filters = build_filters(
			Collection::Web,
			&raw(&[("url", Value::String("https://example.com/a".into()))]),
		);

		assert_eq!(filters, vec![FieldFilter::text("source_url", "https://example.com/a")]);
	}

	#[test]
	fn unknown_field_is_dropped() {
		let filters = build_filters(
			Collection::Document,
			&raw(&[("frequency", Value::String("10 MHz".into()))]),
		);

		assert!(filters.is_empty());
	}

	#[test]
	fn list_becomes_alternatives() {
		let filters = build_filters(
			Collection::Document,
			&raw(&[("author", serde_json::json!(["Ackermann", "Riley"]))]),
		);

		assert_eq!(filters, vec![FieldFilter::new(
			"author",
			FilterValue::AnyOf(vec!["Ackermann".to_string(), "Riley".to_string()])
		)]);
	}

	#[test]
	fn comma_separated_string_becomes_alternatives() {
		let filters = build_filters(
			Collection::Document,
			&raw(&[("publisher", Value::String("NIST, HP".into()))]),
		);

		assert_eq!(filters, vec![FieldFilter::new(
			"publisher",
			FilterValue::AnyOf(vec!["NIST".to_string(), "HP".to_string()])
		)]);
	}

	#[test]
	fn empty_value_is_dropped() {
		let filters =
			build_filters(Collection::Email, &raw(&[("subject", Value::String("  ".into()))]));

		assert!(filters.is_empty());
	}
}
