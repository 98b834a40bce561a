/// A parsed metadata filter value, ready for the index providers.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
	/// All whitespace-separated terms must match within the field.
	Text(String),
	/// Any one of the alternatives may match.
	AnyOf(Vec<String>),
	/// Closed interval over the field's natural ordering.
	Range { start: Option<String>, end: Option<String> },
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldFilter {
	pub field: String,
	pub value: FilterValue,
}

impl FieldFilter {
	pub fn new(field: impl Into<String>, value: FilterValue) -> Self {
		Self { field: field.into(), value }
	}

	pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(field, FilterValue::Text(value.into()))
	}
}
