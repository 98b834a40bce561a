pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Unknown collection `{token}` in collection filter.")]
	UnknownCollection { token: String },
	#[error("Collection filter must name at least one collection.")]
	EmptyCollectionFilter,
}
