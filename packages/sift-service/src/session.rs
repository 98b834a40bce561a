use std::{
	sync::Mutex,
	time::{Duration, Instant},
};

use uuid::Uuid;

use sift_domain::SearchHit;

/// Per-conversation retrieval state.
///
/// Holds the single most recent search so an unchanged query within the TTL
/// is answered without touching the indices. The lock is only ever held for
/// the copy in or out, never across an await.
pub struct SessionContext {
	session_id: Uuid,
	cache: Mutex<Option<CachedSearch>>,
}

struct CachedSearch {
	original_query: String,
	final_query: String,
	hits: Vec<SearchHit>,
	stored_at: Instant,
}

impl Default for SessionContext {
	fn default() -> Self {
		Self::new()
	}
}

impl SessionContext {
	pub fn new() -> Self {
		Self { session_id: Uuid::new_v4(), cache: Mutex::new(None) }
	}

	pub fn session_id(&self) -> Uuid {
		self.session_id
	}

	/// Cached hits, provided both the original and the enhanced query match
	/// and the entry is still fresh.
	pub(crate) fn lookup(
		&self,
		original_query: &str,
		final_query: &str,
		ttl: Duration,
	) -> Option<Vec<SearchHit>> {
		let Ok(guard) = self.cache.lock() else {
			return None;
		};
		let cached = guard.as_ref()?;

		if cached.stored_at.elapsed() >= ttl {
			tracing::debug!(session_id = %self.session_id, "Retrieval cache expired.");

			return None;
		}
		if cached.original_query != original_query {
			tracing::debug!(session_id = %self.session_id, "Retrieval cache miss, original query differs.");

			return None;
		}
		if cached.final_query != final_query {
			tracing::debug!(
				session_id = %self.session_id,
				"Retrieval cache miss, enhanced query differs for the same original query."
			);

			return None;
		}

		tracing::debug!(session_id = %self.session_id, "Retrieval cache hit.");

		Some(cached.hits.clone())
	}

	pub(crate) fn store(&self, original_query: &str, final_query: &str, hits: &[SearchHit]) {
		let Ok(mut guard) = self.cache.lock() else {
			return;
		};

		*guard = Some(CachedSearch {
			original_query: original_query.to_string(),
			final_query: final_query.to_string(),
			hits: hits.to_vec(),
			stored_at: Instant::now(),
		});
	}

	/// Drop the cached search so the next query hits the indices again.
	pub fn clear(&self) {
		let Ok(mut guard) = self.cache.lock() else {
			return;
		};

		*guard = None;
	}
}
