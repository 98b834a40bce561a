use ahash::AHashMap;

use sift_domain::{Collection, SearchEngine, SearchHit};

/// Nudge scores so no single (collection, engine) group dominates the set
/// handed to the reranker.
///
/// Overrepresented groups are damped, underrepresented ones boosted, both in
/// proportion to `diversity_factor`. The adjustment always starts from the
/// raw retrieval score, which is preserved in the explain block.
pub(crate) fn apply_diversity(hits: &mut [SearchHit], diversity_factor: f32) {
	if hits.is_empty() {
		return;
	}

	let mut group_sizes: AHashMap<(Collection, SearchEngine), usize> = AHashMap::new();

	for hit in hits.iter() {
		*group_sizes.entry((hit.passage.collection, hit.passage.engine)).or_default() += 1;
	}

	let total = hits.len() as f32;
	let even_share = total / group_sizes.len() as f32;

	for hit in hits.iter_mut() {
		let group_size =
			group_sizes[&(hit.passage.collection, hit.passage.engine)] as f32;
		let adjustment = if group_size > even_share {
			1.0 - diversity_factor * (group_size / total)
		} else {
			1.0 + diversity_factor * (1.0 - group_size / total)
		};

		hit.score = hit.explain.original_score * adjustment;
		hit.explain.diversity_adjustment = Some(adjustment);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use sift_domain::Passage;

	fn hit(collection: Collection, engine: SearchEngine, score: f32) -> SearchHit {
		SearchHit::new(Passage::new("id", collection, engine, "text"), score)
	}

	#[test]
	fn overrepresented_group_is_damped() {
		let mut hits = vec![
			hit(Collection::Email, SearchEngine::FullText, 0.8),
			hit(Collection::Email, SearchEngine::FullText, 0.7),
			hit(Collection::Email, SearchEngine::FullText, 0.6),
			hit(Collection::Document, SearchEngine::Vector, 0.5),
		];

		apply_diversity(&mut hits, 0.1);

		// Email/FullText holds 3 of 4 results against an even share of 2.
		let damped = hits[0].explain.diversity_adjustment.unwrap();
		let boosted = hits[3].explain.diversity_adjustment.unwrap();

		assert!(damped < 1.0);
		assert!(boosted > 1.0);
		assert!((hits[0].score - 0.8 * damped).abs() < 1e-6);
		assert!((hits[3].score - 0.5 * boosted).abs() < 1e-6);
	}

	#[test]
	fn zero_factor_changes_nothing() {
		let mut hits = vec![
			hit(Collection::Email, SearchEngine::FullText, 0.8),
			hit(Collection::Document, SearchEngine::Vector, 0.5),
		];

		apply_diversity(&mut hits, 0.0);

		assert_eq!(hits[0].score, 0.8);
		assert_eq!(hits[1].score, 0.5);
	}

	#[test]
	fn original_score_is_preserved() {
		let mut hits = vec![
			hit(Collection::Email, SearchEngine::FullText, 0.8),
			hit(Collection::Email, SearchEngine::FullText, 0.7),
			hit(Collection::Web, SearchEngine::Vector, 0.6),
		];

		apply_diversity(&mut hits, 0.2);

		assert_eq!(hits[0].explain.original_score, 0.8);
		assert_eq!(hits[1].explain.original_score, 0.7);
	}
}
