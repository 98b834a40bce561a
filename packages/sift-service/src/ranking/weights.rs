use std::cmp::Ordering;

use time::OffsetDateTime;

use sift_config::Ranking;
use sift_domain::{Collection, SearchEngine, SearchHit, age_days, parse_date};

/// Scores closer than this are treated as tied.
pub(crate) const SCORE_EPSILON: f32 = 1e-4;

/// Descending comparison that pushes NaN to the end.
pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	b.partial_cmp(&a).unwrap_or_else(|| {
		if a.is_nan() && b.is_nan() {
			Ordering::Equal
		} else if a.is_nan() {
			Ordering::Greater
		} else {
			Ordering::Less
		}
	})
}

/// Linear recency decay: 1.0 today, 0.0 at `decay_days` and beyond.
///
/// A missing or unparseable date scores a neutral 0.5 rather than punishing
/// the passage for bad metadata.
pub(crate) fn recency_score(date: Option<&str>, now: OffsetDateTime, decay_days: f32) -> f32 {
	let Some(raw) = date else {
		return 0.5;
	};
	let Some(parsed) = parse_date(raw) else {
		tracing::debug!(date = %raw, "Unparseable date, using neutral recency.");

		return 0.5;
	};
	let days_old = age_days(parsed, now);

	if days_old <= 0.0 {
		1.0
	} else if days_old >= decay_days {
		0.0
	} else {
		1.0 - days_old / decay_days
	}
}

fn collection_weight(ranking: &Ranking, collection: Collection) -> f32 {
	match collection {
		Collection::Email => ranking.email_weight,
		Collection::Document => ranking.document_weight,
		Collection::Web => ranking.web_weight,
	}
}

fn source_weight(ranking: &Ranking, engine: SearchEngine) -> f32 {
	match engine {
		SearchEngine::Vector => ranking.vector_weight,
		SearchEngine::FullText => ranking.fulltext_weight,
	}
}

/// Blend semantic relevance with business rules into the final score.
///
/// The business side multiplies the raw retrieval score by collection,
/// recency and source factors; the rerank score (clamped to [0, 1]) covers
/// the semantic side. `reranker_weight` balances the two. Every factor is
/// recorded on the hit for auditability.
pub(crate) fn apply_final_weights(hits: &mut [SearchHit], ranking: &Ranking, now: OffsetDateTime) {
	let business_rules_weight = 1.0 - ranking.reranker_weight;

	for hit in hits.iter_mut() {
		let rerank_score = hit.explain.rerank_score.unwrap_or(hit.score);
		let collection_weight = collection_weight(ranking, hit.passage.collection);
		let recency_score =
			recency_score(hit.passage.metadata.date(), now, ranking.recency_decay_days);
		let recency_factor = 1.0 + recency_score * ranking.recency_weight;
		let source_weight = source_weight(ranking, hit.passage.engine);
		let business_score =
			hit.explain.original_score * collection_weight * recency_factor * source_weight;
		let normalized_rerank = rerank_score.clamp(0.0, 1.0);
		let final_score =
			normalized_rerank * ranking.reranker_weight + business_score * business_rules_weight;

		hit.explain.collection_weight = Some(collection_weight);
		hit.explain.recency_score = Some(recency_score);
		hit.explain.recency_factor = Some(recency_factor);
		hit.explain.source_weight = Some(source_weight);
		hit.explain.business_score = Some(business_score);
		hit.explain.final_score = Some(final_score);
		hit.score = final_score;
	}
}
