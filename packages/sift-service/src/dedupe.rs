use ahash::AHashSet;

use sift_domain::{Collection, SearchHit, parse_date};

use crate::ranking::SCORE_EPSILON;

/// Collapse near-duplicate document passages.
///
/// Only the document collection is deduplicated; emails and web captures are
/// distinct items even when they quote each other. When two passages overlap
/// above `similarity_threshold` the better one keeps the earlier position,
/// preferring a higher score, then a more recent date, then the earlier chunk
/// of the same parent document.
pub(crate) fn dedupe_hits(hits: Vec<SearchHit>, similarity_threshold: f32) -> Vec<SearchHit> {
	let mut kept: Vec<SearchHit> = Vec::with_capacity(hits.len());
	let mut kept_tokens: Vec<Option<AHashSet<String>>> = Vec::with_capacity(hits.len());

	'candidates: for hit in hits {
		let tokens = if hit.passage.collection == Collection::Document {
			token_set(&hit.passage.text)
		} else {
			None
		};

		if let Some(candidate_tokens) = &tokens {
			for (index, existing_tokens) in kept_tokens.iter().enumerate() {
				let Some(existing_tokens) = existing_tokens else {
					continue;
				};

				if jaccard(candidate_tokens, existing_tokens) > similarity_threshold {
					if prefer_candidate(&hit, &kept[index]) {
						tracing::debug!(
							replaced = %kept[index].passage.id,
							kept = %hit.passage.id,
							"Replacing near-duplicate document passage.",
						);

						kept[index] = hit;
						kept_tokens[index] = tokens;
					} else {
						tracing::debug!(
							dropped = %hit.passage.id,
							kept = %kept[index].passage.id,
							"Dropping near-duplicate document passage.",
						);
					}

					continue 'candidates;
				}
			}
		}

		kept.push(hit);
		kept_tokens.push(tokens);
	}

	kept
}

fn token_set(text: &str) -> Option<AHashSet<String>> {
	let tokens: AHashSet<String> =
		text.to_lowercase().split_whitespace().map(String::from).collect();

	if tokens.is_empty() { None } else { Some(tokens) }
}

fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f32 {
	let intersection = a.intersection(b).count();
	let union = a.len() + b.len() - intersection;

	if union == 0 { 0.0 } else { intersection as f32 / union as f32 }
}

/// Whether `candidate` should displace the already-kept `existing` duplicate.
fn prefer_candidate(candidate: &SearchHit, existing: &SearchHit) -> bool {
	if (candidate.score - existing.score).abs() >= SCORE_EPSILON {
		return candidate.score > existing.score;
	}

	// Scores tie: prefer the more recent passage when dates differ.
	let candidate_date = candidate.passage.metadata.date().and_then(parse_date);
	let existing_date = existing.passage.metadata.date().and_then(parse_date);

	if let (Some(candidate_date), Some(existing_date)) = (candidate_date, existing_date)
		&& candidate_date != existing_date
	{
		return candidate_date > existing_date;
	}

	// Same parent document: prefer the earlier chunk.
	if candidate.passage.parent_hash.is_some()
		&& candidate.passage.parent_hash == existing.passage.parent_hash
		&& let (Some(candidate_chunk), Some(existing_chunk)) =
			(candidate.passage.chunk_number, existing.passage.chunk_number)
	{
		return candidate_chunk < existing_chunk;
	}

	false
}

#[cfg(test)]
mod tests {
	use super::*;

	use sift_domain::{DocumentMetadata, Passage, PassageMetadata, SearchEngine};

	fn document(id: &str, text: &str, score: f32) -> SearchHit {
		SearchHit::new(Passage::new(id, Collection::Document, SearchEngine::Vector, text), score)
	}

	fn with_date(mut hit: SearchHit, date: &str) -> SearchHit {
		hit.passage.metadata = PassageMetadata::Document(DocumentMetadata {
			date: Some(date.to_string()),
			..Default::default()
		});

		hit
	}

	#[test]
	fn near_duplicates_collapse_to_higher_score() {
		let hits = vec![
			document("a", "the quick brown fox jumps over the lazy dog", 0.6),
			document("b", "the quick brown fox jumps over the lazy dog today", 0.8),
			document("c", "a completely different passage about oscillators", 0.5),
		];
		let kept = dedupe_hits(hits, 0.85);

		assert_eq!(kept.len(), 2);
		assert_eq!(kept[0].passage.id, "b");
		assert_eq!(kept[1].passage.id, "c");
	}

	#[test]
	fn first_seen_wins_on_equal_score() {
		let hits = vec![
			document("a", "identical text about allan deviation plots", 0.7),
			document("b", "identical text about allan deviation plots", 0.7),
		];
		let kept = dedupe_hits(hits, 0.85);

		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].passage.id, "a");
	}

	#[test]
	fn tied_score_prefers_newer_date() {
		let hits = vec![
			with_date(document("old", "identical text about allan deviation plots", 0.7), "2020-01-01"),
			with_date(document("new", "identical text about allan deviation plots", 0.7), "2024-01-01"),
		];
		let kept = dedupe_hits(hits, 0.85);

		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].passage.id, "new");
	}

	#[test]
	fn tied_score_same_parent_prefers_earlier_chunk() {
		let mut first = document("a", "identical text about allan deviation plots", 0.7);
		let mut second = document("b", "identical text about allan deviation plots", 0.7);

		first.passage.parent_hash = Some("parent".to_string());
		first.passage.chunk_number = Some(3);
		second.passage.parent_hash = Some("parent".to_string());
		second.passage.chunk_number = Some(1);

		let kept = dedupe_hits(vec![first, second], 0.85);

		assert_eq!(kept.len(), 1);
		assert_eq!(kept[0].passage.chunk_number, Some(1));
	}

	#[test]
	fn emails_are_never_deduplicated() {
		let text = "identical forwarded email body about gpsdo";
		let hits = vec![
			SearchHit::new(
				Passage::new("a", Collection::Email, SearchEngine::FullText, text),
				0.7,
			),
			SearchHit::new(
				Passage::new("b", Collection::Email, SearchEngine::FullText, text),
				0.7,
			),
		];
		let kept = dedupe_hits(hits, 0.85);

		assert_eq!(kept.len(), 2);
	}

	#[test]
	fn empty_text_passes_through() {
		let hits = vec![document("a", "", 0.7), document("b", "", 0.6)];
		let kept = dedupe_hits(hits, 0.85);

		assert_eq!(kept.len(), 2);
	}
}
