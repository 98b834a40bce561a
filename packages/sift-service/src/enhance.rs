use std::sync::LazyLock;

use regex::Regex;

use sift_domain::{ConversationTurn, Role};

use crate::{QueryKind, SearchService};

// Words too generic to anchor a follow-up context.
const STOPWORDS: &[&str] = &[
	"what", "when", "where", "which", "why", "how", "can", "does", "will", "should", "would",
	"could", "from", "with", "about", "the", "and", "for", "this", "that", "these", "those", "is",
	"are",
];

static PRONOUN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b(it|this|that|these|those|they|them|their)\b")
		.expect("Pronoun pattern must compile.")
});

/// What the two enhancement stages did to a query.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EnhancementOutcome {
	pub original: String,
	pub after_llm: String,
	pub final_query: String,
	pub llm_changed: bool,
	pub rule_changed: bool,
}

fn build_rewrite_prompt(query: &str) -> String {
	format!(
		"Your task is to rewrite the following user query to be more effective for \
searching a technical knowledge base. The knowledge base is strictly focused on \
time and frequency measurement, related physics principles such as atomic physics \
for clocks, and closely associated electronics such as oscillator circuits, \
counter design and phase detectors.\n\
\n\
Original User Query:\n\
\"{query}\"\n\
\n\
Instructions for rewriting:\n\
1. Preserve the core intent and nuance of the query. If the user asks about the \
importance, function, role or measurement of a specific technical term, the \
rewritten query must reflect that specific inquiry. Do not assume such terms \
refer to a problem or something to be minimized unless the user's phrasing says \
so; many terms in this domain name intentional, functional aspects of a system.\n\
2. If the query is vague, make it specific to the domain, for example \
\"stability issues\" becomes \"frequency stability issues in crystal \
oscillators\".\n\
3. Replace general terms with precise technical terminology from the time and \
frequency domain where appropriate.\n\
4. Expand common domain abbreviations to their full form and keep the original \
abbreviation, as in \"Allan Deviation (ADEV)\" or \"Oven-Controlled Crystal \
Oscillator (OCXO)\".\n\
5. Return ONLY the rewritten query string, with no preamble, explanation or \
labels.\n\
\n\
Rewritten Query:"
	)
}

impl SearchService {
	/// LLM rewrite stage. Any failure, or a rewrite that is empty or only a
	/// case change, falls back to the input query.
	pub(crate) async fn llm_rewrite(&self, query: &str) -> String {
		let prompt = build_rewrite_prompt(query);
		let messages = [serde_json::json!({ "role": "user", "content": prompt })];

		match self.providers.llm.complete(&self.cfg.providers.llm, &messages).await {
			Ok(response) => {
				let rewritten = response.trim();

				if rewritten.is_empty() {
					tracing::warn!("Query rewrite returned an empty response, keeping input.");

					return query.to_string();
				}
				if rewritten.to_lowercase() == query.trim().to_lowercase() {
					tracing::debug!("Query rewrite made no substantive change.");

					return query.to_string();
				}

				tracing::debug!(original = %query, rewritten = %rewritten, "Query rewritten.");

				rewritten.to_string()
			},
			Err(err) => {
				tracing::warn!(error = %err, "Query rewrite failed, keeping input.");

				query.to_string()
			},
		}
	}

	/// Run both enhancement stages and record what each one did.
	pub(crate) async fn enhance_query(
		&self,
		original: &str,
		kind: QueryKind,
		history: &[ConversationTurn],
	) -> EnhancementOutcome {
		let after_llm = if self.cfg.enhancement.llm_rewrite {
			self.llm_rewrite(original).await
		} else {
			original.to_string()
		};
		let llm_changed = after_llm.trim().to_lowercase() != original.trim().to_lowercase();
		let mut final_query = after_llm.clone();
		let mut rule_changed = false;

		if self.cfg.enhancement.follow_up_context && kind == QueryKind::FollowUp {
			if let Some(enhanced) = follow_up_context(&final_query, history) {
				rule_changed = enhanced.trim().to_lowercase() != final_query.trim().to_lowercase();
				final_query = enhanced;
			}
		}

		EnhancementOutcome {
			original: original.to_string(),
			after_llm,
			final_query,
			llm_changed,
			rule_changed,
		}
	}
}

/// Rule-based follow-up stage: append up to two salient terms from the
/// previous user query as parenthetical context.
///
/// Only short queries and queries leaning on a pronoun qualify; anything
/// longer is assumed to carry its own context.
pub(crate) fn follow_up_context(query: &str, history: &[ConversationTurn]) -> Option<String> {
	let user_turns: Vec<&str> = history
		.iter()
		.filter(|turn| turn.role == Role::User)
		.map(|turn| turn.content.as_str())
		.collect();
	let [.., previous, _current] = user_turns.as_slice() else {
		return None;
	};
	let query_lower = query.to_lowercase();
	let is_short = query.split_whitespace().count() <= 5;
	let has_pronoun = PRONOUN.is_match(&query_lower);

	if !is_short && !has_pronoun {
		return None;
	}

	let terms = salient_terms(previous);

	if terms.is_empty() {
		tracing::debug!("No usable context terms in the previous query.");

		return None;
	}

	let terms = terms.join(", ");
	let enhanced = if has_pronoun {
		format!("{query} (regarding {terms})")
	} else {
		format!("{query} (in the context of {terms})")
	};

	tracing::debug!(query = %query, enhanced = %enhanced, "Follow-up query enhanced.");

	Some(enhanced)
}

/// Up to two context terms from a query: adjacent significant word pairs
/// first, then single significant words.
fn salient_terms(text: &str) -> Vec<String> {
	let cleaned: String = text
		.to_lowercase()
		.chars()
		.map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
		.collect();
	let words: Vec<&str> = cleaned.split_whitespace().collect();
	let significant =
		|word: &str, min_len: usize| word.len() >= min_len && !STOPWORDS.contains(&word);
	let mut terms: Vec<String> = Vec::new();

	for pair in words.windows(2) {
		if significant(pair[0], 3) && significant(pair[1], 3) {
			terms.push(format!("{} {}", pair[0], pair[1]));
		}
	}
	if terms.len() < 2 {
		for word in &words {
			if significant(word, 4) && !terms.iter().any(|term| term.contains(*word)) {
				terms.push(word.to_string());

				if terms.len() >= 2 {
					break;
				}
			}
		}
	}

	terms.truncate(2);

	terms
}
