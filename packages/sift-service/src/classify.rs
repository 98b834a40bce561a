use std::sync::LazyLock;

use regex::Regex;

use sift_domain::{ConversationTurn, Role};

/// Whether a query continues the previous topic or opens a new one.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
	NewTopic,
	FollowUp,
}

// Leading phrases that mark a follow-up outright.
const FOLLOW_UP_CUES: &[&str] = &["what about", "how about", "why", "also"];

static PRONOUN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b(it|this|that|these|those|they|them|their)\b")
		.expect("Pronoun pattern must compile.")
});

/// Classify the latest user query against the one before it.
///
/// With fewer than two user turns there is nothing to follow up on, so the
/// query is a new topic by definition.
pub(crate) fn classify_query(history: &[ConversationTurn]) -> QueryKind {
	let user_turns: Vec<&str> = history
		.iter()
		.filter(|turn| turn.role == Role::User)
		.map(|turn| turn.content.as_str())
		.collect();
	let [.., previous, current] = user_turns.as_slice() else {
		return QueryKind::NewTopic;
	};
	let current_lower = current.to_lowercase();

	if FOLLOW_UP_CUES.iter().any(|cue| current_lower.starts_with(cue))
		|| current_lower.trim_end().ends_with('?')
	{
		tracing::debug!(query = %current, "Follow-up detected by linguistic cue.");

		return QueryKind::FollowUp;
	}
	if PRONOUN.is_match(&current_lower) {
		tracing::debug!(query = %current, "Follow-up detected by pronoun reference.");

		return QueryKind::FollowUp;
	}

	let current_keywords = keywords(current);
	let previous_keywords = keywords(previous);

	if !current_keywords.is_empty() && !previous_keywords.is_empty() {
		let common =
			current_keywords.iter().filter(|word| previous_keywords.contains(*word)).count();
		let min_len = current_keywords.len().min(previous_keywords.len());
		let overlap = common as f32 / min_len as f32;

		if common >= 2 || overlap >= 0.3 {
			tracing::debug!(
				query = %current,
				common,
				overlap,
				"Follow-up detected by keyword overlap."
			);

			return QueryKind::FollowUp;
		}
	}

	QueryKind::NewTopic
}

/// Significant words: four or more characters once punctuation is stripped.
fn keywords(text: &str) -> Vec<String> {
	let cleaned: String = text
		.to_lowercase()
		.chars()
		.filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
		.collect();

	cleaned.split_whitespace().filter(|word| word.len() >= 4).map(str::to_string).collect()
}
