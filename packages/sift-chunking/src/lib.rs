use std::sync::LazyLock;

use regex::Regex;

use sift_domain::chunk_hash;

// Words and newlines; newlines survive as their own tokens so paragraph
// breaks stay visible to the boundary scan.
static TOKEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\S+|\n").expect("Token pattern must compile."));

// Abbreviations common in technical documents; a trailing period on these is
// not a sentence end.
static ABBREVIATIONS: &[&str] = &[
	"fig.", "eq.", "ref.", "no.", "nos.", "al.", "etc.", "e.g.", "i.e.", "vs.", "v.", "ch.",
	"sec.", "pp.", "ca.", "approx.", "app.", "min.", "max.", "temp.", "vol.", "freq.", "spec.",
	"ver.",
];

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	/// Target tokens per chunk.
	pub chunk_size: usize,
	/// Tokens shared between consecutive chunks.
	pub chunk_overlap: usize,
	/// Fraction of `chunk_size` the boundary may move in either direction.
	pub size_flexibility: f32,
}

impl Default for ChunkingConfig {
	fn default() -> Self {
		Self { chunk_size: 500, chunk_overlap: 75, size_flexibility: 0.15 }
	}
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DocumentChunk {
	pub chunk_number: u32,
	pub total_chunks: u32,
	pub chunk_id: String,
	pub parent_hash: String,
	/// False when the document fit in a single window and was left whole.
	pub is_chunk: bool,
	pub text: String,
}

impl DocumentChunk {
	pub fn hash(&self) -> String {
		chunk_hash(&self.text, &self.parent_hash, self.chunk_number)
	}
}

struct TokenProps {
	is_newline: bool,
	sentence_end: bool,
	soft_break: bool,
}

fn classify(token: &str) -> TokenProps {
	if token == "\n" {
		return TokenProps { is_newline: true, sentence_end: false, soft_break: true };
	}

	let ends_sentence_mark = token.ends_with('.') || token.ends_with('?') || token.ends_with('!');
	let is_numbered_list = token.ends_with('.')
		&& token.len() >= 2
		&& token[..token.len() - 1].bytes().all(|b| b.is_ascii_digit());
	let is_single_letter_abbr = token.len() == 2
		&& token.ends_with('.')
		&& token.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
	let is_abbreviation =
		token.ends_with('.') && ABBREVIATIONS.contains(&token.to_lowercase().as_str());
	let sentence_end =
		ends_sentence_mark && !is_numbered_list && !is_single_letter_abbr && !is_abbreviation;
	let is_section_break = token.len() >= 3 && token.chars().all(|c| matches!(c, '-' | '=' | '*'));
	let soft_break = token.ends_with(';') || token.ends_with(':') || is_section_break;

	TokenProps { is_newline: false, sentence_end, soft_break }
}

/// Best chunk boundary within `[min_idx, max_idx)`, by preference: paragraph
/// break, sentence end followed by an uppercase word or newline, then any
/// newline, semicolon, colon or section break.
fn find_best_boundary(
	tokens: &[&str],
	props: &[TokenProps],
	min_idx: usize,
	max_idx: usize,
) -> Option<usize> {
	let min_idx = min_idx.min(max_idx);
	let hard_cap = max_idx.min(tokens.len().saturating_sub(1));

	for i in min_idx..hard_cap {
		if props[i].is_newline && props[i + 1].is_newline {
			return Some(i + 2);
		}
	}

	for i in min_idx..hard_cap {
		if !props[i].sentence_end {
			continue;
		}

		let next_starts_sentence = props[i + 1].is_newline
			|| tokens[i + 1].chars().next().is_some_and(char::is_uppercase);

		if next_starts_sentence {
			return Some(i + 1);
		}
	}

	for i in min_idx..max_idx.min(tokens.len()) {
		if props[i].soft_break {
			return Some(i + 1);
		}
	}

	None
}

fn rejoin(tokens: &[&str]) -> String {
	tokens.join(" ").replace(" \n ", "\n").replace("\n ", "\n")
}

/// Split a document into overlapping chunks along natural boundaries.
///
/// Documents at or under `chunk_size` tokens come back whole as a single
/// non-chunk entry.
pub fn split_document(text: &str, parent_hash: &str, cfg: &ChunkingConfig) -> Vec<DocumentChunk> {
	let tokens: Vec<&str> = TOKEN.find_iter(text).map(|m| m.as_str()).collect();

	if tokens.len() <= cfg.chunk_size {
		return vec![DocumentChunk {
			chunk_number: 1,
			total_chunks: 1,
			chunk_id: parent_hash.to_string(),
			parent_hash: parent_hash.to_string(),
			is_chunk: false,
			text: text.to_string(),
		}];
	}

	let props: Vec<TokenProps> = tokens.iter().map(|token| classify(token)).collect();
	let mut chunks = Vec::new();
	let mut start_idx = 0;
	// Degenerate boundary choices could otherwise stall the scan.
	let max_iterations = tokens.len() * 2;
	let mut iterations = 0;

	while start_idx < tokens.len() && iterations < max_iterations {
		iterations += 1;

		let target_end = (start_idx + cfg.chunk_size).min(tokens.len());
		let slack_down = (cfg.chunk_size as f32 * (1.0 - cfg.size_flexibility)) as usize;
		let slack_up = (cfg.chunk_size as f32 * (1.0 + cfg.size_flexibility)) as usize;
		let min_end = (start_idx + slack_down).max(start_idx + 1);
		let max_end = (start_idx + slack_up).min(tokens.len());
		let min_end = min_end.min(max_end);
		let end_idx = if target_end >= tokens.len().saturating_sub(cfg.chunk_overlap) {
			// Close enough to the end; take everything remaining.
			tokens.len()
		} else {
			find_best_boundary(&tokens, &props, min_end, max_end).unwrap_or(target_end)
		};
		let end_idx = end_idx.min(tokens.len());
		let chunk_tokens = &tokens[start_idx..end_idx];

		if chunk_tokens.is_empty() {
			start_idx = (end_idx + 1).min(tokens.len());

			continue;
		}

		let chunk_number = chunks.len() as u32 + 1;

		chunks.push(DocumentChunk {
			chunk_number,
			total_chunks: 0,
			chunk_id: format!("{parent_hash}_{chunk_number}"),
			parent_hash: parent_hash.to_string(),
			is_chunk: true,
			text: rejoin(chunk_tokens),
		});

		if end_idx == tokens.len() {
			break;
		}

		let mut next_start = end_idx.saturating_sub(cfg.chunk_overlap);

		if next_start <= start_idx {
			next_start = start_idx + cfg.chunk_size / 2;
		}

		start_idx = next_start;
	}

	let total = chunks.len() as u32;

	for chunk in &mut chunks {
		chunk.total_chunks = total;
	}

	chunks
}
