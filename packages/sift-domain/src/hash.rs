/// Identifying metadata folded into a document hash.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentFields<'a> {
	pub sender: &'a str,
	pub date: &'a str,
	pub subject: &'a str,
	pub url: &'a str,
	pub file_name: &'a str,
}

/// Stable content hash for a whole document.
///
/// The identifying metadata keeps the hash unique even when the content is
/// empty or shared between items.
pub fn document_hash(content: &str, fields: &DocumentFields) -> String {
	let input = format!(
		"{}|{}|{}|{}|{}|{}",
		content.trim(),
		fields.sender.trim(),
		fields.date.trim(),
		fields.subject.trim(),
		fields.url.trim(),
		fields.file_name.trim(),
	);

	blake3::hash(input.as_bytes()).to_hex().to_string()
}

/// Stable hash for one chunk of a document.
pub fn chunk_hash(text: &str, parent_hash: &str, chunk_number: u32) -> String {
	let input = format!("{}|{parent_hash}|{chunk_number}", text.trim());

	blake3::hash(input.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn metadata_disambiguates_identical_content() {
		let a = DocumentFields { subject: "Re: GPSDO drift", ..Default::default() };
		let b = DocumentFields { subject: "Re: OCXO aging", ..Default::default() };

		assert_ne!(document_hash("same body", &a), document_hash("same body", &b));
	}

	#[test]
	fn hash_ignores_surrounding_whitespace() {
		let fields = DocumentFields::default();

		assert_eq!(document_hash("  body  ", &fields), document_hash("body", &fields));
	}

	#[test]
	fn chunk_hash_varies_with_position() {
		assert_ne!(chunk_hash("text", "parent", 1), chunk_hash("text", "parent", 2));
	}
}
