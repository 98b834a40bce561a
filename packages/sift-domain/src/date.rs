use time::{
	Date, OffsetDateTime, PrimitiveDateTime,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};

const DATE_ONLY: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const DATE_TIME: &[BorrowedFormatItem<'_>] =
	format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Parse a metadata date string.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and bare `YYYY-MM-DD`; naive values
/// are assumed to be UTC. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<OffsetDateTime> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}
	if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
		return Some(parsed);
	}
	if let Ok(parsed) = PrimitiveDateTime::parse(trimmed, DATE_TIME) {
		return Some(parsed.assume_utc());
	}

	Date::parse(trimmed, DATE_ONLY).ok().map(|date| date.midnight().assume_utc())
}

/// Whole days elapsed between `date` and `now`; negative for future dates.
pub fn age_days(date: OffsetDateTime, now: OffsetDateTime) -> f32 {
	(now - date).whole_days() as f32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_rfc3339_and_naive_forms() {
		assert!(parse_date("2024-06-01T12:00:00Z").is_some());
		assert!(parse_date("2024-06-01 12:00:00").is_some());
		assert!(parse_date("2024-06-01").is_some());
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_date("").is_none());
		assert!(parse_date("yesterday").is_none());
		assert!(parse_date("01/06/2024").is_none());
	}

	#[test]
	fn age_counts_whole_days() {
		let date = parse_date("2024-06-01").unwrap();
		let now = parse_date("2024-06-11").unwrap();

		assert_eq!(age_days(date, now), 10.0);
	}
}
