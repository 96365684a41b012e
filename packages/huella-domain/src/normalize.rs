//! Coerces free-text attribute values (usually model output) into a closed vocabulary.
//!
//! This is a heuristic rather than a scored fuzzy match: the first entry that matches wins,
//! so ties resolve to list order.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::vocabulary::VocabularyEntry;

/// Lowercases and strips diacritics so `Siamés`, `SIAMES` and `siames` compare equal.
pub fn fold(text: &str) -> String {
	text.trim().nfd().filter(|c| !is_combining_mark(*c)).flat_map(char::to_lowercase).collect()
}

/// Returns the `value` of the option that best matches `input`.
///
/// Order of preference: exact match on `value`, then a substring match in either direction
/// against `value` or `label`. Empty input and inputs that match nothing resolve to the first
/// option. An empty option list yields an empty string.
pub fn closest_match(input: &str, options: &[VocabularyEntry]) -> &'static str {
	let Some(first) = options.first() else {
		return "";
	};
	let needle = fold(input);

	if needle.is_empty() {
		return first.value;
	}
	if let Some(exact) = options.iter().find(|option| fold(option.value) == needle) {
		return exact.value;
	}

	options
		.iter()
		.find(|option| {
			let value = fold(option.value);
			let label = fold(option.label);

			value.contains(&needle)
				|| needle.contains(&value)
				|| label.contains(&needle)
				|| needle.contains(&label)
		})
		.unwrap_or(first)
		.value
}

/// Case- and accent-insensitive equality.
pub fn same_value(a: &str, b: &str) -> bool {
	fold(a) == fold(b)
}

/// True when both values are non-empty and one contains the other after folding.
pub fn overlaps(a: &str, b: &str) -> bool {
	let a = fold(a);
	let b = fold(b);

	!a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a))
}
