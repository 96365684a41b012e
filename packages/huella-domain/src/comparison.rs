//! Sanitizing and reducing pairwise visual comparison output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One (query photo, candidate photo) judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
	pub pet_id: String,
	pub similarity_score: f32,
	pub confidence: f32,
	pub justification: String,
	/// Any other keys the model returned, minus contact-related ones.
	#[serde(default, flatten)]
	pub extra: Map<String, Value>,
}

/// Best visual similarity of one pet across all of its compared photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSimilarity {
	pub pet_id: String,
	pub similarity_score: f32,
	pub confidence: f32,
}

const PET_ID_KEY: &str = "petId";
const SIMILARITY_KEY: &str = "similarityScore";
const CONFIDENCE_KEY: &str = "confidence";
const JUSTIFICATION_KEY: &str = "justification";

/// Numeric coercion for model output: numbers pass, numeric strings parse, anything else is
/// `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
	let number = match value {
		Value::Number(number) => number.as_f64(),
		Value::String(raw) => raw.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
		Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
		_ => None,
	}?;

	number.is_finite().then_some(number)
}

pub fn clamp_similarity(value: Option<f64>) -> f32 {
	value.unwrap_or(0.0).clamp(0.0, 100.0) as f32
}

pub fn clamp_confidence(value: Option<f64>) -> f32 {
	value.unwrap_or(0.0).clamp(0.0, 1.0) as f32
}

/// Drops every key containing `marker`, at any depth of nested objects and arrays.
pub fn strip_contact_keys(entry: &mut Map<String, Value>, marker: &str) {
	entry.retain(|key, _| !key.contains(marker));

	for value in entry.values_mut() {
		strip_nested(value, marker);
	}
}

fn strip_nested(value: &mut Value, marker: &str) {
	match value {
		Value::Object(object) => strip_contact_keys(object, marker),
		Value::Array(items) =>
			for item in items {
				strip_nested(item, marker);
			},
		_ => (),
	}
}

/// Builds sanitized results from raw model entries.
///
/// Entries that are not objects, or whose `petId` was not requested, are dropped. The output
/// therefore never exceeds the number of raw entries that name a requested pet.
pub fn sanitize_entries(
	entries: &[Value],
	requested: &HashSet<String>,
	contact_marker: &str,
) -> Vec<ComparisonResult> {
	let mut out = Vec::new();

	for entry in entries {
		let Some(object) = entry.as_object() else {
			continue;
		};
		let Some(pet_id) = object.get(PET_ID_KEY).and_then(pet_id_text) else {
			continue;
		};

		if !requested.contains(&pet_id) {
			continue;
		}

		let mut extra = object.clone();

		strip_contact_keys(&mut extra, contact_marker);

		let similarity = extra.remove(SIMILARITY_KEY);
		let confidence = extra.remove(CONFIDENCE_KEY);
		let justification = extra.remove(JUSTIFICATION_KEY);

		extra.remove(PET_ID_KEY);

		out.push(ComparisonResult {
			pet_id,
			similarity_score: clamp_similarity(similarity.as_ref().and_then(coerce_number)),
			confidence: clamp_confidence(confidence.as_ref().and_then(coerce_number)),
			justification: justification
				.as_ref()
				.and_then(Value::as_str)
				.map(str::to_string)
				.unwrap_or_default(),
			extra,
		});
	}

	out
}

/// Reduces per-photo results to one signal per pet: the maximum similarity across its photos,
/// with the confidence of that best photo. Output keeps first-appearance order.
pub fn best_similarity_by_pet(results: &[ComparisonResult]) -> Vec<VisualSimilarity> {
	let mut order = Vec::new();
	let mut best: HashMap<&str, (f32, f32)> = HashMap::new();

	for result in results {
		match best.get_mut(result.pet_id.as_str()) {
			Some(current) =>
				if result.similarity_score > current.0 {
					*current = (result.similarity_score, result.confidence);
				},
			None => {
				order.push(result.pet_id.as_str());
				best.insert(result.pet_id.as_str(), (result.similarity_score, result.confidence));
			},
		}
	}

	order
		.into_iter()
		.filter_map(|pet_id| {
			best.get(pet_id).map(|(similarity_score, confidence)| VisualSimilarity {
				pet_id: pet_id.to_string(),
				similarity_score: *similarity_score,
				confidence: *confidence,
			})
		})
		.collect()
}

fn pet_id_text(value: &Value) -> Option<String> {
	match value {
		Value::String(raw) => Some(raw.trim().to_string()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
