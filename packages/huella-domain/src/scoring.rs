//! Attribute scoring for search candidates.
//!
//! Two scorers exist. The relevance scorer trusts the store's ranking and only decays a score
//! by position; the attribute scorer is used when the relevance query is unavailable and
//! weighs species, breed and color agreement directly.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{attributes::ExtractedAttributes, normalize};

pub const RELEVANCE_TOP_SCORE: f64 = 95.0;
pub const RELEVANCE_DECAY_SPAN: f64 = 55.0;
pub const RELEVANCE_FLOOR_SCORE: f64 = 40.0;

pub const SPECIES_WEIGHT: i32 = 50;
/// Applied instead of the species weight when species disagree. The fallback path only scans
/// records of the extracted species, so this is unreachable there.
pub const SPECIES_MISMATCH_BASELINE: i32 = 10;
pub const BREED_EXACT_WEIGHT: i32 = 30;
pub const BREED_PARTIAL_WEIGHT: i32 = 15;
pub const COLOR_EXACT_WEIGHT: i32 = 20;
pub const COLOR_PARTIAL_WEIGHT: i32 = 10;

pub const JITTER_SPAN: i32 = 5;
pub const FALLBACK_SCORE_RANGE: RangeInclusive<i32> = 10..=95;
pub const FALLBACK_MIN_SCORE: u8 = 20;

/// Neutral score range used by the basic search, which has no attributes to compare.
pub const BASIC_SCORE_RANGE: RangeInclusive<u8> = 30..=80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchReason {
	#[serde(rename = "especie")]
	Species,
	#[serde(rename = "raza")]
	Breed,
	#[serde(rename = "raza similar")]
	SimilarBreed,
	#[serde(rename = "color")]
	Color,
	#[serde(rename = "color similar")]
	SimilarColor,
	#[serde(rename = "características similares")]
	SimilarCharacteristics,
}
impl MatchReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Species => "especie",
			Self::Breed => "raza",
			Self::SimilarBreed => "raza similar",
			Self::Color => "color",
			Self::SimilarColor => "color similar",
			Self::SimilarCharacteristics => "características similares",
		}
	}
}

/// The matchable fields of a stored pet. Breed and color may be missing on legacy records.
#[derive(Debug, Clone, Copy)]
pub struct PetTraits<'a> {
	pub species: &'a str,
	pub breed: Option<&'a str>,
	pub color: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeScore {
	pub points: i32,
	pub reasons: Vec<MatchReason>,
}

/// Position-decayed score for the `index`-th of `total` relevance-ranked results.
///
/// `max(95 - 55 * index / total, 40)`, rounded.
pub fn relevance_score(index: usize, total: usize) -> u8 {
	if total == 0 {
		return RELEVANCE_TOP_SCORE as u8;
	}

	let raw = RELEVANCE_TOP_SCORE - RELEVANCE_DECAY_SPAN * index as f64 / total as f64;

	raw.max(RELEVANCE_FLOOR_SCORE).round().clamp(0.0, 100.0) as u8
}

/// Reasons attached to a relevance result. Exact and partial agreement share one tag per
/// attribute; records with no agreeing attribute still get a generic tag.
pub fn relevance_reasons(pet: PetTraits<'_>, attrs: &ExtractedAttributes) -> Vec<MatchReason> {
	let mut reasons = Vec::new();

	if normalize::same_value(pet.species, &attrs.species) {
		reasons.push(MatchReason::Species);
	}
	if pet.breed.is_some_and(|breed| loosely_equal(breed, &attrs.breed)) {
		reasons.push(MatchReason::Breed);
	}
	if pet.color.is_some_and(|color| loosely_equal(color, &attrs.color)) {
		reasons.push(MatchReason::Color);
	}
	if reasons.is_empty() {
		reasons.push(MatchReason::SimilarCharacteristics);
	}

	reasons
}

/// Unjittered attribute score for the fallback path.
pub fn attribute_score(pet: PetTraits<'_>, attrs: &ExtractedAttributes) -> AttributeScore {
	let mut points = 0;
	let mut reasons = Vec::new();

	if normalize::same_value(pet.species, &attrs.species) {
		points += SPECIES_WEIGHT;

		reasons.push(MatchReason::Species);
	} else {
		points += SPECIES_MISMATCH_BASELINE;
	}

	if let Some(breed) = pet.breed.filter(|breed| has_text(breed) && has_text(&attrs.breed)) {
		if normalize::same_value(breed, &attrs.breed) {
			points += BREED_EXACT_WEIGHT;

			reasons.push(MatchReason::Breed);
		} else if normalize::overlaps(breed, &attrs.breed) {
			points += BREED_PARTIAL_WEIGHT;

			reasons.push(MatchReason::SimilarBreed);
		}
	}
	if let Some(color) = pet.color.filter(|color| has_text(color) && has_text(&attrs.color)) {
		if normalize::same_value(color, &attrs.color) {
			points += COLOR_EXACT_WEIGHT;

			reasons.push(MatchReason::Color);
		} else if normalize::overlaps(color, &attrs.color) {
			points += COLOR_PARTIAL_WEIGHT;

			reasons.push(MatchReason::SimilarColor);
		}
	}

	AttributeScore { points, reasons }
}

/// Applies a jitter (itself bounded to +/-5) and clamps into the fallback range.
pub fn jittered_score(points: i32, jitter: i32) -> u8 {
	let jitter = jitter.clamp(-JITTER_SPAN, JITTER_SPAN);

	(points + jitter).clamp(*FALLBACK_SCORE_RANGE.start(), *FALLBACK_SCORE_RANGE.end()) as u8
}

pub fn passes_fallback_threshold(score: u8) -> bool {
	score >= FALLBACK_MIN_SCORE
}

fn loosely_equal(stored: &str, extracted: &str) -> bool {
	has_text(stored)
		&& has_text(extracted)
		&& (normalize::same_value(stored, extracted) || normalize::overlaps(stored, extracted))
}

fn has_text(value: &str) -> bool {
	!value.trim().is_empty()
}
