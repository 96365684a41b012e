use serde::{Deserialize, Serialize};

use crate::{normalize, vocabulary};

/// Structured description of one photographed pet.
///
/// Species and color always hold a vocabulary `value`. Breed holds the lowercased `value` of
/// the closest breed for that species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedAttributes {
	pub species: String,
	pub breed: String,
	pub color: String,
	pub description: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub confidence: Option<f32>,
}
impl ExtractedAttributes {
	/// Forces free-text values into the closed vocabularies.
	pub fn normalized(
		species: &str,
		breed: &str,
		color: &str,
		description: &str,
		confidence: Option<f64>,
	) -> Self {
		let species = normalize::closest_match(&species.to_lowercase(), vocabulary::species_list());
		let breed = normalize::closest_match(&breed.to_lowercase(), vocabulary::breeds_for(species))
			.to_lowercase();
		let color = normalize::closest_match(&color.to_lowercase(), vocabulary::color_list());

		Self {
			species: species.to_string(),
			breed,
			color: color.to_string(),
			description: description.trim().to_string(),
			confidence: confidence.map(|value| value.clamp(0.0, 1.0) as f32),
		}
	}
}
