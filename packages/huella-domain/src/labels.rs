//! Maps English class labels from the on-device classifier onto the pet vocabularies.

use serde::{Deserialize, Serialize};

use crate::{
	attributes::ExtractedAttributes,
	normalize,
	vocabulary::{self, VocabularyEntry},
};

/// One ranked class guess from an image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
	pub label: String,
	pub probability: f32,
}

/// Species returned when no class label names a known animal.
pub const UNKNOWN_SPECIES: &str = "otro";

// Ordered most-specific first; the first keyword contained in a label wins.
const CATEGORIES: &[(&str, &str, Option<&str>)] = &[
	("golden retriever", "perro", Some("Golden Retriever")),
	("german shepherd", "perro", Some("Pastor Alemán")),
	("labrador", "perro", Some("Labrador")),
	("bulldog", "perro", Some("Bulldog")),
	("poodle", "perro", Some("Caniche")),
	("chihuahua", "perro", Some("Chihuahua")),
	("beagle", "perro", Some("Beagle")),
	("boxer", "perro", Some("Boxer")),
	("dalmatian", "perro", Some("Dálmata")),
	("husky", "perro", Some("Husky Siberiano")),
	("rottweiler", "perro", Some("Rottweiler")),
	("doberman", "perro", Some("Doberman")),
	("schnauzer", "perro", Some("Schnauzer")),
	("cocker spaniel", "perro", Some("Cocker Spaniel")),
	("siamese cat", "gato", Some("Siamés")),
	("persian cat", "gato", Some("Persa")),
	("maine coon", "gato", Some("Maine Coon")),
	("bengal cat", "gato", Some("Bengalí")),
	("domestic cat", "gato", Some("Doméstico")),
	("tabby cat", "gato", None),
	("tabby", "gato", None),
	("parrot", "ave", Some("Loro")),
	("canary", "ave", Some("Canario")),
	("budgerigar", "ave", Some("Periquito")),
	("cockatoo", "ave", Some("Cacatúa")),
	("macaw", "ave", Some("Guacamayo")),
	("hamster", "hamster", None),
	("rabbit", "conejo", None),
	("fish", "pez", None),
	("turtle", "tortuga", None),
	("lizard", "lagarto", None),
	("snake", "serpiente", None),
	("dog", "perro", None),
	("canine", "perro", None),
	("cat", "gato", None),
	("feline", "gato", None),
	("bird", "ave", None),
];

const COLOR_KEYWORDS: &[(&str, &str)] = &[
	("tortoiseshell", vocabulary::TORTOISESHELL_COLOR),
	("calico", vocabulary::TORTOISESHELL_COLOR),
	("tricolor", "tricolor"),
	("bicolor", "bicolor"),
	("black", "negro"),
	("white", "blanco"),
	("brown", "marrón"),
	("gray", "gris"),
	("grey", "gris"),
	("golden", "dorado"),
	("yellow", "amarillo"),
	("orange", "anaranjado"),
	("red", "rojo"),
	("cream", "crema"),
	("tan", "canela"),
	("chocolate", "chocolate"),
	("blue", "azul"),
	("spotted", "manchado"),
	("striped", "atigrado"),
	("tabby", "atigrado"),
];

/// Derives attributes from classifier predictions, most probable first.
///
/// Species comes from the first prediction naming a known animal, breed is kept only when it
/// belongs to that species' breed list, and color comes from the first color keyword found
/// anywhere in the labels. Returns `None` for an empty prediction list.
pub fn attributes_from_predictions(predictions: &[Prediction]) -> Option<ExtractedAttributes> {
	let top = predictions.first()?;
	let matched = predictions
		.iter()
		.find_map(|prediction| category_for(&prediction.label).map(|hit| (prediction, hit)));
	let (species, breed, confidence) = match matched {
		Some((prediction, (species, breed))) => (species, breed, prediction.probability),
		None => (UNKNOWN_SPECIES, None, top.probability),
	};
	let breed = breed
		.and_then(|breed| validate_breed(species, breed))
		.map(str::to_lowercase)
		.unwrap_or_default();
	let color = predictions
		.iter()
		.find_map(|prediction| color_for(&prediction.label))
		.unwrap_or_else(|| normalize::closest_match("", vocabulary::color_list()));

	Some(ExtractedAttributes {
		species: species.to_string(),
		breed,
		color: color.to_string(),
		description: String::new(),
		confidence: Some(confidence.clamp(0.0, 1.0)),
	})
}

fn category_for(label: &str) -> Option<(&'static str, Option<&'static str>)> {
	let label = label.to_lowercase();

	CATEGORIES
		.iter()
		.find(|(keyword, _, _)| label.contains(keyword))
		.map(|(_, species, breed)| (*species, *breed))
}

fn color_for(label: &str) -> Option<&'static str> {
	let label = label.to_lowercase();

	COLOR_KEYWORDS.iter().find(|(keyword, _)| label.contains(keyword)).map(|(_, color)| *color)
}

fn validate_breed(species: &str, breed: &str) -> Option<&'static str> {
	let options: &[VocabularyEntry] = vocabulary::breeds_for(species);

	options.iter().find(|option| normalize::same_value(option.value, breed)).map(|option| option.value)
}
