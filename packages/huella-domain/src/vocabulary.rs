//! Closed vocabularies for species, breeds and colors.
//!
//! `value` is the canonical key stored on pet records and requested from vision models;
//! `label` is the display string. Both are matched case-insensitively.

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct VocabularyEntry {
	pub value: &'static str,
	pub label: &'static str,
}

const fn entry(value: &'static str, label: &'static str) -> VocabularyEntry {
	VocabularyEntry { value, label }
}

pub const SPECIES: &[VocabularyEntry] = &[
	entry("perro", "Perro"),
	entry("gato", "Gato"),
	entry("ave", "Ave"),
	entry("conejo", "Conejo"),
	entry("hamster", "Hámster"),
	entry("pez", "Pez"),
	entry("tortuga", "Tortuga"),
	entry("lagarto", "Lagarto"),
	entry("serpiente", "Serpiente"),
	entry("otro", "Otro"),
];

pub const DOG_BREEDS: &[VocabularyEntry] = &[
	entry("Labrador", "Labrador"),
	entry("Golden Retriever", "Golden Retriever"),
	entry("Pastor Alemán", "Pastor Alemán"),
	entry("Bulldog", "Bulldog"),
	entry("Caniche", "Caniche"),
	entry("Chihuahua", "Chihuahua"),
	entry("Beagle", "Beagle"),
	entry("Boxer", "Boxer"),
	entry("Dálmata", "Dálmata"),
	entry("Husky Siberiano", "Husky Siberiano"),
	entry("Rottweiler", "Rottweiler"),
	entry("Doberman", "Doberman"),
	entry("Schnauzer", "Schnauzer"),
	entry("Cocker Spaniel", "Cocker Spaniel"),
	entry("Mestizo", "Mestizo"),
];

pub const CAT_BREEDS: &[VocabularyEntry] = &[
	entry("Siamés", "Siamés"),
	entry("Persa", "Persa"),
	entry("Maine Coon", "Maine Coon"),
	entry("Bengalí", "Bengalí"),
	entry("Doméstico", "Doméstico"),
	entry("Sphynx", "Sphynx"),
	entry("Ragdoll", "Ragdoll"),
	entry("Angora", "Angora"),
	entry("Abisinio", "Abisinio"),
	entry("Mestizo", "Mestizo"),
];

pub const BIRD_BREEDS: &[VocabularyEntry] = &[
	entry("Canario", "Canario"),
	entry("Loro", "Loro"),
	entry("Periquito", "Periquito"),
	entry("Cacatúa", "Cacatúa"),
	entry("Agapornis", "Agapornis"),
	entry("Guacamayo", "Guacamayo"),
	entry("Ninfa", "Ninfa"),
	entry("Jilguero", "Jilguero"),
];

pub const OTHER_BREEDS: &[VocabularyEntry] =
	&[entry("Común", "Común"), entry("Mestizo", "Mestizo"), entry("Desconocido", "Desconocido")];

pub const COLORS: &[VocabularyEntry] = &[
	entry("negro", "Negro"),
	entry("blanco", "Blanco"),
	entry("marrón", "Marrón"),
	entry("gris", "Gris"),
	entry("dorado", "Dorado"),
	entry("atigrado", "Atigrado"),
	entry("manchado", "Manchado"),
	entry("bicolor", "Bicolor"),
	entry("tricolor", "Tricolor"),
	entry("anaranjado", "Anaranjado"),
	entry("crema", "Crema"),
	entry("canela", "Canela"),
	entry("chocolate", "Chocolate"),
	entry("azul", "Azul"),
	entry("rojo", "Rojo"),
	entry("amarillo", "Amarillo"),
	entry("verde", "Verde"),
];

/// Color value that tortoiseshell and calico coats must always map to.
pub const TORTOISESHELL_COLOR: &str = "tricolor";

pub fn species_list() -> &'static [VocabularyEntry] {
	SPECIES
}

/// Breeds for a species value. Unrecognized species get the generic list.
pub fn breeds_for(species: &str) -> &'static [VocabularyEntry] {
	match species.trim().to_lowercase().as_str() {
		"perro" => DOG_BREEDS,
		"gato" => CAT_BREEDS,
		"ave" => BIRD_BREEDS,
		_ => OTHER_BREEDS,
	}
}

pub fn color_list() -> &'static [VocabularyEntry] {
	COLORS
}

/// Comma-separated `value`s, as embedded in model prompts.
pub fn values_csv(entries: &[VocabularyEntry]) -> String {
	entries.iter().map(|entry| entry.value).collect::<Vec<_>>().join(", ")
}
