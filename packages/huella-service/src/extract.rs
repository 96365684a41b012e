//! Vision attribute extraction: one photo in, normalized species, breed and color out.

use serde::Deserialize;
use serde_json::Value;

use huella_domain::{ExtractedAttributes, comparison, vocabulary};
use huella_providers::chat;

use crate::{Error, HuellaService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifyRequest {
	pub image_url: String,
}

pub fn build_prompt() -> String {
	let species = vocabulary::values_csv(vocabulary::species_list());
	let colors = vocabulary::values_csv(vocabulary::color_list());
	let tricolor = vocabulary::TORTOISESHELL_COLOR;

	format!(
		"\
Eres un experto en identificación de mascotas. Analiza la siguiente imagen de mascota y \
proporciona información detallada.

Para la imagen de mascota proporcionada, identifica los siguientes atributos:
1. Especie (IMPORTANTE: debes elegir SOLAMENTE UNA de estas opciones: {species})
2. Raza (sé específico si es posible, o \"mestizo\" si no está claro)
3. Color (IMPORTANTE: debes elegir SOLAMENTE UNO de estos valores: {colors})
4. Una breve descripción única destacando cualquier característica distintiva
5. Debes basar tu respuesta en la realidad y no en la ficción

Para animales con pelaje carey o calico debes elegir \"{tricolor}\" SIEMPRE, incluso si en la \
imagen solo se ven dos colores.

Formatea tu respuesta estrictamente como un objeto JSON con la siguiente estructura:
{{
  \"species\": \"la especie identificada (usando SOLO los valores permitidos)\",
  \"breed\": \"la raza identificada\",
  \"color\": \"el color identificado (usando SOLO los valores permitidos)\",
  \"description\": \"una breve descripción única de características distintivas\",
  \"confidence\": 0.85
}}

Incluye un valor de confianza entre 0 y 1, donde 1 es máxima confianza.
Devuelve SOLO el objeto JSON, sin texto o explicaciones adicionales."
	)
}

pub fn build_messages(image_ref: &str) -> Vec<Value> {
	vec![chat::user_message(vec![chat::text_part(build_prompt()), chat::image_part(image_ref)])]
}

/// Parses model output into normalized attributes.
///
/// `species`, `breed` and `color` must be strings; `description` and `confidence` are optional.
pub fn parse_attributes(raw: &Value) -> Result<ExtractedAttributes> {
	let species = required_text(raw, "species")?;
	let breed = required_text(raw, "breed")?;
	let color = required_text(raw, "color")?;
	let description = raw.get("description").and_then(Value::as_str).unwrap_or_default();
	let confidence = raw.get("confidence").and_then(comparison::coerce_number);

	Ok(ExtractedAttributes::normalized(species, breed, color, description, confidence))
}

fn required_text<'a>(raw: &'a Value, field: &str) -> Result<&'a str> {
	raw.get(field).and_then(Value::as_str).ok_or_else(|| Error::MalformedResponse {
		message: format!("Model output is missing a text {field} field."),
	})
}

impl HuellaService {
	/// Form auto-fill: attributes for one photo, nothing else.
	pub async fn identify(&self, req: IdentifyRequest) -> Result<ExtractedAttributes> {
		crate::require_text(&req.image_url, "image_url")?;

		self.extract_attributes(req.image_url.trim()).await
	}

	pub(crate) async fn extract_attributes(&self, image_ref: &str) -> Result<ExtractedAttributes> {
		let prepared = self.prepare_image(image_ref).await;
		let messages = build_messages(&prepared);
		let cfg = &self.cfg.providers.identification;
		let raw = self.providers.vision.complete(cfg, &messages).await.map_err(|err| {
			tracing::warn!(error = ?err, model = %cfg.model, "Attribute extraction call failed.");

			Error::from(err)
		})?;
		let attributes = parse_attributes(&raw).inspect_err(|err| {
			tracing::warn!(error = %err, raw = %raw, "Attribute extraction returned unusable output.");
		})?;

		tracing::info!(
			species = %attributes.species,
			breed = %attributes.breed,
			color = %attributes.color,
			"Attributes extracted."
		);

		Ok(attributes)
	}
}
