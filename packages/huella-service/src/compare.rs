//! Pairwise visual comparison of a query photo against candidate photos.

use std::collections::HashSet;

use futures::future;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use huella_domain::{ComparisonResult, comparison};
use huella_providers::chat;

use crate::{Error, HuellaService, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateImage {
	pub pet_id: String,
	pub image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
	pub search_image: String,
	pub candidate_images: Vec<CandidateImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareResponse {
	pub comparisons: Vec<ComparisonResult>,
}

pub fn build_prompt(candidate_count: usize) -> String {
	format!(
		"\
Eres un experto en comparación de imágenes de mascotas. Tu tarea es comparar una imagen de \
referencia con varias imágenes candidatas y determinar si muestran al mismo animal.

La primera imagen es la imagen de referencia de una mascota perdida o encontrada.
Las siguientes {candidate_count} imágenes son candidatas para comparar.

Para cada imagen candidata, proporciona:
1. Un porcentaje de similitud (0-100%) que representa cuán probable es que muestre al mismo animal
2. Un nivel de confianza (0-1) para tu evaluación
3. Una breve justificación de tu evaluación basada en características físicas específicas

Analiza detalles como:
- Patrones de pelaje/plumaje y color
- Marcas distintivas o características físicas únicas
- Forma del cuerpo, tamaño y proporciones
- Características faciales como forma de ojos, nariz, etc.
- Ten en cuenta que la iluminación, ángulo y calidad de la imagen pueden variar

Formatea tu respuesta estrictamente como un objeto JSON con la siguiente estructura:
{{
  \"comparisons\": [
    {{
      \"petId\": \"ID de la mascota candidata\",
      \"similarityScore\": número entre 0 y 100,
      \"confidence\": número entre 0 y 1,
      \"justification\": \"breve explicación\"
    }}
  ]
}}

Devuelve SOLO el objeto JSON, sin texto o explicaciones adicionales."
	)
}

/// One user message: prompt, query image, candidate images in order, then the id legend.
pub fn build_messages(query_ref: &str, candidates: &[CandidateImage]) -> Vec<Value> {
	let mut parts = Vec::with_capacity(candidates.len() + 3);

	parts.push(chat::text_part(build_prompt(candidates.len())));
	parts.push(chat::image_part(query_ref));
	parts.extend(candidates.iter().map(|candidate| chat::image_part(candidate.image_url.as_str())));

	let ids = candidates.iter().map(|candidate| candidate.pet_id.as_str()).collect::<Vec<_>>();

	parts.push(chat::text_part(format!("Pet IDs in order: {}", ids.join(", "))));

	vec![chat::user_message(parts)]
}

/// Sanitized results for the requested ids, never more than `image_count` entries.
pub fn parse_comparisons(
	raw: &Value,
	requested: &HashSet<String>,
	contact_marker: &str,
	image_count: usize,
) -> Result<Vec<ComparisonResult>> {
	let Some(entries) = raw.get("comparisons").and_then(Value::as_array) else {
		return Err(Error::MalformedResponse {
			message: "Model output has no comparisons array.".to_string(),
		});
	};
	let mut results = comparison::sanitize_entries(entries, requested, contact_marker);

	if results.len() < entries.len() {
		tracing::warn!(
			returned = entries.len(),
			kept = results.len(),
			"Dropped comparison entries for unknown pets."
		);
	}

	results.truncate(image_count);

	Ok(results)
}

impl HuellaService {
	pub async fn compare_images(&self, req: CompareRequest) -> Result<CompareResponse> {
		crate::require_text(&req.search_image, "search_image")?;

		if req.candidate_images.is_empty() {
			return Err(Error::invalid_field(
				"candidate_images",
				"candidate_images must not be empty.",
			));
		}

		for candidate in &req.candidate_images {
			crate::require_text(&candidate.pet_id, "candidate_images.pet_id")?;
			crate::require_text(&candidate.image_url, "candidate_images.image_url")?;
		}

		let comparisons =
			self.compare_candidates(req.search_image.trim(), &req.candidate_images).await?;

		Ok(CompareResponse { comparisons })
	}

	pub(crate) async fn compare_candidates(
		&self,
		query_ref: &str,
		candidates: &[CandidateImage],
	) -> Result<Vec<ComparisonResult>> {
		let settings = &self.cfg.comparison;
		let limit = settings.max_images.min(huella_config::MAX_COMPARISON_IMAGES) as usize;
		let batch = &candidates[..candidates.len().min(limit)];

		if batch.len() < candidates.len() {
			tracing::info!(
				requested = candidates.len(),
				compared = batch.len(),
				"Comparison batch truncated."
			);
		}

		let (query_prepared, batch_prepared) = future::join(
			self.prepare_image(query_ref),
			future::join_all(batch.iter().map(|candidate| async move {
				CandidateImage {
					pet_id: candidate.pet_id.clone(),
					image_url: self.prepare_image(&candidate.image_url).await,
				}
			})),
		)
		.await;
		let messages = build_messages(&query_prepared, &batch_prepared);
		let cfg = &self.cfg.providers.comparison;
		let raw = self.providers.vision.complete(cfg, &messages).await.map_err(|err| {
			tracing::warn!(error = ?err, model = %cfg.model, "Visual comparison call failed.");

			Error::from(err)
		})?;
		let requested =
			batch.iter().map(|candidate| candidate.pet_id.clone()).collect::<HashSet<_>>();
		let results =
			parse_comparisons(&raw, &requested, &settings.contact_key_marker, batch.len())
				.inspect_err(|err| {
					tracing::warn!(error = %err, raw = %raw, "Visual comparison output unusable.");
				})?;

		tracing::info!(images = batch.len(), results = results.len(), "Visual comparison finished.");

		Ok(results)
	}
}
