use std::sync::Arc;

use serde_json::{Value, json};

use crate::acceptance::{
	COMPARISON_MODEL, MemoryImages, MemoryStore, SpyVision, image_urls, service, text_parts,
};
use huella_service::{CandidateImage, CompareRequest, Error};

const QUERY_URL: &str = "https://photos.test/query.jpg";

fn candidates(count: usize) -> Vec<CandidateImage> {
	(0..count)
		.map(|index| CandidateImage {
			pet_id: format!("pet-{index}"),
			image_url: format!("https://photos.test/pet-{index}.jpg"),
		})
		.collect()
}

fn answer_for(candidates: &[CandidateImage]) -> Value {
	let comparisons = candidates
		.iter()
		.map(|candidate| {
			json!({
				"petId": candidate.pet_id,
				"similarityScore": 70,
				"confidence": 0.7,
				"justification": "Mismo patrón de manchas.",
			})
		})
		.collect::<Vec<_>>();

	json!({ "comparisons": comparisons })
}

#[tokio::test]
async fn batches_are_capped_at_ten_images() {
	let requested = candidates(12);
	let vision = Arc::new(SpyVision::default().respond(COMPARISON_MODEL, answer_for(&requested)));
	let service = service(MemoryStore::default(), vision.clone(), MemoryImages::default());
	let response = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: requested,
		})
		.await
		.expect("Comparison failed.");

	assert_eq!(response.comparisons.len(), 10);
	assert!(
		response
			.comparisons
			.iter()
			.all(|result| result.pet_id != "pet-10" && result.pet_id != "pet-11")
	);

	let calls = vision.calls_for(COMPARISON_MODEL);

	assert_eq!(calls.len(), 1);

	let urls = image_urls(&calls[0]);

	assert_eq!(urls.len(), 11);
	assert_eq!(urls[0], QUERY_URL);
	assert_eq!(urls[10], "https://photos.test/pet-9.jpg");

	let texts = text_parts(&calls[0]);
	let legend = texts.last().expect("Legend must be the last part.");

	assert!(legend.starts_with("Pet IDs in order: pet-0, pet-1"));
	assert!(legend.ends_with("pet-9"));
	assert!(texts[0].contains("Las siguientes 10 imágenes"));
}

#[tokio::test]
async fn results_are_sanitized() {
	let vision = SpyVision::default().respond(
		COMPARISON_MODEL,
		json!({
			"comparisons": [
				{
					"petId": "pet-0",
					"similarityScore": "muy alta",
					"confidence": "0.4",
					"justification": "Orejas similares.",
					"contact_phone": "+54 11 5555-0000",
					"breedGuess": "siamés",
				},
				{ "petId": "pet-1", "similarityScore": -20, "confidence": 0.9 },
			]
		}),
	);
	let service = service(MemoryStore::default(), Arc::new(vision), MemoryImages::default());
	let response = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: candidates(2),
		})
		.await
		.expect("Comparison failed.");
	let first = &response.comparisons[0];

	assert_eq!(first.pet_id, "pet-0");
	assert_eq!(first.similarity_score, 0.0);
	assert_eq!(first.confidence, 0.4);
	assert_eq!(first.justification, "Orejas similares.");
	assert!(!first.extra.contains_key("contact_phone"));
	assert_eq!(first.extra.get("breedGuess"), Some(&json!("siamés")));
	assert_eq!(response.comparisons[1].similarity_score, 0.0);
	assert_eq!(response.comparisons[1].justification, "");
}

#[tokio::test]
async fn invalid_requests_never_reach_the_model() {
	let vision = Arc::new(SpyVision::default());
	let service = service(MemoryStore::default(), vision.clone(), MemoryImages::default());
	let no_candidates = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: Vec::new(),
		})
		.await;
	let no_query = service
		.compare_images(CompareRequest {
			search_image: String::new(),
			candidate_images: candidates(1),
		})
		.await;
	let blank_url = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: vec![CandidateImage {
				pet_id: "pet-0".to_string(),
				image_url: " ".to_string(),
			}],
		})
		.await;

	assert!(matches!(no_candidates, Err(Error::Validation { .. })));
	assert!(matches!(no_query, Err(Error::Validation { .. })));
	assert!(matches!(blank_url, Err(Error::Validation { .. })));
	assert!(vision.calls_for(COMPARISON_MODEL).is_empty());
}

#[tokio::test]
async fn provider_failures_surface_as_external_errors() {
	let service =
		service(MemoryStore::default(), Arc::new(SpyVision::default()), MemoryImages::default());
	let result = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: candidates(3),
		})
		.await;

	assert!(matches!(result, Err(Error::ExternalService { .. })));
}

#[tokio::test]
async fn output_without_comparisons_is_malformed() {
	let vision = SpyVision::default().respond(COMPARISON_MODEL, json!({ "matches": [] }));
	let service = service(MemoryStore::default(), Arc::new(vision), MemoryImages::default());
	let result = service
		.compare_images(CompareRequest {
			search_image: QUERY_URL.to_string(),
			candidate_images: candidates(1),
		})
		.await;

	assert!(matches!(result, Err(Error::MalformedResponse { .. })));
}
