use std::{
	collections::HashMap,
	sync::{Arc, atomic::Ordering},
};

use serde_json::json;

use crate::acceptance::{
	COMPARISON_MODEL, IDENTIFICATION_MODEL, MemoryImages, MemoryStore, SpyVision, image_urls, pet,
	photo, service,
};
use huella_domain::MatchReason;
use huella_service::{
	Error, Fallback, FindMatchesRequest, PipelineStage, SearchPath, StageErrorKind,
};

const QUERY_URL: &str = "https://photos.test/query.jpg";

fn siamese_vision() -> SpyVision {
	SpyVision::default().respond(
		IDENTIFICATION_MODEL,
		json!({
			"species": "Gato",
			"breed": "Siames",
			"color": "Blanco",
			"description": "Ojos azules.",
			"confidence": 0.9,
		}),
	)
}

fn request(use_visual_comparison: bool) -> FindMatchesRequest {
	FindMatchesRequest { image_url: QUERY_URL.to_string(), use_visual_comparison }
}

#[tokio::test]
async fn relevance_path_ranks_the_exact_match_first() {
	let exact = pet("mishi", "gato", Some("Siamés"), Some("blanco"));
	let other = pet("pelusa", "gato", Some("Persa"), Some("gris"));
	let store = MemoryStore {
		relevant: Some(vec![exact.clone(), other.clone()]),
		..Default::default()
	};
	let vision = Arc::new(siamese_vision());
	let service = service(store, vision.clone(), MemoryImages::default());
	let session = service.find_matches(request(false)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert_eq!(session.search_path, Some(SearchPath::Relevance));
	assert!(session.errors.is_empty());

	let attributes = session.attributes.as_ref().expect("Attributes must be kept.");

	assert_eq!(attributes.species, "gato");
	assert_eq!(attributes.breed, "siamés");
	assert_eq!(attributes.color, "blanco");
	assert_eq!(session.candidates.len(), 2);
	assert_eq!(session.candidates[0].pet.id, exact.id);
	assert_eq!(session.candidates[0].match_score, 95);
	assert_eq!(
		session.candidates[0].match_reasons,
		vec![MatchReason::Species, MatchReason::Breed, MatchReason::Color]
	);
	assert_eq!(session.candidates[1].pet.id, other.id);
	assert!(session.candidates[1].match_score < 95);
	assert!(vision.calls_for(COMPARISON_MODEL).is_empty());

	let identification = vision.calls_for(IDENTIFICATION_MODEL);

	assert_eq!(identification.len(), 1);
	// The query image is not in the image source, so the original reference is sent.
	assert_eq!(image_urls(&identification[0]), vec![QUERY_URL.to_string()]);
}

#[tokio::test]
async fn relevance_failure_falls_back_to_the_species_scan() {
	let mut scanned = (0..30)
		.map(|index| pet(&format!("gato-{index}"), "gato", Some("Persa"), Some("gris")))
		.collect::<Vec<_>>();
	let exact = pet("mishi", "gato", Some("Siamés"), Some("blanco"));

	scanned.push(exact.clone());
	scanned.push(pet("firulais", "perro", Some("Labrador"), Some("blanco")));

	let store = MemoryStore { relevant: None, by_species: Some(scanned), ..Default::default() };
	let service = service(store, Arc::new(siamese_vision()), MemoryImages::default());
	let session = service.find_matches(request(false)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert_eq!(session.search_path, Some(SearchPath::Fallback));
	assert_eq!(session.candidates.len(), 20);
	assert_eq!(session.candidates[0].pet.id, exact.id);
	assert!(session.candidates[0].match_score >= 90);
	assert!(session.candidates.iter().all(|candidate| candidate.match_score >= 20));
	assert!(session.candidates.iter().all(|candidate| candidate.pet.species == "gato"));
	assert!(
		session
			.candidates
			.windows(2)
			.all(|pair| pair[0].match_score >= pair[1].match_score)
	);
}

#[tokio::test]
async fn search_failure_keeps_the_attributes() {
	let service =
		service(MemoryStore::default(), Arc::new(siamese_vision()), MemoryImages::default());
	let session = service.find_matches(request(false)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Errored);
	assert!(session.is_errored());
	assert!(session.attributes.is_some());
	assert!(session.candidates.is_empty());
	assert_eq!(session.fallback, None);
	assert_eq!(session.errors.len(), 1);
	assert_eq!(session.errors[0].stage, PipelineStage::Searching);
	assert_eq!(session.errors[0].kind, StageErrorKind::DataStore);
	// Driver details never reach the caller.
	assert!(!session.errors[0].message.contains("pool"));
}

#[tokio::test]
async fn extraction_failure_offers_the_basic_search() {
	let store = MemoryStore {
		relevant: Some(vec![pet("mishi", "gato", None, None)]),
		..Default::default()
	};
	let service = service(store, Arc::new(SpyVision::default()), MemoryImages::default());
	let session = service.find_matches(request(true)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Errored);
	assert_eq!(session.fallback, Some(Fallback::BasicSearch));
	assert!(session.attributes.is_none());
	assert!(session.candidates.is_empty());
	assert_eq!(session.errors[0].stage, PipelineStage::Extracting);
	assert_eq!(session.errors[0].kind, StageErrorKind::ExternalService);
	assert!(!session.errors[0].message.contains("upstream unavailable"));
}

#[tokio::test]
async fn unusable_extraction_output_is_malformed() {
	let vision = SpyVision::default().respond(IDENTIFICATION_MODEL, json!({ "species": "gato" }));
	let service = service(MemoryStore::default(), Arc::new(vision), MemoryImages::default());
	let session = service.find_matches(request(false)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Errored);
	assert_eq!(session.errors[0].kind, StageErrorKind::MalformedResponse);
	assert_eq!(session.fallback, Some(Fallback::BasicSearch));
}

#[tokio::test]
async fn visual_overlay_keeps_the_best_photo_and_drops_unknown_pets() {
	let first = pet("mishi", "gato", Some("Siamés"), Some("blanco"));
	let second = pet("pelusa", "gato", Some("Persa"), Some("gris"));
	let first_id = first.id.to_string();
	let second_id = second.id.to_string();
	let photos = HashMap::from([(
		first.id,
		vec![
			photo(first.id, "https://photos.test/mishi-1.jpg", true),
			photo(first.id, "https://photos.test/mishi-2.jpg", false),
		],
	)]);
	let store = MemoryStore {
		relevant: Some(vec![first.clone(), second.clone()]),
		photos,
		..Default::default()
	};
	let vision = siamese_vision().respond(
		COMPARISON_MODEL,
		json!({
			"comparisons": [
				{ "petId": first_id, "similarityScore": 40, "confidence": 0.5, "justification": "a" },
				{ "petId": first_id, "similarityScore": "88", "confidence": 0.8, "justification": "b" },
				{ "petId": "ghost", "similarityScore": 99, "confidence": 1.0, "justification": "c" },
				{ "petId": second_id, "similarityScore": 150, "confidence": 2, "justification": "d" },
			]
		}),
	);
	let vision = Arc::new(vision);
	let service = service(store, vision.clone(), MemoryImages::default());
	let session = service.find_matches(request(true)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert!(session.errors.is_empty());

	let similarity = session.visual_similarity.as_ref().expect("Visual results must be attached.");

	assert_eq!(similarity.len(), 2);
	assert_eq!(similarity[0].pet_id, first_id);
	assert_eq!(similarity[0].similarity_score, 88.0);
	assert_eq!(similarity[0].confidence, 0.8);
	assert_eq!(similarity[1].pet_id, second_id);
	assert_eq!(similarity[1].similarity_score, 100.0);
	assert_eq!(similarity[1].confidence, 1.0);
	assert!(similarity.iter().all(|entry| entry.pet_id != "ghost"));
	// Attribute scores are left as the search produced them.
	assert_eq!(session.candidates[0].match_score, 95);

	let comparison = vision.calls_for(COMPARISON_MODEL);

	assert_eq!(comparison.len(), 1);
	assert_eq!(
		image_urls(&comparison[0]),
		vec![
			QUERY_URL.to_string(),
			"https://photos.test/mishi-1.jpg".to_string(),
			"https://photos.test/mishi-2.jpg".to_string(),
			"https://photos.test/pelusa.jpg".to_string(),
		]
	);
}

#[tokio::test]
async fn photo_lookups_stop_at_the_comparison_limit() {
	let candidates = (0..20)
		.map(|index| pet(&format!("mishi-{index}"), "gato", Some("Siamés"), Some("blanco")))
		.collect::<Vec<_>>();
	let store = MemoryStore { relevant: Some(candidates), ..Default::default() };
	let lookups = store.photo_lookups.clone();
	let vision = Arc::new(siamese_vision().respond(COMPARISON_MODEL, json!({ "comparisons": [] })));
	let service = service(store, vision.clone(), MemoryImages::default());
	let session = service.find_matches(request(true)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert_eq!(session.candidates.len(), 20);
	assert_eq!(lookups.load(Ordering::SeqCst), 10);

	let comparison = vision.calls_for(COMPARISON_MODEL);
	let sent = image_urls(&comparison[0]);

	assert_eq!(sent.len(), 11);
	assert_eq!(sent[0], QUERY_URL);
}

#[tokio::test]
async fn visual_failure_is_recorded_without_losing_candidates() {
	let store = MemoryStore {
		relevant: Some(vec![pet("mishi", "gato", Some("Siamés"), Some("blanco"))]),
		..Default::default()
	};
	let service = service(store, Arc::new(siamese_vision()), MemoryImages::default());
	let session = service.find_matches(request(true)).await.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert_eq!(session.candidates.len(), 1);
	assert_eq!(session.visual_similarity, None);
	assert_eq!(session.errors.len(), 1);
	assert_eq!(session.errors[0].stage, PipelineStage::VisuallyComparing);
	assert_eq!(session.errors[0].kind, StageErrorKind::ExternalService);
}

#[tokio::test]
async fn blank_image_is_rejected() {
	let vision = Arc::new(siamese_vision());
	let service = service(MemoryStore::default(), vision.clone(), MemoryImages::default());
	let result = service
		.find_matches(FindMatchesRequest { image_url: "  ".to_string(), use_visual_comparison: true })
		.await;

	assert!(matches!(result, Err(Error::Validation { .. })));
	assert!(vision.calls_for(IDENTIFICATION_MODEL).is_empty());
}
