use std::sync::Arc;

use serde_json::json;

use crate::acceptance::{
	IDENTIFICATION_MODEL, MemoryImages, SpyVision, pet, photo, test_config,
};
use huella_service::{FindMatchesRequest, HuellaService, PipelineStage, Providers, SearchPath};
use huella_storage::{db::Db, queries};
use huella_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set HUELLA_PG_DSN to run."]
async fn finds_matches_against_postgres() {
	let Some(base_dsn) = huella_testkit::env_dsn() else {
		eprintln!("Skipping finds_matches_against_postgres; set HUELLA_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let exact = pet("mishi", "gato", Some("Siamés"), Some("blanco"));
	let other = pet("pelusa", "gato", Some("Persa"), Some("gris"));
	let dog = pet("firulais", "perro", Some("Labrador"), Some("negro"));

	for record in [&exact, &other, &dog] {
		queries::insert_pet(&db, record).await.expect("Failed to insert pet.");
	}

	queries::insert_photo(&db, &photo(exact.id, "https://photos.test/mishi-1.jpg", true))
		.await
		.expect("Failed to insert photo.");

	let vision = SpyVision::default().respond(
		IDENTIFICATION_MODEL,
		json!({ "species": "gato", "breed": "siamés", "color": "blanco" }),
	);
	let service = HuellaService::with_providers(
		cfg,
		Arc::new(db),
		Providers::new(Arc::new(vision), Arc::new(MemoryImages::default())),
	);

	service.ping().await.expect("Ping failed.");

	let session = service
		.find_matches(FindMatchesRequest {
			image_url: "https://photos.test/query.jpg".to_string(),
			use_visual_comparison: false,
		})
		.await
		.expect("Pipeline must not fail.");

	assert_eq!(session.stage, PipelineStage::Done);
	assert_eq!(session.search_path, Some(SearchPath::Relevance));
	assert_eq!(session.candidates.len(), 2);
	assert_eq!(session.candidates[0].pet.id, exact.id);
	assert!(session.candidates.iter().all(|candidate| candidate.pet.species == "gato"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
