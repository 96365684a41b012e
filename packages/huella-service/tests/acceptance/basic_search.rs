use std::sync::Arc;

use crate::acceptance::{MemoryImages, MemoryStore, SpyVision, pet, service};
use huella_service::{BasicSearchRequest, Error};

fn request() -> BasicSearchRequest {
	BasicSearchRequest { image_url: "https://photos.test/query.jpg".to_string() }
}

#[tokio::test]
async fn lists_a_neutral_sample() {
	let sample = (0..60).map(|index| pet(&format!("p{index}"), "perro", None, None)).collect();
	let store = MemoryStore { sample: Some(sample), ..Default::default() };
	let vision = Arc::new(SpyVision::default());
	let service = service(store, vision.clone(), MemoryImages::default());
	let response = service.basic_search(request()).await.expect("Basic search failed.");

	assert_eq!(response.items.len(), 50);
	assert!(response.items.iter().all(|item| (30..=80).contains(&item.match_score)));
	assert!(response.items.iter().all(|item| item.match_reasons.is_empty()));
	assert!(response.items.windows(2).all(|pair| pair[0].match_score >= pair[1].match_score));
}

#[tokio::test]
async fn store_outage_is_a_data_store_error() {
	let service =
		service(MemoryStore::default(), Arc::new(SpyVision::default()), MemoryImages::default());

	assert!(matches!(service.basic_search(request()).await, Err(Error::DataStore { .. })));
}

#[tokio::test]
async fn blank_image_is_rejected() {
	let store = MemoryStore { sample: Some(Vec::new()), ..Default::default() };
	let service = service(store, Arc::new(SpyVision::default()), MemoryImages::default());
	let result = service.basic_search(BasicSearchRequest { image_url: String::new() }).await;

	assert!(matches!(result, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn ping_reports_store_health() {
	let online = MemoryStore { sample: Some(Vec::new()), ..Default::default() };
	let online = service(online, Arc::new(SpyVision::default()), MemoryImages::default());
	let offline =
		service(MemoryStore::default(), Arc::new(SpyVision::default()), MemoryImages::default());

	assert!(online.ping().await.is_ok());
	assert!(matches!(offline.ping().await, Err(Error::DataStore { .. })));
}
