use std::sync::Arc;

use serde_json::json;

use crate::acceptance::{
	IDENTIFICATION_MODEL, MemoryImages, MemoryStore, SpyVision, bmp_of_size, image_urls, service,
};
use huella_providers::media;
use huella_service::IdentifyRequest;

const LARGE_URL: &str = "https://photos.test/large.bmp";
const SMALL_URL: &str = "https://photos.test/small.bmp";

fn vision() -> Arc<SpyVision> {
	Arc::new(SpyVision::default().respond(
		IDENTIFICATION_MODEL,
		json!({ "species": "perro", "breed": "labrador", "color": "negro" }),
	))
}

async fn sent_reference(images: MemoryImages, image_url: &str) -> String {
	let vision = vision();
	let service = service(MemoryStore::default(), vision.clone(), images);

	service
		.identify(IdentifyRequest { image_url: image_url.to_string() })
		.await
		.expect("Identification failed.");

	let calls = vision.calls_for(IDENTIFICATION_MODEL);

	image_urls(&calls[0]).remove(0)
}

#[tokio::test]
async fn oversized_images_are_sent_as_compressed_jpeg() {
	let large = bmp_of_size(2 * 1024 * 1024);

	assert!(large.len() > 1_048_576);

	let sent = sent_reference(MemoryImages::default().with(LARGE_URL, large.clone()), LARGE_URL).await;

	assert!(sent.starts_with(media::JPEG_DATA_URI_PREFIX));

	let jpeg = media::decode_data_uri(&sent)
		.expect("Data URI must decode.")
		.expect("Reference must be a data URI.");
	let decoded = image::load_from_memory(&jpeg).expect("Payload must be an image.");

	assert!(jpeg.len() < large.len());
	assert_eq!(decoded.width(), 800);
}

#[tokio::test]
async fn images_under_the_threshold_keep_their_reference() {
	let small = bmp_of_size(500 * 1024);
	let sent = sent_reference(MemoryImages::default().with(SMALL_URL, small), SMALL_URL).await;

	assert_eq!(sent, SMALL_URL);
}

#[tokio::test]
async fn unreachable_images_keep_their_reference() {
	let sent = sent_reference(MemoryImages::default(), LARGE_URL).await;

	assert_eq!(sent, LARGE_URL);
}

#[tokio::test]
async fn undecodable_large_payloads_keep_their_reference() {
	let garbage = vec![0xAB; 2 * 1024 * 1024];
	let sent = sent_reference(MemoryImages::default().with(LARGE_URL, garbage), LARGE_URL).await;

	assert_eq!(sent, LARGE_URL);
}

#[tokio::test]
async fn images_past_the_fetch_limit_keep_their_reference() {
	let huge = vec![0xAB; 16 * 1024 * 1024 + 1];
	let sent = sent_reference(MemoryImages::default().with(LARGE_URL, huge), LARGE_URL).await;

	assert_eq!(sent, LARGE_URL);
}
