//! Image fetching and the inline-size policy applied before images reach a vision model.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};
use reqwest::Client;

use crate::{Error, Result};

pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Loads the bytes behind an image reference: a base64 data URI or an HTTP(S) URL.
///
/// Anything larger than `max_bytes` fails with [`Error::TooLarge`]. Remote bodies are read
/// chunk by chunk so an oversized download stops at the limit.
pub async fn fetch(reference: &str, timeout_ms: u64, max_bytes: u64) -> Result<Vec<u8>> {
	if let Some(bytes) = decode_data_uri(reference)? {
		ensure_within(bytes.len() as u64, max_bytes)?;

		return Ok(bytes);
	}

	let client = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;
	let mut res = client.get(reference).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::Status { status: status.as_u16(), body: String::new() });
	}
	if let Some(declared) = res.content_length() {
		ensure_within(declared, max_bytes)?;
	}

	let mut bytes = Vec::new();

	while let Some(chunk) = res.chunk().await? {
		ensure_within((bytes.len() + chunk.len()) as u64, max_bytes)?;

		bytes.extend_from_slice(&chunk);
	}

	Ok(bytes)
}

fn ensure_within(len: u64, max_bytes: u64) -> Result<()> {
	if len > max_bytes {
		return Err(Error::TooLarge { limit: max_bytes });
	}

	Ok(())
}

/// Returns `Ok(None)` for anything that is not a `data:` URI.
pub fn decode_data_uri(reference: &str) -> Result<Option<Vec<u8>>> {
	let Some(rest) = reference.trim().strip_prefix("data:") else {
		return Ok(None);
	};
	let Some((meta, payload)) = rest.split_once(',') else {
		return Err(Error::InvalidResponse { message: "Data URI has no payload.".to_string() });
	};

	if !meta.ends_with(";base64") {
		return Err(Error::InvalidResponse {
			message: "Only base64 data URIs are supported.".to_string(),
		});
	}

	Ok(Some(STANDARD.decode(payload.trim())?))
}

/// Re-encodes images larger than `max_inline_bytes` as JPEG at most `max_width` wide.
///
/// `Ok(None)` means the image is small enough to be sent as-is.
pub fn compress_if_needed(bytes: &[u8], cfg: &huella_config::Images) -> Result<Option<Vec<u8>>> {
	if bytes.len() as u64 <= cfg.max_inline_bytes {
		return Ok(None);
	}

	let decoded = image::load_from_memory(bytes)?;
	let resized = fit_width(decoded, cfg.max_width);
	let mut out = Vec::new();

	JpegEncoder::new_with_quality(&mut out, cfg.jpeg_quality).encode_image(&resized.to_rgb8())?;

	tracing::debug!(
		original_bytes = bytes.len(),
		compressed_bytes = out.len(),
		"Compressed oversized image."
	);

	Ok(Some(out))
}

pub fn to_data_uri(jpeg: &[u8]) -> String {
	format!("{JPEG_DATA_URI_PREFIX}{}", STANDARD.encode(jpeg))
}

/// The reference a model should receive for an image: the original reference when the image is
/// within the inline limit, otherwise a JPEG data URI of the compressed image.
pub fn inline_reference(
	reference: &str,
	bytes: &[u8],
	cfg: &huella_config::Images,
) -> Result<String> {
	Ok(match compress_if_needed(bytes, cfg)? {
		Some(jpeg) => to_data_uri(&jpeg),
		None => reference.to_string(),
	})
}

fn fit_width(image: DynamicImage, max_width: u32) -> DynamicImage {
	if image.width() <= max_width {
		return image;
	}

	let height = (u64::from(image.height()) * u64::from(max_width) / u64::from(image.width()))
		.clamp(1, u64::from(u32::MAX)) as u32;

	image.resize_exact(max_width, height, FilterType::Triangle)
}
