use huella_providers::media;

use crate::HuellaService;

impl HuellaService {
	/// The reference to hand a vision model for `reference`.
	///
	/// Oversized images become a compressed JPEG data URI. Anything that goes wrong while
	/// fetching or re-encoding falls back to the original reference.
	pub(crate) async fn prepare_image(&self, reference: &str) -> String {
		let images = &self.cfg.images;
		let bytes = match self
			.providers
			.images
			.fetch(reference, images.fetch_timeout_ms, images.max_fetch_bytes)
			.await
		{
			Ok(bytes) => bytes,
			Err(err) => {
				tracing::warn!(error = %err, "Image fetch failed. Sending the original reference.");

				return reference.to_string();
			},
		};

		match media::inline_reference(reference, &bytes, images) {
			Ok(prepared) => prepared,
			Err(err) => {
				tracing::warn!(
					error = %err,
					bytes = bytes.len(),
					"Image compression failed. Sending the original reference."
				);

				reference.to_string()
			},
		}
	}
}
