pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error(transparent)]
	Image(#[from] image::ImageError),
	#[error(transparent)]
	Base64(#[from] base64::DecodeError),
	#[error("Provider answered with status {status}.")]
	Status { status: u16, body: String },
	#[error("Image exceeds the {limit} byte fetch limit.")]
	TooLarge { limit: u64 },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
