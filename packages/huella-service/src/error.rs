pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	Validation { message: String, field: Option<String> },
	#[error("External service error: {message}")]
	ExternalService { message: String },
	#[error("Malformed response: {message}")]
	MalformedResponse { message: String },
	#[error("Data store error: {message}")]
	DataStore { message: String },
}
impl Error {
	pub(crate) fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into(), field: None }
	}

	pub(crate) fn invalid_field(field: &str, message: impl Into<String>) -> Self {
		Self::Validation { message: message.into(), field: Some(field.to_string()) }
	}
}

impl From<huella_storage::Error> for Error {
	fn from(err: huella_storage::Error) -> Self {
		match err {
			huella_storage::Error::Sqlx(_) =>
				Self::DataStore { message: "Pet store query failed.".to_string() },
			huella_storage::Error::InvalidArgument(message) =>
				Self::Validation { message, field: None },
		}
	}
}

impl From<huella_providers::Error> for Error {
	fn from(err: huella_providers::Error) -> Self {
		use huella_providers::Error as ProviderError;

		match err {
			ProviderError::SerdeJson(_) => Self::MalformedResponse {
				message: "Model output is not valid JSON.".to_string(),
			},
			ProviderError::InvalidResponse { message } => Self::MalformedResponse { message },
			ProviderError::Status { status, .. } => Self::ExternalService {
				message: format!("Vision provider answered with status {status}."),
			},
			ProviderError::Reqwest(inner) if inner.is_timeout() => Self::ExternalService {
				message: "Vision provider timed out.".to_string(),
			},
			ProviderError::Reqwest(_) => Self::ExternalService {
				message: "Vision provider is unreachable.".to_string(),
			},
			ProviderError::InvalidHeaderName(_)
			| ProviderError::InvalidHeaderValue(_)
			| ProviderError::InvalidConfig { .. } => Self::ExternalService {
				message: "Vision provider request could not be built.".to_string(),
			},
			ProviderError::TooLarge { .. } => Self::ExternalService {
				message: "Image exceeds the download limit.".to_string(),
			},
			ProviderError::Image(_) | ProviderError::Base64(_) => Self::ExternalService {
				message: "Image could not be prepared for the vision provider.".to_string(),
			},
		}
	}
}
