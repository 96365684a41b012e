use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use huella_domain::ExtractedAttributes;
use huella_service::{
	BasicSearchRequest, BasicSearchResponse, CompareRequest, CompareResponse, Error, Fallback,
	FindMatchesRequest, IdentifyRequest, SearchSession, StageErrorKind,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/pets/identify", post(identify))
		.route("/v1/pets/find_matches", post(find_matches))
		.route("/v1/pets/basic_search", post(basic_search))
		.route("/v1/pets/compare", post(compare))
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> StatusCode {
	match state.service.ping().await {
		Ok(()) => StatusCode::OK,
		Err(_) => StatusCode::SERVICE_UNAVAILABLE,
	}
}

async fn identify(
	State(state): State<AppState>,
	Json(payload): Json<IdentifyRequest>,
) -> Result<Json<ExtractedAttributes>, ApiError> {
	let response = state.service.identify(payload).await?;

	Ok(Json(response))
}

/// A session that errored is still returned so the caller keeps whatever was produced. Its
/// status follows the failing stage; an extraction failure also carries the basic search hint.
async fn find_matches(
	State(state): State<AppState>,
	Json(payload): Json<FindMatchesRequest>,
) -> Result<Response, ApiError> {
	let session = state.service.find_matches(payload).await?;

	if !session.is_errored() {
		return Ok(Json(session).into_response());
	}

	let status = session
		.errors
		.last()
		.map(|err| status_for(err.kind))
		.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

	if let Some(fallback) = session.fallback {
		return Err(extraction_failed(status, &session, fallback));
	}

	Ok((status, Json(session)).into_response())
}

async fn basic_search(
	State(state): State<AppState>,
	Json(payload): Json<BasicSearchRequest>,
) -> Result<Json<BasicSearchResponse>, ApiError> {
	let response = state.service.basic_search(payload).await?;

	Ok(Json(response))
}

async fn compare(
	State(state): State<AppState>,
	Json(payload): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
	let response = state.service.compare_images(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	fallback: Option<Fallback>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
	fallback: Option<Fallback>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self {
			status,
			error_code: error_code.into(),
			message: message.into(),
			fields,
			fallback: None,
		}
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::Validation { message, field } => ApiError::new(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				message,
				field.map(|field| vec![field]),
			),
			Error::ExternalService { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "external_service", message, None),
			Error::MalformedResponse { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "malformed_response", message, None),
			Error::DataStore { message } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "data_store", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
			fallback: self.fallback,
		};

		(self.status, Json(body)).into_response()
	}
}

fn status_for(kind: StageErrorKind) -> StatusCode {
	match kind {
		StageErrorKind::Validation => StatusCode::BAD_REQUEST,
		StageErrorKind::ExternalService | StageErrorKind::MalformedResponse =>
			StatusCode::BAD_GATEWAY,
		StageErrorKind::DataStore => StatusCode::SERVICE_UNAVAILABLE,
	}
}

fn extraction_failed(status: StatusCode, session: &SearchSession, fallback: Fallback) -> ApiError {
	let message = session
		.errors
		.last()
		.map(|err| err.message.clone())
		.unwrap_or_else(|| "Attribute extraction failed.".to_string());

	ApiError {
		fallback: Some(fallback),
		..ApiError::new(status, "extraction_failed", message, None)
	}
}
