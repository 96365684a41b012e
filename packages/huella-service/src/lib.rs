pub mod compare;
pub mod extract;
pub mod pipeline;
pub mod search;
pub mod time_serde;

mod error;
mod images;

pub use compare::{CandidateImage, CompareRequest, CompareResponse};
pub use error::{Error, Result};
pub use extract::IdentifyRequest;
pub use huella_providers::BoxFuture;
pub use pipeline::{
	BasicSearchRequest, BasicSearchResponse, Fallback, FindMatchesRequest, PipelineStage,
	SearchSession, StageError, StageErrorKind,
};
pub use search::{MatchedPet, ScoredCandidate, SearchOutcome, SearchPath};

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use huella_config::{Config, LlmProviderConfig};
use huella_domain::ExtractedAttributes;
use huella_providers::{chat, classifier::LocalClassifier, media};
use huella_storage::{
	db::Db,
	models::{PetPhoto, PetRecord},
	queries,
};

pub trait VisionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, huella_providers::Result<Value>>;
}

pub trait ImageSource
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		reference: &'a str,
		timeout_ms: u64,
		max_bytes: u64,
	) -> BoxFuture<'a, huella_providers::Result<Vec<u8>>>;
}

/// Read access to registered pets.
pub trait PetStore
where
	Self: Send + Sync,
{
	fn search_relevant<'a>(
		&'a self,
		species: &'a str,
		terms: &'a [&'a str],
		limit: u32,
	) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>>;

	fn by_species<'a>(
		&'a self,
		species: &'a str,
	) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>>;

	fn sample<'a>(&'a self, limit: u32) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>>;

	fn photos<'a>(&'a self, pet_id: Uuid) -> BoxFuture<'a, huella_storage::Result<Vec<PetPhoto>>>;

	fn ping<'a>(&'a self) -> BoxFuture<'a, huella_storage::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub vision: Arc<dyn VisionProvider>,
	pub images: Arc<dyn ImageSource>,
	pub classifier: Option<Arc<dyn LocalClassifier>>,
}
impl Providers {
	pub fn new(vision: Arc<dyn VisionProvider>, images: Arc<dyn ImageSource>) -> Self {
		Self { vision, images, classifier: None }
	}

	pub fn with_classifier(mut self, classifier: Arc<dyn LocalClassifier>) -> Self {
		self.classifier = Some(classifier);

		self
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { vision: provider.clone(), images: provider, classifier: None }
	}
}

pub struct HuellaService {
	pub cfg: Config,
	pub store: Arc<dyn PetStore>,
	pub providers: Providers,
}
impl HuellaService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, store: Arc::new(db), providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn PetStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	/// Store connectivity probe.
	pub async fn ping(&self) -> Result<()> {
		self.store.ping().await.map_err(|err| {
			tracing::warn!(error = %err, "Pet store ping failed.");

			Error::from(err)
		})
	}

	/// Attributes from the on-device classifier, without any network call.
	pub async fn classify_locally(&self, image: &[u8]) -> Result<ExtractedAttributes> {
		let Some(classifier) = self.providers.classifier.as_ref() else {
			return Err(Error::validation("No local classifier is configured."));
		};

		if image.is_empty() {
			return Err(Error::validation("Image bytes must not be empty."));
		}

		let predictions = classifier.classify(image).await.map_err(|err| {
			tracing::warn!(error = %err, "Local classification failed.");

			Error::from(err)
		})?;

		huella_domain::labels::attributes_from_predictions(&predictions).ok_or_else(|| {
			Error::MalformedResponse {
				message: "Local classifier returned no predictions.".to_string(),
			}
		})
	}
}

struct DefaultProviders;

impl VisionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, huella_providers::Result<Value>> {
		Box::pin(chat::complete(cfg, messages))
	}
}

impl ImageSource for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		reference: &'a str,
		timeout_ms: u64,
		max_bytes: u64,
	) -> BoxFuture<'a, huella_providers::Result<Vec<u8>>> {
		Box::pin(media::fetch(reference, timeout_ms, max_bytes))
	}
}

impl PetStore for Db {
	fn search_relevant<'a>(
		&'a self,
		species: &'a str,
		terms: &'a [&'a str],
		limit: u32,
	) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>> {
		Box::pin(queries::search_pets_relevant(self, species, terms, limit))
	}

	fn by_species<'a>(
		&'a self,
		species: &'a str,
	) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>> {
		Box::pin(queries::pets_by_species(self, species))
	}

	fn sample<'a>(&'a self, limit: u32) -> BoxFuture<'a, huella_storage::Result<Vec<PetRecord>>> {
		Box::pin(queries::sample_pets(self, limit))
	}

	fn photos<'a>(&'a self, pet_id: Uuid) -> BoxFuture<'a, huella_storage::Result<Vec<PetPhoto>>> {
		Box::pin(queries::photos_for_pet(self, pet_id))
	}

	fn ping<'a>(&'a self) -> BoxFuture<'a, huella_storage::Result<()>> {
		Box::pin(Db::ping(self))
	}
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<()> {
	if value.trim().is_empty() {
		return Err(Error::invalid_field(field, format!("{field} is required.")));
	}

	Ok(())
}
