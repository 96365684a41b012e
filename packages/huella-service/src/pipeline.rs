//! The matching pipeline: extraction, candidate search, then an optional visual pass.

use futures::future;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use huella_domain::{ExtractedAttributes, VisualSimilarity, comparison};

use crate::{
	CandidateImage, Error, HuellaService, Result,
	search::{self, ScoredCandidate, SearchPath},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
	Idle,
	Extracting,
	Searching,
	VisuallyComparing,
	Done,
	Errored,
}
impl PipelineStage {
	pub fn can_transition_to(self, next: Self) -> bool {
		use PipelineStage::*;

		matches!(
			(self, next),
			(Idle, Extracting)
				| (Extracting, Searching)
				| (Extracting, Errored)
				| (Searching, VisuallyComparing)
				| (Searching, Done)
				| (Searching, Errored)
				| (VisuallyComparing, Done)
		)
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Done | Self::Errored)
	}
}

/// Alternative the caller may run explicitly after a failed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
	BasicSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
	Validation,
	ExternalService,
	MalformedResponse,
	DataStore,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageError {
	pub stage: PipelineStage,
	pub kind: StageErrorKind,
	pub message: String,
}
impl StageError {
	fn new(stage: PipelineStage, err: &Error) -> Self {
		let (kind, message) = match err {
			Error::Validation { message, .. } => (StageErrorKind::Validation, message),
			Error::ExternalService { message } => (StageErrorKind::ExternalService, message),
			Error::MalformedResponse { message } => (StageErrorKind::MalformedResponse, message),
			Error::DataStore { message } => (StageErrorKind::DataStore, message),
		};

		Self { stage, kind, message: message.clone() }
	}
}

/// State of one search. Lives only as long as the caller keeps it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSession {
	pub session_id: Uuid,
	pub query_image: String,
	pub stage: PipelineStage,
	pub attributes: Option<ExtractedAttributes>,
	pub candidates: Vec<ScoredCandidate>,
	pub search_path: Option<SearchPath>,
	pub visual_similarity: Option<Vec<VisualSimilarity>>,
	pub errors: Vec<StageError>,
	pub fallback: Option<Fallback>,
}
impl SearchSession {
	fn new(query_image: &str) -> Self {
		Self {
			session_id: Uuid::new_v4(),
			query_image: query_image.to_string(),
			stage: PipelineStage::Idle,
			attributes: None,
			candidates: Vec::new(),
			search_path: None,
			visual_similarity: None,
			errors: Vec::new(),
			fallback: None,
		}
	}

	pub fn is_errored(&self) -> bool {
		self.stage == PipelineStage::Errored
	}

	fn advance(&mut self, next: PipelineStage) {
		debug_assert!(
			self.stage.can_transition_to(next),
			"Illegal stage transition {:?} -> {:?}.",
			self.stage,
			next
		);
		tracing::debug!(
			session_id = %self.session_id,
			from = ?self.stage,
			to = ?next,
			"Pipeline stage changed."
		);

		self.stage = next;
	}

	fn record(&mut self, err: &Error) {
		self.errors.push(StageError::new(self.stage, err));
	}

	fn fail(&mut self, err: &Error) {
		self.record(err);
		self.advance(PipelineStage::Errored);
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindMatchesRequest {
	pub image_url: String,
	#[serde(default)]
	pub use_visual_comparison: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicSearchRequest {
	pub image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasicSearchResponse {
	pub items: Vec<ScoredCandidate>,
}

impl HuellaService {
	/// Runs the whole pipeline for one query photo.
	///
	/// Only a missing image is an `Err`. Stage failures are reported on the returned session:
	/// a failed extraction ends `Errored` with the basic search offered, a failed search ends
	/// `Errored` with the attributes kept, and a failed visual pass is recorded without
	/// discarding the candidates.
	pub async fn find_matches(&self, req: FindMatchesRequest) -> Result<SearchSession> {
		crate::require_text(&req.image_url, "image_url")?;

		let mut session = SearchSession::new(req.image_url.trim());

		session.advance(PipelineStage::Extracting);

		let attributes = match self.extract_attributes(&session.query_image).await {
			Ok(attributes) => attributes,
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					error = %err,
					"Extraction failed. Offering the basic search."
				);
				session.fail(&err);

				session.fallback = Some(Fallback::BasicSearch);

				return Ok(session);
			},
		};

		session.advance(PipelineStage::Searching);

		let outcome = self.search_candidates(&attributes).await;

		session.attributes = Some(attributes);

		let outcome = match outcome {
			Ok(outcome) => outcome,
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					error = %err,
					"Candidate search failed. Keeping the extracted attributes."
				);
				session.fail(&err);

				return Ok(session);
			},
		};

		session.search_path = Some(outcome.path);
		session.candidates = outcome.candidates;

		if req.use_visual_comparison {
			self.overlay_visual_similarity(&mut session).await;
		}

		session.advance(PipelineStage::Done);

		tracing::info!(
			session_id = %session.session_id,
			candidates = session.candidates.len(),
			visual = session.visual_similarity.is_some(),
			"Pipeline finished."
		);

		Ok(session)
	}

	/// Attribute-free listing over a sample of the corpus. Never run automatically.
	pub async fn basic_search(&self, req: BasicSearchRequest) -> Result<BasicSearchResponse> {
		crate::require_text(&req.image_url, "image_url")?;

		let records = self.store.sample(self.cfg.search.basic_sample_size).await.map_err(|err| {
			tracing::error!(error = %err, "Basic search sample failed.");

			Error::from(err)
		})?;
		let items = search::score_basic(&records, &mut rand::thread_rng());

		tracing::info!(items = items.len(), "Basic search finished.");

		Ok(BasicSearchResponse { items })
	}

	async fn overlay_visual_similarity(&self, session: &mut SearchSession) {
		let images = self.candidate_images(&session.candidates).await;

		if images.is_empty() {
			tracing::info!(
				session_id = %session.session_id,
				"No candidate photos. Skipping visual comparison."
			);

			return;
		}

		session.advance(PipelineStage::VisuallyComparing);

		match self.compare_candidates(&session.query_image, &images).await {
			Ok(results) =>
				session.visual_similarity = Some(comparison::best_similarity_by_pet(&results)),
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					error = %err,
					"Visual comparison failed. Keeping attribute results."
				);
				session.record(&err);
			},
		}
	}

	/// Candidate photos in rank order, up to the comparison image limit.
	///
	/// Photos are looked up concurrently, a few candidates at a time, and lookups stop once the
	/// limit is reached. A pet whose lookup fails or returns nothing contributes its main photo,
	/// if any.
	async fn candidate_images(&self, candidates: &[ScoredCandidate]) -> Vec<CandidateImage> {
		let limit =
			self.cfg.comparison.max_images.min(huella_config::MAX_COMPARISON_IMAGES) as usize;
		let mut images = Vec::new();
		let mut remaining = candidates;

		while images.len() < limit && !remaining.is_empty() {
			let (chunk, rest) = remaining.split_at(remaining.len().min(limit - images.len()));
			let lookups = chunk.iter().map(|candidate| self.photos_of(candidate));

			images.extend(future::join_all(lookups).await.into_iter().flatten());

			remaining = rest;
		}

		images.truncate(limit);

		images
	}

	async fn photos_of(&self, candidate: &ScoredCandidate) -> Vec<CandidateImage> {
		let pet = &candidate.pet;
		let urls = match self.store.photos(pet.id).await {
			Ok(photos) if !photos.is_empty() =>
				photos.into_iter().map(|photo| photo.photo_url).collect::<Vec<_>>(),
			Ok(_) => pet.main_photo_url.iter().cloned().collect(),
			Err(err) => {
				tracing::warn!(pet_id = %pet.id, error = %err, "Photo lookup failed.");

				pet.main_photo_url.iter().cloned().collect()
			},
		};

		urls.into_iter()
			.filter(|url| !url.trim().is_empty())
			.map(|image_url| CandidateImage { pet_id: pet.id.to_string(), image_url })
			.collect()
	}
}
