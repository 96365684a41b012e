//! Candidate search over the pet corpus and the scoring of each path.

use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use huella_domain::{
	ExtractedAttributes, MatchReason, PetTraits,
	scoring::{self, BASIC_SCORE_RANGE, JITTER_SPAN},
};
use huella_storage::models::PetRecord;

use crate::{Error, HuellaService, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
	Relevance,
	Fallback,
}

/// The public view of a matched pet.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPet {
	pub id: Uuid,
	pub name: String,
	pub species: String,
	pub breed: Option<String>,
	pub age: Option<String>,
	pub color: Option<String>,
	pub description: Option<String>,
	pub main_photo_url: Option<String>,
	pub contact_name: String,
	pub contact_phone: String,
	pub contact_email: Option<String>,
	pub contact_address: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl From<&PetRecord> for MatchedPet {
	fn from(record: &PetRecord) -> Self {
		Self {
			id: record.id,
			name: record.name.clone(),
			species: record.species.clone(),
			breed: record.breed.clone(),
			age: record.age.clone(),
			color: record.color.clone(),
			description: record.description.clone(),
			main_photo_url: record.main_photo_url.clone(),
			contact_name: record.contact_name.clone(),
			contact_phone: record.contact_phone.clone(),
			contact_email: record.contact_email.clone(),
			contact_address: record.contact_address.clone(),
			created_at: record.created_at,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
	pub pet: MatchedPet,
	pub match_score: u8,
	pub match_reasons: Vec<MatchReason>,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
	pub path: SearchPath,
	pub candidates: Vec<ScoredCandidate>,
}

/// Position-decayed scores over store-ranked records, capped at `max_results`.
pub fn score_relevance(
	records: &[PetRecord],
	attrs: &ExtractedAttributes,
	max_results: usize,
) -> Vec<ScoredCandidate> {
	let total = records.len();

	records
		.iter()
		.enumerate()
		.take(max_results)
		.map(|(index, record)| ScoredCandidate {
			pet: MatchedPet::from(record),
			match_score: scoring::relevance_score(index, total),
			match_reasons: scoring::relevance_reasons(traits(record), attrs),
		})
		.collect()
}

/// Weighted attribute scores with jitter, thresholded, best first, capped at `max_results`.
pub fn score_fallback<R>(
	records: &[PetRecord],
	attrs: &ExtractedAttributes,
	max_results: usize,
	rng: &mut R,
) -> Vec<ScoredCandidate>
where
	R: Rng + ?Sized,
{
	let mut scored = records
		.iter()
		.filter_map(|record| {
			let score = scoring::attribute_score(traits(record), attrs);
			let jitter = rng.gen_range(-JITTER_SPAN..=JITTER_SPAN);
			let match_score = scoring::jittered_score(score.points, jitter);

			scoring::passes_fallback_threshold(match_score).then(|| ScoredCandidate {
				pet: MatchedPet::from(record),
				match_score,
				match_reasons: score.reasons,
			})
		})
		.collect::<Vec<_>>();

	scored.sort_by(|a, b| b.match_score.cmp(&a.match_score));
	scored.truncate(max_results);

	scored
}

/// Attribute-free listing with neutral random scores, best first.
pub fn score_basic<R>(records: &[PetRecord], rng: &mut R) -> Vec<ScoredCandidate>
where
	R: Rng + ?Sized,
{
	let mut scored = records
		.iter()
		.map(|record| ScoredCandidate {
			pet: MatchedPet::from(record),
			match_score: rng.gen_range(BASIC_SCORE_RANGE),
			match_reasons: Vec::new(),
		})
		.collect::<Vec<_>>();

	scored.sort_by(|a, b| b.match_score.cmp(&a.match_score));

	scored
}

fn traits(record: &PetRecord) -> PetTraits<'_> {
	PetTraits {
		species: &record.species,
		breed: record.breed.as_deref(),
		color: record.color.as_deref(),
	}
}

impl HuellaService {
	/// Relevance query first; the species scan runs only when that query errors.
	pub async fn search_candidates(&self, attrs: &ExtractedAttributes) -> Result<SearchOutcome> {
		let search = &self.cfg.search;
		let max_results = search.max_results as usize;
		let terms = [attrs.species.as_str(), attrs.breed.as_str(), attrs.color.as_str()];

		match self.store.search_relevant(&attrs.species, &terms, search.relevance_pool).await {
			Ok(records) => {
				let candidates = score_relevance(&records, attrs, max_results);

				tracing::info!(
					path = "relevance",
					found = records.len(),
					kept = candidates.len(),
					"Candidate search finished."
				);

				Ok(SearchOutcome { path: SearchPath::Relevance, candidates })
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Relevance query failed. Falling back to the species scan."
				);

				let records = self.store.by_species(&attrs.species).await.map_err(|err| {
					tracing::error!(error = %err, "Species scan failed.");

					Error::from(err)
				})?;
				let candidates =
					score_fallback(&records, attrs, max_results, &mut rand::thread_rng());

				tracing::info!(
					path = "fallback",
					found = records.len(),
					kept = candidates.len(),
					"Candidate search finished."
				);

				Ok(SearchOutcome { path: SearchPath::Fallback, candidates })
			},
		}
	}
}
