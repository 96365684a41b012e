use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{PetPhoto, PetRecord},
};

const PET_COLUMNS: &str = "\
id,
	user_id,
	name,
	species,
	breed,
	age,
	color,
	description,
	contact_name,
	contact_phone,
	contact_email,
	contact_address,
	main_photo_url,
	created_at,
	updated_at";

/// Text-relevance search: pets whose species matches `species`, ranked by how well species,
/// breed and color match `terms`.
pub async fn search_pets_relevant(
	db: &Db,
	species: &str,
	terms: &[&str],
	limit: u32,
) -> Result<Vec<PetRecord>> {
	let ranking = terms
		.iter()
		.map(|term| term.trim())
		.filter(|term| !term.is_empty())
		.collect::<Vec<_>>()
		.join(" or ");
	let sql = format!(
		"\
SELECT
	{PET_COLUMNS}
FROM pets
WHERE to_tsvector('simple', species) @@ plainto_tsquery('simple', $1)
ORDER BY
	ts_rank(
		to_tsvector('simple', species || ' ' || coalesce(breed, '') || ' ' || coalesce(color, '')),
		websearch_to_tsquery('simple', $2)
	) DESC,
	created_at DESC
LIMIT $3"
	);
	let rows = sqlx::query_as::<_, PetRecord>(&sql)
		.bind(species)
		.bind(ranking)
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

/// Exact, case-insensitive species filter.
pub async fn pets_by_species(db: &Db, species: &str) -> Result<Vec<PetRecord>> {
	let sql = format!(
		"\
SELECT
	{PET_COLUMNS}
FROM pets
WHERE lower(species) = lower($1)
ORDER BY created_at DESC"
	);
	let rows = sqlx::query_as::<_, PetRecord>(&sql).bind(species).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Up to `limit` records in no particular order.
pub async fn sample_pets(db: &Db, limit: u32) -> Result<Vec<PetRecord>> {
	let sql = format!(
		"\
SELECT
	{PET_COLUMNS}
FROM pets
LIMIT $1"
	);
	let rows =
		sqlx::query_as::<_, PetRecord>(&sql).bind(i64::from(limit)).fetch_all(&db.pool).await?;

	Ok(rows)
}

/// Photos of one pet, main photo first.
pub async fn photos_for_pet(db: &Db, pet_id: Uuid) -> Result<Vec<PetPhoto>> {
	let rows = sqlx::query_as::<_, PetPhoto>(
		"\
SELECT
	id,
	pet_id,
	photo_url,
	is_main,
	created_at
FROM pet_photos
WHERE pet_id = $1
ORDER BY is_main DESC, created_at ASC",
	)
	.bind(pet_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn insert_pet(db: &Db, pet: &PetRecord) -> Result<()> {
	if pet.species.trim().is_empty() {
		return Err(Error::InvalidArgument("Pet species must not be empty.".to_string()));
	}

	sqlx::query(
		"\
INSERT INTO pets (
	id,
	user_id,
	name,
	species,
	breed,
	age,
	color,
	description,
	contact_name,
	contact_phone,
	contact_email,
	contact_address,
	main_photo_url,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
	)
	.bind(pet.id)
	.bind(pet.user_id)
	.bind(pet.name.as_str())
	.bind(pet.species.as_str())
	.bind(pet.breed.as_deref())
	.bind(pet.age.as_deref())
	.bind(pet.color.as_deref())
	.bind(pet.description.as_deref())
	.bind(pet.contact_name.as_str())
	.bind(pet.contact_phone.as_str())
	.bind(pet.contact_email.as_deref())
	.bind(pet.contact_address.as_deref())
	.bind(pet.main_photo_url.as_deref())
	.bind(pet.created_at)
	.bind(pet.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_photo(db: &Db, photo: &PetPhoto) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO pet_photos (id, pet_id, photo_url, is_main, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(photo.id)
	.bind(photo.pet_id)
	.bind(photo.photo_url.as_str())
	.bind(photo.is_main)
	.bind(photo.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}
