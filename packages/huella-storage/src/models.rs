use time::OffsetDateTime;
use uuid::Uuid;

/// A registered pet. Contact columns are opaque to matching.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetRecord {
	pub id: Uuid,
	pub user_id: Uuid,
	pub name: String,
	pub species: String,
	pub breed: Option<String>,
	pub age: Option<String>,
	pub color: Option<String>,
	pub description: Option<String>,
	pub contact_name: String,
	pub contact_phone: String,
	pub contact_email: Option<String>,
	pub contact_address: Option<String>,
	pub main_photo_url: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetPhoto {
	pub id: Uuid,
	pub pet_id: Uuid,
	pub photo_url: String,
	pub is_main: bool,
	pub created_at: OffsetDateTime,
}
