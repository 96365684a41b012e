use std::sync::Arc;

use huella_service::HuellaService;
use huella_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<HuellaService>,
}
impl AppState {
	pub async fn new(config: huella_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::from_service(HuellaService::new(config, db)))
	}

	pub fn from_service(service: HuellaService) -> Self {
		Self { service: Arc::new(service) }
	}
}
