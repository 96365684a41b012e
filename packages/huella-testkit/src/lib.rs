//! Throwaway Postgres databases for the ignored integration tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, thread};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::runtime::Builder;
use uuid::Uuid;

pub const DSN_ENV: &str = "HUELLA_PG_DSN";

/// Maintenance database the test databases are created from and dropped through.
const MAINTENANCE_DB: &str = "postgres";

/// One uniquely named database, dropped by [`TestDatabase::cleanup`] or when it goes out of
/// scope.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|source| Error::InvalidDsn { var: DSN_ENV, source })?;
		let maintenance = base.clone().database(MAINTENANCE_DB);
		let name = format!("huella_test_{}", Uuid::new_v4().simple());

		run_maintenance(&maintenance, &name, "created", &format!(r#"CREATE DATABASE "{name}""#))
			.await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn cleanup(mut self) -> Result<()> {
		drop_database(&self.maintenance, &self.name).await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.dropped {
			return;
		}

		let name = self.name.clone();
		let maintenance = self.maintenance.clone();
		// The owning test may still be inside a runtime; block on a fresh one elsewhere.
		let handle = thread::spawn(move || {
			let result = Builder::new_current_thread()
				.enable_all()
				.build()
				.map(|runtime| runtime.block_on(drop_database(&maintenance, &name)));

			match result {
				Ok(Ok(())) => (),
				Ok(Err(err)) => eprintln!("{err}."),
				Err(err) => eprintln!("Test database {name} was left behind: {err}."),
			}
		});

		let _ = handle.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(DSN_ENV).ok()
}

async fn drop_database(maintenance: &PgConnectOptions, name: &str) -> Result<()> {
	// FORCE disconnects pool connections the test did not close.
	run_maintenance(
		maintenance,
		name,
		"dropped",
		&format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#),
	)
	.await
}

async fn run_maintenance(
	maintenance: &PgConnectOptions,
	name: &str,
	action: &'static str,
	sql: &str,
) -> Result<()> {
	let database_error = |source| Error::Database { name: name.to_string(), action, source };
	let mut conn = PgConnection::connect_with(maintenance).await.map_err(database_error)?;

	conn.execute(sql).await.map_err(database_error)?;

	Ok(())
}
