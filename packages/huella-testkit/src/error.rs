pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid {var}: {source}")]
	InvalidDsn { var: &'static str, source: sqlx::Error },
	#[error("Test database {name} could not be {action}: {source}")]
	Database { name: String, action: &'static str, source: sqlx::Error },
}
