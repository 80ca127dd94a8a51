pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// The embedding model failed or answered with unusable vectors.
	#[error("Provider error: {message}")]
	Provider { message: String },
	/// A pipeline stage is missing state an earlier stage should have produced.
	#[error("Sequencing error: {message}")]
	Sequencing { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<quarry_storage::Error> for Error {
	fn from(err: quarry_storage::Error) -> Self {
		match err {
			quarry_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			quarry_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			quarry_storage::Error::CorruptRow(message) => Self::Storage { message },
			quarry_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<quarry_providers::Error> for Error {
	fn from(err: quarry_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
