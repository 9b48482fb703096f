pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {message}")]
	Argument { message: String },
	#[error("Unsupported operation: {message}")]
	Unsupported { message: String },
	#[error("Search unavailable: {message}")]
	SearchUnavailable { message: String },
	#[error("Search daemon error: {message}")]
	SearchDaemon { message: String },
	#[error("Record store error: {message}")]
	Store { message: String },
}
impl Error {
	pub(crate) fn argument(message: impl Into<String>) -> Self {
		Self::Argument { message: message.into() }
	}

	pub(crate) fn unsupported(message: impl Into<String>) -> Self {
		Self::Unsupported { message: message.into() }
	}
}
