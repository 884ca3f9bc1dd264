//! Uniform success/failure record.
//!
//! Every reporting cycle ends in a `StatusResult`, whatever the outcome. The
//! reporting loop keeps the latest one so callers can inspect why a cycle
//! skipped or failed without parsing logs.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Outcome of a fallible operation.
///
/// A successful status never carries an error message. The constructors are
/// the only way to build one, which keeps that invariant.
#[derive(Clone)]
pub struct StatusResult {
	ok: bool,
	error: Option<String>,
	cause: Option<Arc<dyn Error + Send + Sync>>,
}

impl StatusResult {
	/// A successful status.
	pub fn success() -> Self {
		Self {
			ok: true,
			error: None,
			cause: None,
		}
	}

	/// A failed status carrying a message.
	pub fn failure(error: impl Into<String>) -> Self {
		Self {
			ok: false,
			error: Some(error.into()),
			cause: None,
		}
	}

	/// A failed status carrying a message and the underlying error.
	pub fn failure_with_cause<E>(error: impl Into<String>, cause: E) -> Self
	where
		E: Error + Send + Sync + 'static,
	{
		Self {
			ok: false,
			error: Some(error.into()),
			cause: Some(Arc::new(cause)),
		}
	}

	pub fn is_ok(&self) -> bool {
		self.ok
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	pub fn cause(&self) -> Option<&(dyn Error + Send + Sync)> {
		self.cause.as_deref()
	}
}

impl fmt::Debug for StatusResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StatusResult")
			.field("ok", &self.ok)
			.field("error", &self.error)
			.field("cause", &self.cause.as_ref().map(|c| c.to_string()))
			.finish()
	}
}

impl fmt::Display for StatusResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match (&self.error, &self.cause) {
			(None, _) => write!(f, "ok"),
			(Some(error), None) => write!(f, "{}", error),
			(Some(error), Some(cause)) => write!(f, "{} ({})", error, cause),
		}
	}
}

impl<T, E> From<&Result<T, E>> for StatusResult
where
	E: Error + Clone + Send + Sync + 'static,
{
	fn from(result: &Result<T, E>) -> Self {
		match result {
			Ok(_) => Self::success(),
			Err(e) => Self::failure_with_cause(e.to_string(), e.clone()),
		}
	}
}
