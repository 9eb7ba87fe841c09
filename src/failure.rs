//! The failure type shared by every scope.
//!
//! A [`Failure`] records which phase of a resource's life it came from, a
//! message, an optional underlying cause and the ordered list of failures that
//! were *suppressed* while it was propagating.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Failure> = std::result::Result<T, E>;

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// The phase of a resource's life a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
	/// Bringing the resource into the `Open` state failed.
	Acquisition,
	/// The body failed while the resource was held.
	Use,
	/// Taking the resource out of the `Open` state failed.
	Release,
}

impl fmt::Display for FailureKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match *self {
			FailureKind::Acquisition => "acquisition",
			FailureKind::Use => "use",
			FailureKind::Release => "release",
		})
	}
}

/// A failure surfaced by a scope.
///
/// Only the first failure met inside a scope is returned to the caller. Every
/// release failure that happens after it is appended to
/// [`suppressed`](Failure::suppressed), in the order it happened.
#[derive(Debug, Error)]
#[error("{kind} failure: {message}")]
pub struct Failure {
	kind: FailureKind,
	message: String,
	#[source]
	cause: Option<Cause>,
	suppressed: Vec<Failure>,
}

impl Failure {
	pub fn new(kind: FailureKind, message: impl Into<String>) -> Failure {
		Failure {
			kind,
			message: message.into(),
			cause: None,
			suppressed: Vec::new(),
		}
	}

	pub fn acquisition(message: impl Into<String>) -> Failure {
		Failure::new(FailureKind::Acquisition, message)
	}

	pub fn usage(message: impl Into<String>) -> Failure {
		Failure::new(FailureKind::Use, message)
	}

	pub fn release(message: impl Into<String>) -> Failure {
		Failure::new(FailureKind::Release, message)
	}

	/// Wrap an I/O error, keeping it as the cause.
	pub fn io(kind: FailureKind, err: io::Error) -> Failure {
		Failure::new(kind, err.to_string()).caused_by(err)
	}

	/// Attach the underlying cause, reachable through `Error::source`.
	pub fn caused_by<E>(mut self, cause: E) -> Failure
		where E: Into<Cause>
	{
		self.cause = Some(cause.into());
		self
	}

	pub fn kind(&self) -> FailureKind {
		self.kind
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	/// Failures recorded while this one was propagating, oldest first.
	pub fn suppressed(&self) -> &[Failure] {
		&self.suppressed
	}

	/// Record `other` as suppressed by this failure.
	///
	/// Entries are only ever appended.
	pub fn add_suppressed(&mut self, other: Failure) {
		self.suppressed.push(other);
	}
}

/// I/O errors raised while a resource is held are use failures.
impl From<io::Error> for Failure {
	fn from(err: io::Error) -> Failure {
		Failure::io(FailureKind::Use, err)
	}
}

/// Fold the outcome of a release into the outcome of whatever ran before it.
///
/// The earlier failure stays primary; a release failure that comes after it is
/// appended to its suppressed list.
pub(crate) fn settle<T>(outcome: Result<T>, released: Result<()>) -> Result<T> {
	match (outcome, released) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(failure)) => Err(failure),
		(Err(failure), Ok(())) => Err(failure),
		(Err(mut primary), Err(failure)) => {
			tracing::warn!(
				primary = %primary,
				suppressed = %failure,
				"release failed while another failure was propagating; recorded as suppressed"
			);
			primary.add_suppressed(failure);
			Err(primary)
		}
	}
}
