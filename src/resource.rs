use crate::failure::{settle, Result};

/// The capability a resource needs to take part in a scope.
///
/// `release` takes the resource out of the `Open` state. It may fail, and a
/// resource that has already been released must treat another call as a
/// no-op.
pub trait Release {
	fn release(&mut self) -> Result<()>;
}

/// Lifecycle of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// Not acquired yet.
	Unopened,
	Open,
	/// Released; final.
	Closed,
}

impl State {
	#[inline]
	pub fn is_open(self) -> bool {
		self == State::Open
	}
}

impl<R> Release for Box<R>
	where R: Release + ?Sized
{
	#[inline]
	fn release(&mut self) -> Result<()> {
		(**self).release()
	}
}

/// Releases the held resources last to first.
///
/// Every element is released even if an earlier release failed; the first
/// failure is returned and later ones are suppressed on it. The vector is
/// empty afterwards.
impl<R> Release for Vec<R>
	where R: Release
{
	fn release(&mut self) -> Result<()> {
		let mut outcome = Ok(());
		while let Some(mut resource) = self.pop() {
			outcome = settle(outcome, resource.release());
		}
		outcome
	}
}
