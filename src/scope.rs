//! Scoped acquisition: acquire, run a body, release on every exit path.

use crate::failure::{settle, Result};
use crate::resource::Release;
use crate::scope_guard::{guard, ReleaseGuard};
use crate::strategy::{Lenient, Strategy, Strict, UseOnly};

/// Acquire one resource, run `body` with it and release it exactly once.
///
/// If `acquire` fails its failure is returned and nothing is released. The
/// body's failure takes precedence over a release failure, which is then
/// found in [`Failure::suppressed`](crate::Failure::suppressed). A release
/// failure after a successful body is returned as is.
///
/// ```
/// use releaseguard::{with_resource, Failure, Release};
///
/// struct Conn { open: bool }
///
/// impl Release for Conn {
///     fn release(&mut self) -> Result<(), Failure> {
///         self.open = false;
///         Ok(())
///     }
/// }
///
/// let answer = with_resource(|| Ok(Conn { open: true }), |conn| {
///     assert!(conn.open);
///     Ok(42)
/// });
/// assert_eq!(answer.unwrap(), 42);
/// ```
pub fn with_resource<R, T, A, B>(acquire: A, body: B) -> Result<T>
	where R: Release,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut R) -> Result<T>,
{
	let mut held = guard(acquire()?);
	tracing::debug!("resource acquired");
	let outcome = body(&mut *held);
	settle(outcome, ReleaseGuard::release(held))
}

/// Acquire resources in order, run `body` with all of them and release them
/// in reverse order.
///
/// When an acquisition fails, the resources acquired so far are released
/// last to first and the remaining acquisitions are never attempted. The
/// first failure met is returned; every release failure after it is
/// suppressed on it in the order it happened.
pub fn with_resources<R, T, I, A, B>(acquires: I, body: B) -> Result<T>
	where R: Release,
		I: IntoIterator<Item = A>,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut [R]) -> Result<T>,
{
	let mut held = guard(Vec::new());
	for acquire in acquires {
		match acquire() {
			Ok(resource) => {
				held.push(resource);
				tracing::debug!(index = held.len() - 1, "resource acquired");
			}
			Err(failure) => {
				tracing::debug!(
					index = held.len(),
					failure = %failure,
					"acquisition failed; releasing acquired resources"
				);
				return unwind(held, Err(failure));
			}
		}
	}
	let outcome = body(held.as_mut_slice());
	unwind(held, outcome)
}

/// Release `held` last to first, folding each release into `outcome`.
///
/// Resources not yet released stay in the guard, so a panicking release
/// still leaves the rest to the guard's drop.
fn unwind<R, T>(mut held: ReleaseGuard<Vec<R>>, mut outcome: Result<T>) -> Result<T>
	where R: Release
{
	while let Some(mut resource) = held.pop() {
		outcome = settle(outcome, resource.release());
	}
	outcome
}

/// Like [`with_resource`], but a failure while using the resource yields
/// `default` instead. The resource is released first either way.
///
/// Acquisition failures propagate. If the release also fails after the body
/// failed, the release failure is logged and `default` is still returned. A
/// release failure after a successful body is returned.
///
/// See [`UseOnly`].
pub fn with_resource_or_default<R, T, A, B>(acquire: A, body: B, default: T) -> Result<T>
	where R: Release,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut R) -> Result<T>,
{
	fallback_with_strategy::<UseOnly, _, _, _, _>(acquire, body, default)
}

/// Like [`with_resource_or_default`], but `default` is only returned when the
/// resource was released cleanly.
///
/// See [`Strict`].
pub fn with_resource_or_default_strict<R, T, A, B>(acquire: A, body: B, default: T) -> Result<T>
	where R: Release,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut R) -> Result<T>,
{
	fallback_with_strategy::<Strict, _, _, _, _>(acquire, body, default)
}

/// Like [`with_resource_or_default`], but a failed acquisition yields
/// `default` too.
///
/// See [`Lenient`].
pub fn with_resource_or_default_lenient<R, T, A, B>(acquire: A, body: B, default: T) -> Result<T>
	where R: Release,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut R) -> Result<T>,
{
	fallback_with_strategy::<Lenient, _, _, _, _>(acquire, body, default)
}

/// Default-on-failure scope; the `Strategy` decides which failures are
/// replaced by `default`.
pub fn fallback_with_strategy<S, R, T, A, B>(acquire: A, body: B, default: T) -> Result<T>
	where S: Strategy,
		R: Release,
		A: FnOnce() -> Result<R>,
		B: FnOnce(&mut R) -> Result<T>,
{
	let resource = match acquire() {
		Ok(resource) => resource,
		Err(failure) if S::defaults_acquisition() => {
			tracing::debug!(failure = %failure, "acquisition failed; substituting default");
			return Ok(default);
		}
		Err(failure) => return Err(failure),
	};
	let mut held = guard(resource);
	let outcome = body(&mut *held);
	match (outcome, ReleaseGuard::release(held)) {
		(Ok(value), Ok(())) => Ok(value),
		(Ok(_), Err(failure)) => Err(failure),
		(Err(failure), Ok(())) => {
			tracing::debug!(failure = %failure, "use failed; substituting default");
			Ok(default)
		}
		(Err(failure), Err(released)) if S::absorbs_release_failure() => {
			tracing::warn!(
				failure = %failure,
				release = %released,
				"use and release failed; substituting default"
			);
			Ok(default)
		}
		(outcome, released) => settle(outcome, released),
	}
}
