use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};

use crate::failure::Result;
use crate::resource::Release;

/// `ReleaseGuard` owns an open resource and releases it exactly once.
///
/// This is the manual idiom: the guard is held in a local variable, the
/// resource is used through `Deref`/`DerefMut`, and the guard is ended with
/// [`ReleaseGuard::release`] so the release outcome can be inspected.
///
/// If the guard is dropped instead (early return, `?`, or a panic unwinding
/// through the scope) it still releases the resource. A release failure at
/// that point has nowhere to go and is logged at `error` level.
pub struct ReleaseGuard<R>
	where R: Release
{
	resource: ManuallyDrop<R>,
}

impl<R> ReleaseGuard<R>
	where R: Release
{
	/// Create a `ReleaseGuard` that owns `resource`.
	#[inline]
	pub fn new(resource: R) -> ReleaseGuard<R> {
		ReleaseGuard {
			resource: ManuallyDrop::new(resource),
		}
	}

	/// Release the resource now and return the outcome.
	///
	/// This is an associated function rather than a method so that it never
	/// shadows the resource's own `release` reached through `Deref`.
	///
	/// ```
	/// use releaseguard::{guard, Failure, Release, ReleaseGuard};
	///
	/// struct Handle;
	///
	/// impl Release for Handle {
	///     fn release(&mut self) -> Result<(), Failure> {
	///         Err(Failure::release("flush failed"))
	///     }
	/// }
	///
	/// let handle = guard(Handle);
	/// let failure = ReleaseGuard::release(handle).unwrap_err();
	/// assert_eq!(failure.message(), "flush failed");
	/// ```
	pub fn release(guard: Self) -> Result<()> {
		let mut resource = ReleaseGuard::into_inner(guard);
		tracing::debug!("releasing resource");
		resource.release()
	}

	/// "Defuse" the guard and take the resource back without releasing it.
	#[inline]
	pub fn into_inner(guard: Self) -> R {
		// Cannot move out of a `Drop` type, so take the value out of a guard
		// whose destructor will never run.
		let mut guard = ManuallyDrop::new(guard);
		unsafe { ManuallyDrop::take(&mut guard.resource) }
	}
}

/// Create a new `ReleaseGuard` owning `resource`.
#[inline]
pub fn guard<R>(resource: R) -> ReleaseGuard<R>
	where R: Release
{
	ReleaseGuard::new(resource)
}

impl<R> Deref for ReleaseGuard<R>
	where R: Release
{
	type Target = R;

	fn deref(&self) -> &R {
		&self.resource
	}
}

impl<R> DerefMut for ReleaseGuard<R>
	where R: Release
{
	fn deref_mut(&mut self) -> &mut R {
		&mut self.resource
	}
}

impl<R> Drop for ReleaseGuard<R>
	where R: Release
{
	fn drop(&mut self) {
		// The field is a `ManuallyDrop` and is never touched again.
		let mut resource = unsafe { ManuallyDrop::take(&mut self.resource) };
		if let Err(failure) = resource.release() {
			tracing::error!(
				failure = %failure,
				panicking = std::thread::panicking(),
				"release failed while dropping guard; failure discarded"
			);
		}
	}
}

impl<R> fmt::Debug for ReleaseGuard<R>
	where R: Release + fmt::Debug
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct(stringify!(ReleaseGuard))
			.field("resource", &*self.resource)
			.finish()
	}
}
