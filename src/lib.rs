//! Scoped acquisition of resources whose release can fail.
//!
//! A resource implements [`Release`]. The scope helpers acquire it, run a
//! body with it and release it on every way out of the body:
//!
//! - [`with_resource`] for a single resource,
//! - [`with_resources`] for an ordered list of resources of one type,
//! - [`scoped!`] for resources of different types,
//! - [`with_resource_or_default`] and its [`Strategy`] variants when a failure
//!   while using the resource should yield a default value instead.
//!
//! Resources are released exactly once, last acquired first. The first
//! failure in a scope is the one returned; release failures that happen after
//! it are kept in [`Failure::suppressed`] rather than replacing it or being
//! dropped.
//!
//! ```
//! use releaseguard::{with_resource, Failure, FailureKind, Release};
//!
//! struct Device;
//!
//! impl Release for Device {
//!     fn release(&mut self) -> Result<(), Failure> {
//!         Err(Failure::release("device failed"))
//!     }
//! }
//!
//! let failure = with_resource(|| Ok(Device), |_device| -> Result<(), Failure> {
//!     Err(Failure::usage("device failed"))
//! })
//! .unwrap_err();
//!
//! assert_eq!(failure.kind(), FailureKind::Use);
//! assert_eq!(failure.suppressed()[0].kind(), FailureKind::Release);
//! ```
//!
//! [`ReleaseGuard`] is the manual form: hold the guard, use the resource
//! through it, and end it with [`ReleaseGuard::release`]. A guard that is
//! dropped instead, including while a panic unwinds, still releases.

#[macro_use]
mod macros;
mod failure;
mod resource;
mod scope;
mod scope_guard;
mod strategy;

pub mod stream;

#[cfg(any(test, feature = "testing"))]
pub mod probe;

pub use crate::failure::{Failure, FailureKind, Result};
pub use crate::resource::{Release, State};
pub use crate::scope::{
	fallback_with_strategy,
	with_resource,
	with_resource_or_default,
	with_resource_or_default_lenient,
	with_resource_or_default_strict,
	with_resources,
};
pub use crate::scope_guard::{guard, ReleaseGuard};
pub use crate::strategy::{Lenient, Strategy, Strict, UseOnly};
