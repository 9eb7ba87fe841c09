/// Controls which failures a default-on-failure scope replaces with the
/// caller's default.
///
/// A use failure is always replaced and a release failure after a successful
/// body is never replaced; the strategy decides the two cases in between.
pub trait Strategy {
	/// Return `true` if a failed acquisition yields the default instead of
	/// the failure.
	fn defaults_acquisition() -> bool;

	/// Return `true` if, when the body failed and the release failed as well,
	/// the default is still returned (the release failure is logged and
	/// dropped). With `false` the body failure is returned with the release
	/// failure suppressed on it.
	fn absorbs_release_failure() -> bool;
}

/// Replace use failures only.
///
/// Acquisition failures propagate. A release failure that follows a use
/// failure is logged and the default is returned.
#[derive(Debug)]
pub enum UseOnly {}

/// Replace use failures only when the resource was released cleanly.
#[derive(Debug)]
pub enum Strict {}

/// Replace acquisition and use failures.
///
/// Matches reading with a fallback where a missing file is as good as an
/// unreadable one.
#[derive(Debug)]
pub enum Lenient {}

impl Strategy for UseOnly {
	#[inline(always)]
	fn defaults_acquisition() -> bool { false }
	#[inline(always)]
	fn absorbs_release_failure() -> bool { true }
}

impl Strategy for Strict {
	#[inline(always)]
	fn defaults_acquisition() -> bool { false }
	#[inline(always)]
	fn absorbs_release_failure() -> bool { false }
}

impl Strategy for Lenient {
	#[inline(always)]
	fn defaults_acquisition() -> bool { true }
	#[inline(always)]
	fn absorbs_release_failure() -> bool { true }
}
