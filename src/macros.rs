/// Macro to scope several resources of different types.
///
/// Takes `name = acquire` bindings followed by `=>` and a body. Each
/// `acquire` expression evaluates to `Result<R, Failure>`; the body sees every
/// `name` as `&mut R` and evaluates to `Result<T, Failure>`.
///
/// The bindings expand to nested [`with_resource`](crate::with_resource)
/// calls, so resources are acquired left to right and released right to
/// left, and a failed acquisition releases only the ones before it.
///
/// ```
/// use releaseguard::{scoped, Failure, Release};
///
/// struct Reader;
/// struct Writer(Vec<u8>);
///
/// impl Release for Reader {
///     fn release(&mut self) -> Result<(), Failure> { Ok(()) }
/// }
///
/// impl Release for Writer {
///     fn release(&mut self) -> Result<(), Failure> { Ok(()) }
/// }
///
/// let written = scoped!(
///     _reader = Ok(Reader),
///     writer = Ok(Writer(Vec::new())) => {
///         writer.0.extend_from_slice(b"hello");
///         Ok(writer.0.len())
///     }
/// );
/// assert_eq!(written.unwrap(), 5);
/// ```
#[macro_export]
macro_rules! scoped {
	(=> $body:expr) => {
		$body
	};
	($name:ident = $acquire:expr $(, $rest:ident = $rest_acquire:expr)* => $body:expr) => {
		$crate::with_resource(
			|| $acquire,
			|$name| $crate::scoped!($($rest = $rest_acquire),* => $body),
		)
	};
}
