//! Byte and line streams as scoped resources.
//!
//! Sources and sinks are plain [`Read`], [`Write`] and [`BufRead`]
//! implementors that also implement [`Release`]. The file-backed ones here
//! buffer their I/O, so releasing a [`FileSink`] is where buffered bytes
//! reach the file and where a late write error shows up.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::failure::{Failure, FailureKind, Result};
use crate::resource::{Release, State};
use crate::strategy::Lenient;
use crate::scope::{fallback_with_strategy, with_resource};

/// Size of the intermediate buffer used by [`pump`].
pub const BUFFER_SIZE: usize = 1024;

/// What a copy moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transfer {
	/// Read/write round trips that moved data.
	pub cycles: usize,
	pub bytes: u64,
}

/// Copy `source` into `sink` through a [`BUFFER_SIZE`] buffer until the
/// source reports end-of-stream.
///
/// Interrupted reads are retried. Neither stream is released.
pub fn pump<S, D>(source: &mut S, sink: &mut D) -> Result<Transfer>
	where S: Read + ?Sized,
		D: Write + ?Sized,
{
	let mut buf = [0u8; BUFFER_SIZE];
	let mut transfer = Transfer::default();
	loop {
		let n = match source.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => n,
			Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
			Err(err) => return Err(err.into()),
		};
		sink.write_all(&buf[..n])?;
		transfer.cycles += 1;
		transfer.bytes += n as u64;
	}
	tracing::trace!(cycles = transfer.cycles, bytes = transfer.bytes, "pump finished");
	Ok(transfer)
}

/// Acquire a source, then a sink, and pump one into the other.
///
/// The sink is released before the source. A failure while copying wins
/// over release failures, which are suppressed on it.
pub fn copy<S, D, AS, AD>(open_source: AS, open_sink: AD) -> Result<Transfer>
	where S: Read + Release,
		D: Write + Release,
		AS: FnOnce() -> Result<S>,
		AD: FnOnce() -> Result<D>,
{
	crate::scoped!(
		source = open_source(),
		sink = open_sink() => pump(source, sink)
	)
}

/// Read one line without its line terminator. `None` at end-of-stream.
pub fn first_line<L>(reader: &mut L) -> Result<Option<String>>
	where L: BufRead + ?Sized
{
	let mut line = String::new();
	if reader.read_line(&mut line)? == 0 {
		return Ok(None);
	}
	if line.ends_with('\n') {
		line.pop();
		if line.ends_with('\r') {
			line.pop();
		}
	}
	Ok(Some(line))
}

/// Copy the file at `src` to `dst`, creating or truncating `dst`.
pub fn copy_file<P, Q>(src: P, dst: Q) -> Result<Transfer>
	where P: AsRef<Path>,
		Q: AsRef<Path>,
{
	copy(|| FileSource::open(src), || FileSink::create(dst))
}

/// The first line of the file at `path`; `None` if the file is empty.
pub fn first_line_of_file<P>(path: P) -> Result<Option<String>>
	where P: AsRef<Path>
{
	with_resource(|| FileSource::open(path), |source| first_line(source))
}

/// The first line of the file at `path`, or `default` if the file cannot be
/// opened, cannot be read, or is empty.
///
/// Unlike [`first_line_of_file`], which returns `None` for an empty file,
/// an empty file yields `default` here.
///
/// A failure to close the file after a successful read is still returned.
pub fn first_line_of_file_or<P>(path: P, default: impl Into<String>) -> Result<String>
	where P: AsRef<Path>
{
	let line = fallback_with_strategy::<Lenient, _, _, _, _>(
		|| FileSource::open(path),
		|source| first_line(source),
		None,
	)?;
	Ok(line.unwrap_or_else(|| default.into()))
}

fn closed(path: &Path) -> io::Error {
	io::Error::new(
		io::ErrorKind::Other,
		format!("{} is already released", path.display()),
	)
}

/// A buffered file reader.
#[derive(Debug)]
pub struct FileSource {
	path: PathBuf,
	reader: Option<BufReader<File>>,
}

impl FileSource {
	pub fn open<P>(path: P) -> Result<FileSource>
		where P: AsRef<Path>
	{
		let path = path.as_ref();
		let file = File::open(path).map_err(|err| {
			Failure::new(FailureKind::Acquisition, format!("cannot open {}: {}", path.display(), err))
				.caused_by(err)
		})?;
		tracing::debug!(path = %path.display(), "opened source");
		Ok(FileSource {
			path: path.to_path_buf(),
			reader: Some(BufReader::new(file)),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn state(&self) -> State {
		if self.reader.is_some() { State::Open } else { State::Closed }
	}

	fn reader(&mut self) -> io::Result<&mut BufReader<File>> {
		match self.reader {
			Some(ref mut reader) => Ok(reader),
			None => Err(closed(&self.path)),
		}
	}
}

impl Read for FileSource {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.reader()?.read(buf)
	}
}

impl BufRead for FileSource {
	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		self.reader()?.fill_buf()
	}

	fn consume(&mut self, amt: usize) {
		if let Some(ref mut reader) = self.reader {
			reader.consume(amt);
		}
	}
}

impl Release for FileSource {
	fn release(&mut self) -> Result<()> {
		if self.reader.take().is_some() {
			tracing::debug!(path = %self.path.display(), "closed source");
		}
		Ok(())
	}
}

/// A buffered file writer.
///
/// Writes are buffered; [`release`](Release::release) flushes them, so write
/// errors that would otherwise be lost on drop are returned as release
/// failures.
#[derive(Debug)]
pub struct FileSink {
	path: PathBuf,
	writer: Option<BufWriter<File>>,
}

impl FileSink {
	/// Create or truncate the file at `path`.
	pub fn create<P>(path: P) -> Result<FileSink>
		where P: AsRef<Path>
	{
		let path = path.as_ref();
		let file = File::create(path).map_err(|err| {
			Failure::new(FailureKind::Acquisition, format!("cannot create {}: {}", path.display(), err))
				.caused_by(err)
		})?;
		tracing::debug!(path = %path.display(), "opened sink");
		Ok(FileSink {
			path: path.to_path_buf(),
			writer: Some(BufWriter::new(file)),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn state(&self) -> State {
		if self.writer.is_some() { State::Open } else { State::Closed }
	}

	fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
		match self.writer {
			Some(ref mut writer) => Ok(writer),
			None => Err(closed(&self.path)),
		}
	}
}

impl Write for FileSink {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.writer()?.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.writer()?.flush()
	}
}

impl Release for FileSink {
	fn release(&mut self) -> Result<()> {
		let writer = match self.writer.take() {
			Some(writer) => writer,
			None => return Ok(()),
		};
		writer
			.into_inner()
			.map_err(|err| Failure::io(FailureKind::Release, err.into_error()))?;
		tracing::debug!(path = %self.path.display(), "closed sink");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::cell::RefCell;
	use std::fs;
	use std::rc::Rc;

	use crate::probe::{Event, Journal};

	/// Records the size of every write it receives.
	#[derive(Clone, Default)]
	struct Chunks(Rc<RefCell<Vec<usize>>>);

	impl Write for Chunks {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.borrow_mut().push(buf.len());
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn copy_runs_three_cycles_and_releases_sink_first() {
		let journal = Journal::new();
		let chunks = Chunks::default();
		let transfer = copy(
			|| journal.opener("source").open_with(io::Cursor::new(vec![7u8; 3000])),
			|| journal.opener("sink").open_with(chunks.clone()),
		)
		.unwrap();

		assert_eq!(transfer, Transfer { cycles: 3, bytes: 3000 });
		assert_eq!(*chunks.0.borrow(), [1024, 1024, 952]);
		assert_eq!(journal.releases(), ["sink", "source"]);
	}

	#[test]
	fn copy_does_not_open_sink_when_source_fails() {
		let journal = Journal::new();
		let failure = copy(
			|| journal.opener("source").failing_acquire().open_with(io::empty()),
			|| journal.opener("sink").open_with(io::sink()),
		)
		.unwrap_err();

		assert_eq!(failure.kind(), FailureKind::Acquisition);
		assert!(journal.releases().is_empty());
		assert_eq!(journal.events(), [Event::AcquireFailed("source".into())]);
	}

	#[test]
	fn copy_releases_source_when_sink_fails_to_open() {
		let journal = Journal::new();
		let failure = copy(
			|| journal.opener("source").open_with(io::empty()),
			|| journal.opener("sink").failing_acquire().open_with(io::sink()),
		)
		.unwrap_err();

		assert_eq!(failure.kind(), FailureKind::Acquisition);
		assert_eq!(journal.releases(), ["source"]);
	}

	#[test]
	fn failed_write_keeps_failed_close_as_suppressed() {
		let journal = Journal::new();
		let outcome: Result<()> = crate::scoped!(
			sink = journal.opener("sink").failing_release().open_with(Vec::new()) => {
				sink.write_all(b"partial")?;
				Err(Failure::usage("write interrupted"))
			}
		);
		let failure = outcome.unwrap_err();

		assert_eq!(failure.kind(), FailureKind::Use);
		assert_eq!(failure.message(), "write interrupted");
		assert_eq!(failure.suppressed().len(), 1);
		assert_eq!(failure.suppressed()[0].kind(), FailureKind::Release);
		assert_eq!(failure.suppressed()[0].message(), "sink: release failed");
		assert_eq!(journal.releases(), ["sink"]);
	}

	#[test]
	fn device_failure_during_use_and_close_stay_distinct() {
		let journal = Journal::new();
		let failure = copy(
			|| journal.opener("source").failing_use().failing_release().open_with(io::empty()),
			|| journal.opener("sink").open_with(io::sink()),
		)
		.unwrap_err();

		assert_eq!(failure.kind(), FailureKind::Use);
		assert_eq!(failure.suppressed().len(), 1);
		assert_eq!(failure.suppressed()[0].kind(), FailureKind::Release);
	}

	#[test]
	fn first_line_strips_terminators() {
		let mut reader = io::Cursor::new("alpha\r\nbeta\n");
		assert_eq!(first_line(&mut reader).unwrap().as_deref(), Some("alpha"));
		assert_eq!(first_line(&mut reader).unwrap().as_deref(), Some("beta"));
		assert_eq!(first_line(&mut reader).unwrap(), None);
	}

	#[test]
	fn copy_file_round_trips_contents() {
		let dir = tempfile::tempdir().unwrap();
		let src = dir.path().join("in.bin");
		let dst = dir.path().join("out.bin");
		let contents: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
		fs::write(&src, &contents).unwrap();

		let transfer = copy_file(&src, &dst).unwrap();

		assert_eq!(transfer.bytes, 3000);
		assert_eq!(fs::read(&dst).unwrap(), contents);
	}

	#[test]
	fn copy_file_missing_source_is_acquisition_failure() {
		let dir = tempfile::tempdir().unwrap();
		let dst = dir.path().join("out.bin");

		let failure = copy_file(dir.path().join("missing"), &dst).unwrap_err();

		assert_eq!(failure.kind(), FailureKind::Acquisition);
		assert!(!dst.exists());
	}

	#[test]
	fn first_line_of_file_reads_one_line() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "first").unwrap();
		writeln!(file, "second").unwrap();

		let line = first_line_of_file(file.path()).unwrap();

		assert_eq!(line.as_deref(), Some("first"));
	}

	#[test]
	fn first_line_of_missing_file_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let line = first_line_of_file_or(dir.path().join("nope.txt"), "fallback").unwrap();
		assert_eq!(line, "fallback");
	}

	#[test]
	fn first_line_of_empty_file_is_default() {
		let file = tempfile::NamedTempFile::new().unwrap();
		let line = first_line_of_file_or(file.path(), "fallback").unwrap();
		assert_eq!(line, "fallback");
	}

	#[test]
	fn first_line_of_missing_file_without_default_fails() {
		let dir = tempfile::tempdir().unwrap();
		let failure = first_line_of_file(dir.path().join("nope.txt")).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::Acquisition);
		assert!(failure.message().starts_with("cannot open"));
	}

	#[test]
	fn released_file_source_rejects_reads() {
		let file = tempfile::NamedTempFile::new().unwrap();
		let mut source = FileSource::open(file.path()).unwrap();
		assert_eq!(source.state(), State::Open);

		source.release().unwrap();
		source.release().unwrap();

		assert_eq!(source.state(), State::Closed);
		assert!(source.read(&mut [0u8; 4]).is_err());
	}

	#[test]
	fn file_sink_release_flushes_buffered_bytes() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.txt");
		let mut sink = FileSink::create(&path).unwrap();
		sink.write_all(b"buffered").unwrap();

		sink.release().unwrap();

		assert_eq!(sink.state(), State::Closed);
		assert_eq!(fs::read(&path).unwrap(), b"buffered");
		assert!(sink.write(b"late").is_err());
	}

	#[cfg(unix)]
	#[test]
	fn copy_file_to_device_without_fsync() {
		let mut src = tempfile::NamedTempFile::new().unwrap();
		src.write_all(&[1u8; 3000]).unwrap();

		let transfer = copy_file(src.path(), "/dev/null").unwrap();

		assert_eq!(transfer, Transfer { cycles: 3, bytes: 3000 });
	}
}
