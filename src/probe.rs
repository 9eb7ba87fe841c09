//! Instrumented resources for exercising scopes.
//!
//! A [`Journal`] hands out [`Opener`]s; each opener can be told to fail its
//! acquisition, its use or its release, and every step is written to the
//! journal so tests can check what was acquired and released, and in what
//! order.
//!
//! Available in tests and with the `testing` feature.

use std::cell::RefCell;
use std::io::{self, BufRead, Read, Write};
use std::rc::Rc;

use crate::failure::{Failure, Result};
use crate::resource::{Release, State};

/// Something that happened to a named probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	Acquired(String),
	AcquireFailed(String),
	Used(String),
	Released(String),
	ReleaseFailed(String),
}

/// Shared, ordered record of probe events.
#[derive(Debug, Clone, Default)]
pub struct Journal {
	events: Rc<RefCell<Vec<Event>>>,
}

impl Journal {
	pub fn new() -> Journal {
		Journal::default()
	}

	pub fn opener(&self, name: &str) -> Opener {
		Opener {
			name: name.to_owned(),
			journal: self.clone(),
			fail_acquire: false,
			fail_use: false,
			fail_release: false,
		}
	}

	pub fn events(&self) -> Vec<Event> {
		self.events.borrow().clone()
	}

	/// Names of successfully acquired probes, in acquisition order.
	pub fn acquisitions(&self) -> Vec<String> {
		self.filter(|event| match *event {
			Event::Acquired(ref name) => Some(name.clone()),
			_ => None,
		})
	}

	/// Names of released probes in release order, failed releases included.
	pub fn releases(&self) -> Vec<String> {
		self.filter(|event| match *event {
			Event::Released(ref name) | Event::ReleaseFailed(ref name) => Some(name.clone()),
			_ => None,
		})
	}

	/// Every acquisition attempt, successful or not.
	pub fn attempts(&self) -> Vec<String> {
		self.filter(|event| match *event {
			Event::Acquired(ref name) | Event::AcquireFailed(ref name) => Some(name.clone()),
			_ => None,
		})
	}

	fn filter<F>(&self, f: F) -> Vec<String>
		where F: FnMut(&Event) -> Option<String>
	{
		self.events.borrow().iter().filter_map(f).collect()
	}

	fn record(&self, event: Event) {
		self.events.borrow_mut().push(event);
	}
}

/// Builder for a single [`Probe`].
#[derive(Debug)]
pub struct Opener {
	name: String,
	journal: Journal,
	fail_acquire: bool,
	fail_use: bool,
	fail_release: bool,
}

impl Opener {
	pub fn failing_acquire(mut self) -> Opener {
		self.fail_acquire = true;
		self
	}

	pub fn failing_use(mut self) -> Opener {
		self.fail_use = true;
		self
	}

	pub fn failing_release(mut self) -> Opener {
		self.fail_release = true;
		self
	}

	pub fn open(self) -> Result<Probe> {
		self.open_with(())
	}

	/// Acquire a probe wrapping `inner`, whose I/O it forwards.
	pub fn open_with<T>(self, inner: T) -> Result<Probe<T>> {
		let mut probe = Probe {
			name: self.name,
			journal: self.journal,
			state: State::Unopened,
			fail_use: self.fail_use,
			fail_release: self.fail_release,
			inner,
		};
		if self.fail_acquire {
			probe.journal.record(Event::AcquireFailed(probe.name.clone()));
			return Err(Failure::acquisition(format!("{}: acquisition failed", probe.name)));
		}
		probe.state = State::Open;
		probe.journal.record(Event::Acquired(probe.name.clone()));
		Ok(probe)
	}
}

/// A journaled resource.
#[derive(Debug)]
pub struct Probe<T = ()> {
	name: String,
	journal: Journal,
	state: State,
	fail_use: bool,
	fail_release: bool,
	inner: T,
}

impl<T> Probe<T> {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn state(&self) -> State {
		self.state
	}

	/// Use the probe once.
	pub fn touch(&mut self) -> Result<()> {
		self.check().map_err(Failure::from)
	}

	fn check(&mut self) -> io::Result<()> {
		if !self.state.is_open() {
			return Err(io::Error::new(io::ErrorKind::Other, format!("{} is not open", self.name)));
		}
		if self.fail_use {
			return Err(io::Error::new(io::ErrorKind::Other, "device failed"));
		}
		self.journal.record(Event::Used(self.name.clone()));
		Ok(())
	}
}

impl<T> Release for Probe<T> {
	fn release(&mut self) -> Result<()> {
		if self.state != State::Open {
			return Ok(());
		}
		self.state = State::Closed;
		if self.fail_release {
			self.journal.record(Event::ReleaseFailed(self.name.clone()));
			return Err(Failure::release(format!("{}: release failed", self.name)));
		}
		self.journal.record(Event::Released(self.name.clone()));
		Ok(())
	}
}

impl<T> Read for Probe<T>
	where T: Read
{
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.check()?;
		self.inner.read(buf)
	}
}

impl<T> BufRead for Probe<T>
	where T: BufRead
{
	fn fill_buf(&mut self) -> io::Result<&[u8]> {
		self.check()?;
		self.inner.fill_buf()
	}

	fn consume(&mut self, amt: usize) {
		self.inner.consume(amt)
	}
}

impl<T> Write for Probe<T>
	where T: Write
{
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.check()?;
		self.inner.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		self.check()?;
		self.inner.flush()
	}
}
