use std::sync::Arc;

use tracing::{debug, trace};

use crate::psd::bytes::Cursor;
use crate::psd::{PsdError, Result};

/// A length-delimited stretch of the document stream with a deferred full decode.
pub trait Section {
	/// Section label used in logs and errors.
	const NAME: &'static str;

	/// Fully decoded section content.
	type Output;

	/// Decode the section starting at `start`.
	///
	/// The cursor is wherever the last reader left it, so implementations
	/// must seek to `start` first. Callers make no assumption about the cursor
	/// position afterwards.
	fn parse(&mut self, cursor: &mut Cursor, start: usize) -> Result<Self::Output>;
}

/// Sections that can account for their on-disk length without decoding it.
pub trait Skip: Section {
	/// Consume exactly the section's bytes, leaving the cursor at the next
	/// section, and return how many bytes were consumed.
	fn skip(&mut self, cursor: &mut Cursor) -> Result<usize>;
}

/// Materialization state of one section, borrowed from its handle.
#[derive(Debug)]
pub enum Materialization<'a, T> {
	/// Parse has not run.
	Pending,
	/// Parse ran and succeeded.
	Materialized(&'a T),
	/// Parse ran and failed; the failure is replayed on every access.
	Failed(&'a PsdError),
}

/// Wrapped section decoder with eager bookkeeping and at-most-once decode.
///
/// `skip` (when used) runs inside the constructor. `parse` runs on the first
/// call to [`SectionHandle::get_or_materialize`]. The target's own accessors,
/// reached through [`SectionHandle::exempt`], answer from construction-time
/// data and never trigger a parse, even after one has happened.
#[derive(Debug)]
pub struct SectionHandle<S: Section> {
	target: S,
	outcome: Option<std::result::Result<S::Output, Arc<PsdError>>>,
	start_offset: usize,
	skipped_len: Option<usize>,
}

impl<S: Skip> SectionHandle<S> {
	/// Wrap `target`, skipping its bytes now and deferring its parse.
	pub fn skip_now(mut target: S, cursor: &mut Cursor) -> Result<Self> {
		let start_offset = cursor.tell();
		let skipped_len = target.skip(cursor)?;
		debug!(section = S::NAME, start_offset, skipped_len, "section skipped");

		Ok(Self {
			target,
			outcome: None,
			start_offset,
			skipped_len: Some(skipped_len),
		})
	}
}

impl<S: Section> SectionHandle<S> {
	/// Wrap `target` without any eager work; only its start offset is recorded.
	pub fn defer(target: S, cursor: &Cursor) -> Self {
		let start_offset = cursor.tell();
		debug!(section = S::NAME, start_offset, "section deferred");

		Self {
			target,
			outcome: None,
			start_offset,
			skipped_len: None,
		}
	}

	/// Return the decoded content, running the deferred parse on first use.
	pub fn get_or_materialize(&mut self, cursor: &mut Cursor) -> Result<&S::Output> {
		if self.outcome.is_some() {
			trace!(section = S::NAME, "section already materialized");
		}

		let target = &mut self.target;
		let start_offset = self.start_offset;
		let outcome = self.outcome.get_or_insert_with(|| {
			debug!(section = S::NAME, start_offset, "materializing section");
			target.parse(cursor, start_offset).map_err(|err| {
				debug!(section = S::NAME, error = %err, "section materialization failed");
				Arc::new(err)
			})
		});

		match outcome {
			Ok(output) => Ok(output),
			Err(err) => Err(PsdError::MaterializationFailure {
				section: S::NAME,
				source: Arc::clone(err),
			}),
		}
	}

	/// Borrow the wrapped decoder for exempt accessors.
	pub fn exempt(&self) -> &S {
		&self.target
	}

	/// Decoded content if the parse already ran and succeeded.
	pub fn materialized(&self) -> Option<&S::Output> {
		self.outcome.as_ref()?.as_ref().ok()
	}

	/// Whether the deferred parse has run, successfully or not.
	pub fn is_materialized(&self) -> bool {
		self.outcome.is_some()
	}

	/// Current materialization state.
	pub fn state(&self) -> Materialization<'_, S::Output> {
		match &self.outcome {
			None => Materialization::Pending,
			Some(Ok(output)) => Materialization::Materialized(output),
			Some(Err(err)) => Materialization::Failed(err),
		}
	}

	/// Cursor position when the section began.
	pub fn start_offset(&self) -> usize {
		self.start_offset
	}

	/// Bytes consumed by the eager skip, when one ran.
	pub fn skipped_len(&self) -> Option<usize> {
		self.skipped_len
	}
}
