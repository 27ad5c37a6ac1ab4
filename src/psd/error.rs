use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, PsdError>;

/// Errors produced while acquiring, reading, and materializing document sections.
#[derive(Debug, Error)]
pub enum PsdError {
	/// Not enough bytes remained for a requested read.
	#[error("out of bounds at offset {at}, need {need} bytes, remaining {rem}")]
	OutOfBounds {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// A section could not establish its own length or carried an invalid tag.
	#[error("malformed {section} section at offset {at}: {reason}")]
	MalformedSection {
		/// Section being decoded.
		section: &'static str,
		/// Cursor offset where the problem was detected.
		at: usize,
		/// Human-readable cause.
		reason: String,
	},
	/// A deferred section parse failed when first accessed.
	#[error("failed to materialize {section} section: {source}")]
	MaterializationFailure {
		/// Section whose deferred parse failed.
		section: &'static str,
		/// Original failure, shared with every later access.
		#[source]
		source: Arc<PsdError>,
	},
	/// The byte source could not produce a complete buffer.
	#[error("source unavailable '{path}': {source}")]
	SourceUnavailable {
		/// Source path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Wrapped input failed while being unpacked.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Unwrapped payload does not start with the document signature.
	#[error("not a psd/psb document (magic={magic:?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the input.
		magic: [u8; 4],
	},
	/// Decompression output exceeded the configured limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Composite image uses a compression mode this reader does not decode.
	#[error("unsupported image compression {code}")]
	UnsupportedCompression {
		/// Raw compression code.
		code: u16,
	},
	/// A section accessor was used before `parse()`.
	#[error("document has not been parsed")]
	NotParsed,
	/// An earlier `parse()` failed; the document is unusable.
	#[error("document parse aborted during {stage}")]
	ParseAborted {
		/// Last stage that completed before the failure.
		stage: &'static str,
	},
	/// JSON output serialization failed.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
}

impl PsdError {
	/// Build a [`PsdError::MalformedSection`].
	pub(crate) fn malformed(section: &'static str, at: usize, reason: impl Into<String>) -> Self {
		Self::MalformedSection {
			section,
			at,
			reason: reason.into(),
		}
	}
}
