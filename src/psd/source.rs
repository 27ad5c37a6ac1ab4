use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::psd::{Header, PsdError, Result};

/// zstd frame magic for wrapped documents (`.psd.zst`).
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// How a loaded buffer was stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
	/// Plain document bytes.
	None,
	/// zstd-compressed document.
	Zstd,
}

impl Wrapping {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Zstd => "zstd",
		}
	}
}

/// Byte acquisition limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
	/// Upper bound on unwrapped output size.
	pub max_decompressed_bytes: usize,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			max_decompressed_bytes: 512 * 1024 * 1024,
		}
	}
}

/// Read a whole file and unwrap it, returning `(wrapping, document_bytes)`.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<(Wrapping, Vec<u8>)> {
	let path = path.as_ref();
	let raw = fs::read(path).map_err(|source| PsdError::SourceUnavailable {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(path = %path.display(), len = raw.len(), "source loaded");
	unwrap_bytes(raw, options)
}

/// Detect a wrapper and unwrap, returning `(wrapping, document_bytes)`.
pub fn unwrap_bytes(raw: Vec<u8>, options: &LoadOptions) -> Result<(Wrapping, Vec<u8>)> {
	if raw.starts_with(&ZSTD_MAGIC) {
		let out = decode_zstd(&raw, options.max_decompressed_bytes)?;
		return Ok((Wrapping::Zstd, out));
	}

	// Signature problems surface from the header stage.
	Ok((Wrapping::None, raw))
}

fn decode_zstd(raw: &[u8], limit: usize) -> Result<Vec<u8>> {
	let decoder = zstd::stream::read::Decoder::new(raw)?;
	let mut out = Vec::new();
	decoder.take((limit as u64).saturating_add(1)).read_to_end(&mut out)?;
	if out.len() > limit {
		return Err(PsdError::DecompressedTooLarge { limit });
	}

	if !out.starts_with(&Header::SIGNATURE) {
		let mut magic = [0_u8; 4];
		magic.iter_mut().zip(&out).for_each(|(slot, byte)| *slot = *byte);
		return Err(PsdError::UnknownMagic { magic });
	}

	debug!(len = out.len(), "zstd wrapper removed");
	Ok(out)
}
