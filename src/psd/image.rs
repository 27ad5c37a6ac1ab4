use std::io::SeekFrom;

use tracing::debug;

use crate::psd::bytes::Cursor;
use crate::psd::deferred::Section;
use crate::psd::packbits::unpack_row;
use crate::psd::{Header, PsdError, Result};

/// Composite image compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
	/// Uncompressed planes.
	Raw,
	/// PackBits run-length rows.
	Rle,
}

impl Compression {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Raw => "raw",
			Self::Rle => "rle",
		}
	}
}

/// Composite image section decoder.
///
/// Width and height come from the header at construction so they can be
/// answered without decoding any pixels.
#[derive(Debug)]
pub struct ImageSection {
	width: u32,
	height: u32,
	channels: u16,
	depth: u16,
	row_bytes: usize,
	big: bool,
}

impl ImageSection {
	/// Build a decoder from header facts.
	pub fn new(header: &Header) -> Self {
		Self {
			width: header.width,
			height: header.height,
			channels: header.channels,
			depth: header.depth,
			row_bytes: header.row_bytes(),
			big: header.is_big(),
		}
	}

	/// Image width, known from the header.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Image height, known from the header.
	pub fn height(&self) -> u32 {
		self.height
	}
}

/// Decoded composite image as planar channel samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
	/// Width in pixels.
	pub width: u32,
	/// Height in pixels.
	pub height: u32,
	/// Bits per sample.
	pub depth: u16,
	/// Stored compression.
	pub compression: Compression,
	/// One plane per channel, `row_bytes * height` bytes each, big-endian samples.
	pub planes: Vec<Vec<u8>>,
}

impl Image {
	/// Number of decoded channel planes.
	pub fn channel_count(&self) -> usize {
		self.planes.len()
	}

	/// Sample of `channel` at pixel `(x, y)` for 8-bit images.
	pub fn sample_u8(&self, channel: usize, x: u32, y: u32) -> Option<u8> {
		if self.depth != 8 || x >= self.width || y >= self.height {
			return None;
		}
		let index = y as usize * self.width as usize + x as usize;
		self.planes.get(channel)?.get(index).copied()
	}
}

fn require(cursor: &Cursor, need: usize) -> Result<()> {
	if need > cursor.remaining() {
		return Err(PsdError::OutOfBounds {
			at: cursor.tell(),
			need,
			rem: cursor.remaining(),
		});
	}
	Ok(())
}

impl Section for ImageSection {
	const NAME: &'static str = "image";
	type Output = Image;

	fn parse(&mut self, cursor: &mut Cursor, start: usize) -> Result<Image> {
		cursor.seek(SeekFrom::Start(start as u64));
		let code = cursor.read_u16()?;
		let compression = match code {
			0 => Compression::Raw,
			1 => Compression::Rle,
			other => return Err(PsdError::UnsupportedCompression { code: other }),
		};

		let rows = self.height as usize;
		let channels = usize::from(self.channels);
		let plane_len = self
			.row_bytes
			.checked_mul(rows)
			.ok_or_else(|| PsdError::malformed(Self::NAME, start, "plane size overflows"))?;

		let planes = match compression {
			Compression::Raw => {
				let total = plane_len
					.checked_mul(channels)
					.ok_or_else(|| PsdError::malformed(Self::NAME, start, "image size overflows"))?;
				require(cursor, total)?;

				let mut planes = Vec::with_capacity(channels);
				for _ in 0..channels {
					planes.push(cursor.read(plane_len)?.to_vec());
				}
				planes
			}
			Compression::Rle => {
				let entry = if self.big { 4 } else { 2 };
				let table = channels
					.checked_mul(rows)
					.and_then(|count| count.checked_mul(entry))
					.ok_or_else(|| PsdError::malformed(Self::NAME, start, "row count table overflows"))?;
				require(cursor, table)?;

				let mut counts = Vec::with_capacity(channels * rows);
				for _ in 0..channels * rows {
					let count = if self.big { cursor.read_u32()? as usize } else { usize::from(cursor.read_u16()?) };
					counts.push(count);
				}

				let mut planes = Vec::with_capacity(channels);
				for channel in 0..channels {
					// Rows expand into at most the remaining bytes times the PackBits ratio.
					let mut plane = Vec::with_capacity(plane_len.min(cursor.remaining().saturating_mul(64)));
					for count in &counts[channel * rows..(channel + 1) * rows] {
						unpack_row(cursor, *count, self.row_bytes, &mut plane)?;
					}
					planes.push(plane);
				}
				planes
			}
		};

		debug!(width = self.width, height = self.height, channels, compression = compression.as_str(), "composite image decoded");
		Ok(Image {
			width: self.width,
			height: self.height,
			depth: self.depth,
			compression,
			planes,
		})
	}
}

#[cfg(test)]
mod tests;
