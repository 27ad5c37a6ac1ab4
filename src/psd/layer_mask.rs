use std::io::SeekFrom;

use tracing::{debug, trace};

use crate::psd::bytes::{ColorRecord, Cursor};
use crate::psd::deferred::{Section, Skip};
use crate::psd::layer::{Layer, read_len};
use crate::psd::{Header, PsdError, Result};

/// Layer and mask information section decoder.
#[derive(Debug)]
pub struct LayerMaskSection {
	big: bool,
}

impl LayerMaskSection {
	/// Build a decoder using the header's length widths.
	pub fn new(header: &Header) -> Self {
		Self { big: header.is_big() }
	}
}

/// Document-wide layer mask settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalMask {
	/// Overlay color.
	pub overlay: ColorRecord,
	/// Opacity, `0..=100`.
	pub opacity: u16,
	/// Kind code (`0` color selected, `1` color protected, `128` per layer).
	pub kind: u8,
}

/// Decoded layer/mask section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMask {
	/// Layers, top-most first.
	pub layers: Vec<Layer>,
	/// Whether the first alpha channel holds merged transparency.
	pub merged_alpha: bool,
	/// Global mask info, when present.
	pub global_mask: Option<GlobalMask>,
}

impl Section for LayerMaskSection {
	const NAME: &'static str = "layer_mask";
	type Output = LayerMask;

	fn parse(&mut self, cursor: &mut Cursor, start: usize) -> Result<LayerMask> {
		cursor.seek(SeekFrom::Start(start as u64));
		let len = read_len(cursor, self.big)?;
		let end = section_end(cursor, len)?;

		let mut out = LayerMask::default();
		if len == 0 {
			return Ok(out);
		}

		self.parse_layer_info(cursor, &mut out)?;

		if cursor.tell() + 4 <= end {
			out.global_mask = parse_global_mask(cursor)?;
		}

		if cursor.tell() > end {
			return Err(PsdError::malformed(Self::NAME, end, "layer info overruns section end"));
		}

		debug!(layers = out.layers.len(), merged_alpha = out.merged_alpha, "layer/mask parsed");
		Ok(out)
	}
}

impl LayerMaskSection {
	fn parse_layer_info(&self, cursor: &mut Cursor, out: &mut LayerMask) -> Result<()> {
		let len = read_len(cursor, self.big)?;
		let info_end = section_end(cursor, len)?;
		if len == 0 {
			return Ok(());
		}

		let count = cursor.read_i16()?;
		out.merged_alpha = count < 0;
		let count = count.unsigned_abs();

		let mut layers = Vec::with_capacity(usize::from(count));
		for _ in 0..count {
			layers.push(Layer::parse(cursor, self.big)?);
		}

		for layer in &mut layers {
			for channel in &mut layer.channels {
				channel.data_offset = cursor.tell();
				trace!(id = channel.id, length = channel.length, at = channel.data_offset, "channel data");
				cursor.seek(SeekFrom::Current(channel.length as i64));
			}
		}

		if cursor.tell() > info_end {
			return Err(PsdError::malformed(Self::NAME, info_end, "channel data overruns layer info"));
		}
		cursor.seek(SeekFrom::Start(info_end as u64));

		layers.reverse();
		out.layers = layers;
		Ok(())
	}
}

fn section_end(cursor: &Cursor, len: u64) -> Result<usize> {
	let end = usize::try_from(len).ok().and_then(|len| cursor.tell().checked_add(len));
	match end {
		Some(end) if end <= cursor.len() => Ok(end),
		_ => Err(PsdError::OutOfBounds {
			at: cursor.tell(),
			need: usize::try_from(len).unwrap_or(usize::MAX),
			rem: cursor.remaining(),
		}),
	}
}

fn parse_global_mask(cursor: &mut Cursor) -> Result<Option<GlobalMask>> {
	let len = cursor.read_u32()? as usize;
	if len == 0 {
		return Ok(None);
	}

	let end = cursor.tell() + len;
	let overlay = cursor.read_color_record()?;
	let opacity = cursor.read_u16()?;
	let kind = cursor.read_u8()?;
	cursor.seek(SeekFrom::Start(end as u64));
	Ok(Some(GlobalMask { overlay, opacity, kind }))
}

impl Skip for LayerMaskSection {
	fn skip(&mut self, cursor: &mut Cursor) -> Result<usize> {
		let start = cursor.tell();
		let len = read_len(cursor, self.big)?;
		let len = i64::try_from(len).map_err(|_| PsdError::malformed(Self::NAME, start, format!("length {len} too large")))?;
		cursor.seek(SeekFrom::Current(len));
		Ok(cursor.tell() - start)
	}
}

#[cfg(test)]
mod tests;
