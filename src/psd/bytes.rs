use std::io::SeekFrom;

use crate::psd::{PsdError, Result};

/// Fixed-width big-endian primitive description.
///
/// Every typed read is `decode(read(width))`; adding a primitive only adds an
/// entry here.
#[derive(Debug, Clone, Copy)]
pub struct Format<T> {
	/// Stable primitive name.
	pub name: &'static str,
	/// Encoded width in bytes.
	pub width: usize,
	/// Decoder over exactly `width` bytes.
	pub decode: fn(&[u8]) -> T,
}

fn be<const N: usize>(raw: &[u8]) -> [u8; N] {
	let mut buf = [0_u8; N];
	buf.copy_from_slice(raw);
	buf
}

/// Signed 32-bit integer.
pub const INT: Format<i32> = Format {
	name: "Int",
	width: 4,
	decode: |raw| i32::from_be_bytes(be(raw)),
};
/// Unsigned 32-bit integer.
pub const UINT: Format<u32> = Format {
	name: "UInt",
	width: 4,
	decode: |raw| u32::from_be_bytes(be(raw)),
};
/// Signed 16-bit integer.
pub const SHORT: Format<i16> = Format {
	name: "Short",
	width: 2,
	decode: |raw| i16::from_be_bytes(be(raw)),
};
/// Unsigned 16-bit integer.
pub const USHORT: Format<u16> = Format {
	name: "UShort",
	width: 2,
	decode: |raw| u16::from_be_bytes(be(raw)),
};
/// IEEE-754 single precision.
pub const FLOAT: Format<f32> = Format {
	name: "Float",
	width: 4,
	decode: |raw| f32::from_be_bytes(be(raw)),
};
/// IEEE-754 double precision.
pub const DOUBLE: Format<f64> = Format {
	name: "Double",
	width: 8,
	decode: |raw| f64::from_be_bytes(be(raw)),
};
/// Signed 64-bit integer.
pub const LONG_LONG: Format<i64> = Format {
	name: "LongLong",
	width: 8,
	decode: |raw| i64::from_be_bytes(be(raw)),
};

/// Color space tag plus the significant byte of each of four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ColorRecord {
	/// Photoshop color space id.
	pub color_space: i16,
	/// High byte of each 16-bit component.
	pub components: [u8; 4],
}

/// Bounded cursor owning the whole document buffer.
///
/// Seeks are unchecked; only reads are bounds-checked.
#[derive(Debug)]
pub struct Cursor {
	bytes: Vec<u8>,
	pos: usize,
	reads: u64,
}

impl Cursor {
	/// Create a cursor at position 0.
	pub fn new(bytes: Vec<u8>) -> Self {
		Self { bytes, pos: 0, reads: 0 }
	}

	/// Return current byte offset.
	pub fn tell(&self) -> usize {
		self.pos
	}

	/// Total buffer length.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Whether the buffer is empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Number of successful reads since creation.
	pub fn read_count(&self) -> u64 {
		self.reads
	}

	/// Move the cursor without reading. Relative seeks below zero stop at 0.
	pub fn seek(&mut self, to: SeekFrom) {
		self.pos = match to {
			SeekFrom::Start(at) => usize::try_from(at).unwrap_or(usize::MAX),
			SeekFrom::Current(delta) => offset_by(self.pos, delta),
			SeekFrom::End(delta) => offset_by(self.bytes.len(), delta),
		};
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read(&mut self, n: usize) -> Result<&[u8]> {
		if n > self.remaining() {
			return Err(PsdError::OutOfBounds {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		self.reads += 1;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read one primitive described by `format`.
	pub fn read_typed<T>(&mut self, format: &Format<T>) -> Result<T> {
		let raw = self.read(format.width)?;
		Ok((format.decode)(raw))
	}

	/// Read one unsigned byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read(1)?[0])
	}

	/// Read one signed byte.
	pub fn read_i8(&mut self) -> Result<i8> {
		Ok(i8::from_be_bytes([self.read_u8()?]))
	}

	/// Read a big-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		self.read_typed(&USHORT)
	}

	/// Read a big-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16> {
		self.read_typed(&SHORT)
	}

	/// Read a big-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		self.read_typed(&UINT)
	}

	/// Read a big-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		self.read_typed(&INT)
	}

	/// Read a big-endian `i64`.
	pub fn read_i64(&mut self) -> Result<i64> {
		self.read_typed(&LONG_LONG)
	}

	/// Read a big-endian `f32`.
	pub fn read_f32(&mut self) -> Result<f32> {
		self.read_typed(&FLOAT)
	}

	/// Read a big-endian `f64`.
	pub fn read_f64(&mut self) -> Result<f64> {
		self.read_typed(&DOUBLE)
	}

	/// Read a four-byte code.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		Ok(be(self.read(4)?))
	}

	/// Read `n` single-byte characters, dropping NULs.
	pub fn read_string(&mut self, n: usize) -> Result<String> {
		let raw = self.read(n)?;
		Ok(raw.iter().filter(|byte| **byte != 0).map(|byte| char::from(*byte)).collect())
	}

	/// Read UTF-16BE text. Without an explicit length, an `Int` character
	/// count prefixes the code units.
	pub fn read_unicode_string(&mut self, len: Option<usize>) -> Result<String> {
		let len = match len {
			Some(len) => len,
			None => {
				let at = self.pos;
				let count = self.read_i32()?;
				usize::try_from(count).map_err(|_| PsdError::malformed("string", at, format!("negative character count {count}")))?
			}
		};

		let byte_len = len.checked_mul(2).ok_or(PsdError::OutOfBounds {
			at: self.pos,
			need: usize::MAX,
			rem: self.remaining(),
		})?;
		let raw = self.read(byte_len)?;
		let units = raw.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
		Ok(char::decode_utf16(units)
			.map(|item| item.unwrap_or(char::REPLACEMENT_CHARACTER))
			.filter(|ch| *ch != '\0')
			.collect())
	}

	/// Read a length-prefixed single-byte string whose total size, length
	/// byte included, is padded to a multiple of `pad`.
	pub fn read_pascal_string(&mut self, pad: usize) -> Result<String> {
		let len = usize::from(self.read_u8()?);
		let text = self.read_string(len)?;
		let used = len + 1;
		let padded = used.div_ceil(pad.max(1)) * pad.max(1);
		if padded > used {
			self.read(padded - used)?;
		}
		Ok(text)
	}

	/// Read one byte as a flag.
	pub fn read_boolean(&mut self) -> Result<bool> {
		Ok(self.read_u8()? != 0)
	}

	/// Read a signed 8.24 fixed-point number.
	pub fn read_fixed_point_8_24(&mut self) -> Result<f64> {
		let int_part = self.read_i8()?;
		let raw = self.read(3)?;
		let frac = u32::from_be_bytes([0, raw[0], raw[1], raw[2]]);
		Ok(f64::from(int_part) + f64::from(frac) / f64::from(1_u32 << 24))
	}

	/// Read a color space tag followed by four 16-bit components.
	pub fn read_color_record(&mut self) -> Result<ColorRecord> {
		let color_space = self.read_i16()?;
		let mut components = [0_u8; 4];
		for slot in &mut components {
			*slot = (self.read_u16()? >> 8) as u8;
		}
		Ok(ColorRecord { color_space, components })
	}
}

fn offset_by(base: usize, delta: i64) -> usize {
	if delta >= 0 {
		base.saturating_add(usize::try_from(delta).unwrap_or(usize::MAX))
	} else {
		base.saturating_sub(usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX))
	}
}
