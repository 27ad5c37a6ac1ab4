use crate::psd::bytes::Cursor;
use crate::psd::{PsdError, Result};

/// Decode one PackBits-compressed row of `packed_len` bytes into `out`.
///
/// Exactly `row_bytes` samples are appended; a row that decodes short or long
/// is malformed.
pub(crate) fn unpack_row(cursor: &mut Cursor, packed_len: usize, row_bytes: usize, out: &mut Vec<u8>) -> Result<()> {
	let start = cursor.tell();
	let end = start + packed_len;
	let target = out.len() + row_bytes;

	while cursor.tell() < end {
		let header = cursor.read_i8()?;
		match header {
			0..=127 => {
				let count = header as usize + 1;
				out.extend_from_slice(cursor.read(count)?);
			}
			-127..=-1 => {
				let count = (1 - i16::from(header)) as usize;
				let value = cursor.read_u8()?;
				out.resize(out.len() + count, value);
			}
			-128 => {}
		}
	}

	if cursor.tell() != end || out.len() != target {
		return Err(PsdError::malformed(
			"image",
			start,
			format!("packbits row decoded to {} bytes, expected {row_bytes}", out.len() + row_bytes - target),
		));
	}
	Ok(())
}
