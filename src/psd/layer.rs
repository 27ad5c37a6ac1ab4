use std::io::SeekFrom;

use tracing::trace;

use crate::psd::bytes::Cursor;
use crate::psd::path::VectorMask;
use crate::psd::{PsdError, Result};

const BLOCK_SIGNATURES: [[u8; 4]; 2] = [*b"8BIM", *b"8B64"];

/// Additional-info keys whose length field is 64-bit in large documents.
const BIG_LENGTH_KEYS: [[u8; 4]; 13] = [
	*b"LMsk", *b"Lr16", *b"Lr32", *b"Layr", *b"Mt16", *b"Mt32", *b"Mtrn", *b"Alph", *b"FMsk", *b"lnk2", *b"FEid", *b"FXid", *b"PxSD",
];

/// Group structure marker from the `lsct` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divider {
	/// Any other layer.
	Other,
	/// Group start, expanded.
	OpenFolder,
	/// Group start, collapsed.
	ClosedFolder,
	/// Hidden record closing a group.
	BoundingDivider,
}

impl Divider {
	fn from_code(code: u32) -> Self {
		match code {
			1 => Self::OpenFolder,
			2 => Self::ClosedFolder,
			3 => Self::BoundingDivider,
			_ => Self::Other,
		}
	}
}

/// One channel entry from a layer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelInfo {
	/// Channel id (`-1` transparency, `-2` user mask, `-3` real user mask).
	pub id: i16,
	/// Stored length, compression tag included.
	pub length: u64,
	/// Absolute offset of the compression tag; filled in after all records are read.
	pub data_offset: usize,
}

/// Layer mask rectangle and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskData {
	/// Top edge.
	pub top: i32,
	/// Left edge.
	pub left: i32,
	/// Bottom edge.
	pub bottom: i32,
	/// Right edge.
	pub right: i32,
	/// Color outside the mask rectangle (0 or 255).
	pub default_color: u8,
	/// Raw mask flags.
	pub flags: u8,
}

impl MaskData {
	/// Mask position is relative to the layer.
	pub fn relative(&self) -> bool {
		self.flags & 0x01 != 0
	}

	/// Mask is disabled.
	pub fn disabled(&self) -> bool {
		self.flags & 0x02 != 0
	}
}

/// One decoded layer record.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
	/// Top edge.
	pub top: i32,
	/// Left edge.
	pub left: i32,
	/// Bottom edge.
	pub bottom: i32,
	/// Right edge.
	pub right: i32,
	/// Channel table.
	pub channels: Vec<ChannelInfo>,
	/// Four-character blend mode key (`norm`, `mul `, `pass`, ...).
	pub blend_mode: String,
	/// Opacity byte.
	pub opacity: u8,
	/// Clipping byte (`0` base, `1` clipped).
	pub clipping: u8,
	/// Raw flags byte.
	pub flags: u8,
	/// Layer mask, when present.
	pub mask: Option<MaskData>,
	/// Legacy Pascal name.
	pub legacy_name: String,
	/// Unicode name from `luni`.
	pub unicode_name: Option<String>,
	/// Section divider type.
	pub divider: Divider,
	/// Layer id from `lyid`.
	pub layer_id: Option<u32>,
	/// Knockout flag from `knko`.
	pub knockout: Option<bool>,
	/// Blend-clipped-elements flag from `clbl`.
	pub blend_clipped: Option<bool>,
	/// Vector mask from `vmsk` / `vsms`.
	pub vector_mask: Option<VectorMask>,
	/// Keys and lengths of additional info blocks this reader does not interpret.
	pub unknown_blocks: Vec<([u8; 4], u64)>,
}

impl Layer {
	/// Display name, unicode when available.
	pub fn name(&self) -> &str {
		self.unicode_name.as_deref().unwrap_or(&self.legacy_name)
	}

	/// Width in pixels.
	pub fn width(&self) -> u32 {
		(i64::from(self.right) - i64::from(self.left)).max(0) as u32
	}

	/// Height in pixels.
	pub fn height(&self) -> u32 {
		(i64::from(self.bottom) - i64::from(self.top)).max(0) as u32
	}

	/// Whether the hidden flag is clear.
	pub fn visible(&self) -> bool {
		self.flags & 0x02 == 0
	}

	/// Whether this record opens a group.
	pub fn is_folder(&self) -> bool {
		matches!(self.divider, Divider::OpenFolder | Divider::ClosedFolder)
	}

	/// Whether this record closes a group.
	pub fn is_folder_end(&self) -> bool {
		self.divider == Divider::BoundingDivider
	}

	/// Parse one layer record at the cursor.
	pub(crate) fn parse(cursor: &mut Cursor, big: bool) -> Result<Self> {
		let top = cursor.read_i32()?;
		let left = cursor.read_i32()?;
		let bottom = cursor.read_i32()?;
		let right = cursor.read_i32()?;

		let channel_count = cursor.read_u16()?;
		let mut channels = Vec::with_capacity(usize::from(channel_count));
		for _ in 0..channel_count {
			let id = cursor.read_i16()?;
			let length = read_len(cursor, big)?;
			channels.push(ChannelInfo { id, length, data_offset: 0 });
		}

		let at = cursor.tell();
		let signature = cursor.read_code4()?;
		if signature != *b"8BIM" {
			return Err(PsdError::malformed("layer_mask", at, format!("bad blend mode signature {signature:?}")));
		}
		let blend_mode = cursor.read_string(4)?;
		let opacity = cursor.read_u8()?;
		let clipping = cursor.read_u8()?;
		let flags = cursor.read_u8()?;
		cursor.read_u8()?;

		let extra_len = cursor.read_u32()? as usize;
		let extra_end = cursor.tell() + extra_len;

		let mask = read_mask(cursor)?;
		let ranges_len = cursor.read_u32()?;
		cursor.seek(SeekFrom::Current(i64::from(ranges_len)));
		let legacy_name = cursor.read_pascal_string(4)?;

		let mut layer = Self {
			top,
			left,
			bottom,
			right,
			channels,
			blend_mode,
			opacity,
			clipping,
			flags,
			mask,
			legacy_name,
			unicode_name: None,
			divider: Divider::Other,
			layer_id: None,
			knockout: None,
			blend_clipped: None,
			vector_mask: None,
			unknown_blocks: Vec::new(),
		};

		while cursor.tell() + 12 <= extra_end {
			layer.read_block(cursor, big)?;
		}
		cursor.seek(SeekFrom::Start(extra_end as u64));

		trace!(name = layer.name(), top, left, bottom, right, "layer record");
		Ok(layer)
	}

	fn read_block(&mut self, cursor: &mut Cursor, big: bool) -> Result<()> {
		let at = cursor.tell();
		let signature = cursor.read_code4()?;
		if !BLOCK_SIGNATURES.contains(&signature) {
			return Err(PsdError::malformed("layer_mask", at, format!("bad additional info signature {signature:?}")));
		}

		let key = cursor.read_code4()?;
		let len = if big && BIG_LENGTH_KEYS.contains(&key) {
			read_len(cursor, true)?
		} else {
			u64::from(cursor.read_u32()?)
		};
		let len = len + len % 2;
		let start = cursor.tell();

		match &key {
			b"luni" => self.unicode_name = Some(cursor.read_unicode_string(None)?),
			b"lsct" | b"lsdk" => self.divider = Divider::from_code(cursor.read_u32()?),
			b"lyid" => self.layer_id = Some(cursor.read_u32()?),
			b"knko" => self.knockout = Some(cursor.read_boolean()?),
			b"clbl" => self.blend_clipped = Some(cursor.read_boolean()?),
			b"vmsk" | b"vsms" => self.vector_mask = Some(VectorMask::parse(cursor, len as usize)?),
			_ => self.unknown_blocks.push((key, len)),
		}

		cursor.seek(SeekFrom::Start(start as u64 + len));
		Ok(())
	}
}

fn read_mask(cursor: &mut Cursor) -> Result<Option<MaskData>> {
	let len = cursor.read_u32()? as usize;
	if len == 0 {
		return Ok(None);
	}

	let end = cursor.tell() + len;
	let mask = MaskData {
		top: cursor.read_i32()?,
		left: cursor.read_i32()?,
		bottom: cursor.read_i32()?,
		right: cursor.read_i32()?,
		default_color: cursor.read_u8()?,
		flags: cursor.read_u8()?,
	};
	cursor.seek(SeekFrom::Start(end as u64));
	Ok(Some(mask))
}

/// Read a section or channel length: `UInt` in documents, `LongLong` in large documents.
pub(crate) fn read_len(cursor: &mut Cursor, big: bool) -> Result<u64> {
	if !big {
		return Ok(u64::from(cursor.read_u32()?));
	}

	let at = cursor.tell();
	let len = cursor.read_i64()?;
	u64::try_from(len).map_err(|_| PsdError::malformed("layer_mask", at, format!("negative length {len}")))
}
