use crate::psd::bytes::Cursor;
use crate::psd::{PsdError, Result};

/// Size of one path record.
pub const RECORD_SIZE: usize = 26;

/// A point in document-relative units (`0.0..=1.0` spans the canvas).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PathPoint {
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
}

/// Bezier knot with its two control points.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Knot {
	/// Whether the knot's control points move together.
	pub linked: bool,
	/// Control point entering the anchor.
	pub preceding: PathPoint,
	/// Anchor point.
	pub anchor: PathPoint,
	/// Control point leaving the anchor.
	pub leaving: PathPoint,
}

/// One decoded path record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathRecord {
	/// Start of a subpath with `knots` knot records following.
	Subpath {
		/// Whether the subpath is closed.
		closed: bool,
		/// Number of knot records.
		knots: u16,
	},
	/// Knot of the current subpath.
	Knot {
		/// Whether the owning subpath is closed.
		closed: bool,
		/// Knot geometry.
		#[serde(flatten)]
		knot: Knot,
	},
	/// Path fill rule marker.
	FillRule,
	/// Clipboard bounds and resolution.
	Clipboard {
		/// `[top, left, bottom, right]`.
		bounds: [f64; 4],
		/// Clipboard resolution.
		resolution: f64,
	},
	/// Whether the fill starts with all pixels.
	InitialFill {
		/// Raw fill flag.
		all_pixels: bool,
	},
}

/// Decoded vector mask (`vmsk` / `vsms`).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VectorMask {
	/// Mask format version (3).
	pub version: u32,
	/// Invert flag.
	pub invert: bool,
	/// Not-link flag.
	pub not_linked: bool,
	/// Disable flag.
	pub disabled: bool,
	/// Path records in file order.
	pub records: Vec<PathRecord>,
}

impl VectorMask {
	/// Parse a vector mask block of `len` bytes at the cursor.
	pub fn parse(cursor: &mut Cursor, len: usize) -> Result<Self> {
		let start = cursor.tell();
		let version = cursor.read_u32()?;
		let flags = cursor.read_u32()?;

		let end = start.saturating_add(len);
		if end > cursor.len() {
			return Err(PsdError::malformed("vector_mask", start, format!("block length {len} exceeds document")));
		}

		let count = len.saturating_sub(8) / RECORD_SIZE;
		let mut records = Vec::with_capacity(count);
		for _ in 0..count {
			records.push(read_record(cursor)?);
		}

		if cursor.tell() > end {
			return Err(PsdError::malformed("vector_mask", start, "records overrun block"));
		}

		Ok(Self {
			version,
			invert: flags & 0x1 != 0,
			not_linked: flags & 0x2 != 0,
			disabled: flags & 0x4 != 0,
			records,
		})
	}

	/// Anchor points of every knot, in file order.
	pub fn anchors(&self) -> Vec<PathPoint> {
		self.records
			.iter()
			.filter_map(|record| match record {
				PathRecord::Knot { knot, .. } => Some(knot.anchor),
				_ => None,
			})
			.collect()
	}
}

fn read_record(cursor: &mut Cursor) -> Result<PathRecord> {
	let at = cursor.tell();
	let selector = cursor.read_u16()?;
	let record = match selector {
		0 | 3 => {
			let knots = cursor.read_u16()?;
			cursor.read(22)?;
			PathRecord::Subpath { closed: selector == 0, knots }
		}
		1 | 2 | 4 | 5 => {
			let preceding = read_point(cursor)?;
			let anchor = read_point(cursor)?;
			let leaving = read_point(cursor)?;
			PathRecord::Knot {
				closed: selector < 3,
				knot: Knot {
					linked: selector == 1 || selector == 4,
					preceding,
					anchor,
					leaving,
				},
			}
		}
		6 => {
			cursor.read(24)?;
			PathRecord::FillRule
		}
		7 => {
			let mut bounds = [0.0; 4];
			for slot in &mut bounds {
				*slot = cursor.read_fixed_point_8_24()?;
			}
			let resolution = cursor.read_fixed_point_8_24()?;
			cursor.read(4)?;
			PathRecord::Clipboard { bounds, resolution }
		}
		8 => {
			let all_pixels = cursor.read_u16()? == 1;
			cursor.read(22)?;
			PathRecord::InitialFill { all_pixels }
		}
		other => return Err(PsdError::malformed("vector_mask", at, format!("unknown path selector {other}"))),
	};
	Ok(record)
}

fn read_point(cursor: &mut Cursor) -> Result<PathPoint> {
	let y = cursor.read_fixed_point_8_24()?;
	let x = cursor.read_fixed_point_8_24()?;
	Ok(PathPoint { x, y })
}
