use tracing::debug;

use crate::psd::bytes::Cursor;
use crate::psd::{PsdError, Result};

/// Document color mode stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
	/// 1-bit bitmap.
	Bitmap,
	/// Single gray channel.
	Grayscale,
	/// Palette-indexed color.
	Indexed,
	/// Red, green, blue.
	Rgb,
	/// Cyan, magenta, yellow, black.
	Cmyk,
	/// Arbitrary spot channels.
	Multichannel,
	/// Duotone ink.
	Duotone,
	/// CIE L*a*b*.
	Lab,
	/// Unrecognized mode code.
	Other(u16),
}

impl ColorMode {
	/// Map a raw header mode code.
	pub fn from_code(code: u16) -> Self {
		match code {
			0 => Self::Bitmap,
			1 => Self::Grayscale,
			2 => Self::Indexed,
			3 => Self::Rgb,
			4 => Self::Cmyk,
			7 => Self::Multichannel,
			8 => Self::Duotone,
			9 => Self::Lab,
			other => Self::Other(other),
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bitmap => "bitmap",
			Self::Grayscale => "grayscale",
			Self::Indexed => "indexed",
			Self::Rgb => "rgb",
			Self::Cmyk => "cmyk",
			Self::Multichannel => "multichannel",
			Self::Duotone => "duotone",
			Self::Lab => "lab",
			Self::Other(_) => "other",
		}
	}
}

/// Parsed file header plus the color mode data block that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
	/// `1` for PSD, `2` for large-document PSB.
	pub version: u16,
	/// Channel count, alpha channels included.
	pub channels: u16,
	/// Image height in pixels.
	pub height: u32,
	/// Image width in pixels.
	pub width: u32,
	/// Bits per channel.
	pub depth: u16,
	/// Color mode.
	pub mode: ColorMode,
	/// Raw color mode data (palette for indexed, curves for duotone).
	pub color_data: Vec<u8>,
}

impl Header {
	/// File signature.
	pub const SIGNATURE: [u8; 4] = *b"8BPS";
	/// Size of the fixed header fields.
	pub const FIXED_SIZE: usize = 26;
	/// Regular document version.
	pub const PSD_VERSION: u16 = 1;
	/// Large document version.
	pub const PSB_VERSION: u16 = 2;

	/// Parse the header and color mode data at the cursor.
	pub fn parse(cursor: &mut Cursor) -> Result<Self> {
		let at = cursor.tell();
		let signature = cursor.read_code4()?;
		if signature != Self::SIGNATURE {
			return Err(PsdError::malformed("header", at, format!("bad signature {signature:?}")));
		}

		let version = cursor.read_u16()?;
		if version != Self::PSD_VERSION && version != Self::PSB_VERSION {
			return Err(PsdError::malformed("header", at + 4, format!("unsupported version {version}")));
		}

		cursor.read(6)?;
		let channels = cursor.read_u16()?;
		let height = cursor.read_u32()?;
		let width = cursor.read_u32()?;
		let depth = cursor.read_u16()?;
		let mode = ColorMode::from_code(cursor.read_u16()?);

		let color_len = cursor.read_u32()? as usize;
		let color_data = cursor.read(color_len)?.to_vec();

		debug!(version, channels, width, height, depth, mode = mode.as_str(), "header parsed");
		Ok(Self {
			version,
			channels,
			height,
			width,
			depth,
			mode,
			color_data,
		})
	}

	/// Whether section lengths use the large-document widths.
	pub fn is_big(&self) -> bool {
		self.version == Self::PSB_VERSION
	}

	/// Bytes per row of one channel plane.
	pub fn row_bytes(&self) -> usize {
		(self.width as usize * usize::from(self.depth)).div_ceil(8)
	}
}
