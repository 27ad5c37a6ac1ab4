use std::io::SeekFrom;

use tracing::trace;

use crate::psd::bytes::Cursor;
use crate::psd::deferred::{Section, Skip};
use crate::psd::{PsdError, Result};

const SIGNATURES: [[u8; 4]; 5] = [*b"8BIM", *b"MeSa", *b"AgHg", *b"PHUT", *b"DCSR"];

/// Image resource section decoder.
#[derive(Debug, Default)]
pub struct ResourcesSection;

/// One image resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
	/// Resource id.
	pub id: u16,
	/// Optional Pascal name (usually empty).
	pub name: String,
	/// Absolute offset of the record data.
	pub data_offset: usize,
	/// Raw record payload.
	pub data: Vec<u8>,
}

impl Resource {
	/// Well-known label for this id, if any.
	pub fn label(&self) -> Option<&'static str> {
		resource_label(self.id)
	}
}

/// Decoded image resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resources {
	/// Records in file order.
	pub records: Vec<Resource>,
}

/// Resolution info resource (id 1005).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ResolutionInfo {
	/// Horizontal resolution in pixels per inch.
	pub h_res: f64,
	/// Horizontal display unit code.
	pub h_res_unit: u16,
	/// Width display unit code.
	pub width_unit: u16,
	/// Vertical resolution in pixels per inch.
	pub v_res: f64,
	/// Vertical display unit code.
	pub v_res_unit: u16,
	/// Height display unit code.
	pub height_unit: u16,
}

impl Resources {
	/// Resolution info resource id.
	pub const RESOLUTION_INFO: u16 = 1005;
	/// XMP metadata resource id.
	pub const XMP_METADATA: u16 = 1060;

	/// Find the first record with `id`.
	pub fn by_id(&self, id: u16) -> Option<&Resource> {
		self.records.iter().find(|record| record.id == id)
	}

	/// Number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Whether the section carried no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Decode resolution info when present.
	pub fn resolution_info(&self) -> Result<Option<ResolutionInfo>> {
		let Some(record) = self.by_id(Self::RESOLUTION_INFO) else {
			return Ok(None);
		};

		let mut cursor = Cursor::new(record.data.clone());
		let h_res = fixed_16_16(cursor.read_u32()?);
		let h_res_unit = cursor.read_u16()?;
		let width_unit = cursor.read_u16()?;
		let v_res = fixed_16_16(cursor.read_u32()?);
		let v_res_unit = cursor.read_u16()?;
		let height_unit = cursor.read_u16()?;

		Ok(Some(ResolutionInfo {
			h_res,
			h_res_unit,
			width_unit,
			v_res,
			v_res_unit,
			height_unit,
		}))
	}

	/// XMP packet text when present.
	pub fn xmp(&self) -> Option<String> {
		self.by_id(Self::XMP_METADATA)
			.map(|record| String::from_utf8_lossy(&record.data).trim_end_matches('\0').to_owned())
	}
}

impl Section for ResourcesSection {
	const NAME: &'static str = "resources";
	type Output = Resources;

	fn parse(&mut self, cursor: &mut Cursor, start: usize) -> Result<Resources> {
		cursor.seek(SeekFrom::Start(start as u64));
		let len = cursor.read_u32()? as usize;
		let end = cursor.tell() + len;

		let mut records = Vec::new();
		while cursor.tell() < end {
			let at = cursor.tell();
			let signature = cursor.read_code4()?;
			if !SIGNATURES.contains(&signature) {
				return Err(PsdError::malformed(Self::NAME, at, format!("bad record signature {signature:?}")));
			}

			let id = cursor.read_u16()?;
			let name = cursor.read_pascal_string(2)?;
			let data_len = cursor.read_u32()? as usize;
			let data_offset = cursor.tell();
			let data = cursor.read(data_len)?.to_vec();
			if data_len % 2 == 1 {
				cursor.seek(SeekFrom::Current(1));
			}

			trace!(id, data_len, label = resource_label(id).unwrap_or("-"), "image resource");
			records.push(Resource {
				id,
				name,
				data_offset,
				data,
			});
		}

		if cursor.tell() > end {
			return Err(PsdError::malformed(Self::NAME, end, "record overruns section end"));
		}

		Ok(Resources { records })
	}
}

impl Skip for ResourcesSection {
	fn skip(&mut self, cursor: &mut Cursor) -> Result<usize> {
		let len = cursor.read_u32()? as usize;
		cursor.seek(SeekFrom::Current(len as i64));
		Ok(4 + len)
	}
}

fn fixed_16_16(raw: u32) -> f64 {
	f64::from(raw) / 65_536.0
}

/// Human-readable name for well-known resource ids.
pub fn resource_label(id: u16) -> Option<&'static str> {
	Some(match id {
		1005 => "resolution_info",
		1006 => "alpha_names",
		1010 => "background_color",
		1024 => "layer_state",
		1026 => "layer_groups",
		1028 => "iptc_naa",
		1032 => "grid_and_guides",
		1036 => "thumbnail",
		1037 => "global_angle",
		1039 => "icc_profile",
		1044 => "document_ids_seed",
		1045 => "unicode_alpha_names",
		1049 => "global_altitude",
		1050 => "slices",
		1053 => "alpha_identifiers",
		1054 => "url_list",
		1057 => "version_info",
		1058 => "exif_1",
		1060 => "xmp_metadata",
		1065 => "layer_comps",
		1069 => "layer_selection_ids",
		1077 => "display_info",
		2000..=2997 => "path",
		2999 => "clipping_path_name",
		3000 => "origin_path_info",
		10000 => "print_flags",
		_ => return None,
	})
}
