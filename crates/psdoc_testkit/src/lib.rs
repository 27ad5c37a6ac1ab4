//! Shared test helpers: synthesized documents and CLI output parsing.

use std::process::Output;

/// Byte offsets of each top-level section in a built document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
	/// First byte of the image resources section (its length prefix).
	pub resources_start: usize,
	/// First byte of the layer/mask section (its length prefix).
	pub layer_mask_start: usize,
	/// First byte of the composite image section.
	pub image_start: usize,
	/// Total document length.
	pub len: usize,
}

/// One layer record to synthesize.
#[derive(Debug, Clone)]
pub struct LayerSpec {
	/// Legacy Pascal name.
	pub name: String,
	/// Optional `luni` unicode name.
	pub unicode_name: Option<String>,
	/// `(top, left, bottom, right)`.
	pub bounds: (i32, i32, i32, i32),
	/// Opacity byte.
	pub opacity: u8,
	/// Clipping byte.
	pub clipping: u8,
	/// Sets the hidden flag bit.
	pub hidden: bool,
	/// Blend mode key.
	pub blend_key: [u8; 4],
	/// Optional `lsct` divider type.
	pub divider: Option<u32>,
	/// Optional `lyid` value.
	pub layer_id: Option<u32>,
	/// Optional `knko` flag.
	pub knockout: Option<bool>,
	/// Optional layer mask `(top, left, bottom, right, default_color, flags)`.
	pub mask: Option<(i32, i32, i32, i32, u8, u8)>,
	/// Closed vector mask path as `(x, y)` anchors in document-relative units.
	pub vector_mask: Vec<(f64, f64)>,
	/// Extra raw additional-info blocks `(key, data)`.
	pub extra: Vec<([u8; 4], Vec<u8>)>,
	/// Channel `(id, raw samples)`; empty means one byte per pixel for -1, 0, 1, 2.
	pub channels: Vec<(i16, Vec<u8>)>,
}

impl LayerSpec {
	/// Visible normal layer with empty bounds.
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_owned(),
			unicode_name: None,
			bounds: (0, 0, 0, 0),
			opacity: 255,
			clipping: 0,
			hidden: false,
			blend_key: *b"norm",
			divider: None,
			layer_id: None,
			knockout: None,
			mask: None,
			vector_mask: Vec::new(),
			extra: Vec::new(),
			channels: Vec::new(),
		}
	}

	/// Open-folder divider record (group start when read top-down).
	pub fn group(name: &str) -> Self {
		let mut spec = Self::new(name);
		spec.divider = Some(1);
		spec.blend_key = *b"pass";
		spec
	}

	/// Bounding divider record (group end when read top-down).
	pub fn group_end() -> Self {
		let mut spec = Self::new("</Layer group>");
		spec.divider = Some(3);
		spec
	}

	/// Set bounds.
	pub fn bounds(mut self, top: i32, left: i32, bottom: i32, right: i32) -> Self {
		self.bounds = (top, left, bottom, right);
		self
	}

	/// Mark hidden.
	pub fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	fn pixel_count(&self) -> usize {
		let (top, left, bottom, right) = self.bounds;
		((bottom - top).max(0) as usize) * ((right - left).max(0) as usize)
	}

	fn channel_data(&self) -> Vec<(i16, Vec<u8>)> {
		if !self.channels.is_empty() {
			return self.channels.clone();
		}
		let count = self.pixel_count();
		[-1_i16, 0, 1, 2].into_iter().map(|id| (id, vec![0x7F_u8; count])).collect()
	}
}

/// Builder for minimal but structurally complete documents.
#[derive(Debug, Clone)]
pub struct PsdBuilder {
	version: u16,
	channels: u16,
	width: u32,
	height: u32,
	depth: u16,
	mode: u16,
	color_data: Vec<u8>,
	resources: Vec<(u16, String, Vec<u8>)>,
	layers: Vec<LayerSpec>,
	merged_alpha: bool,
	global_mask: Option<(i16, [u16; 4], u16, u8)>,
	rle: bool,
	planes: Option<Vec<Vec<u8>>>,
}

impl PsdBuilder {
	/// 8-bit RGB document with three channels.
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			version: 1,
			channels: 3,
			width,
			height,
			depth: 8,
			mode: 3,
			color_data: Vec::new(),
			resources: Vec::new(),
			layers: Vec::new(),
			merged_alpha: false,
			global_mask: None,
			rle: false,
			planes: None,
		}
	}

	/// Switch to the large-document variant.
	pub fn psb(mut self) -> Self {
		self.version = 2;
		self
	}

	/// Override channel count.
	pub fn channels(mut self, channels: u16) -> Self {
		self.channels = channels;
		self
	}

	/// Override bit depth.
	pub fn depth(mut self, depth: u16) -> Self {
		self.depth = depth;
		self
	}

	/// Override color mode code.
	pub fn mode(mut self, mode: u16) -> Self {
		self.mode = mode;
		self
	}

	/// Set color mode data.
	pub fn color_data(mut self, data: Vec<u8>) -> Self {
		self.color_data = data;
		self
	}

	/// Append an `8BIM` image resource.
	pub fn resource(mut self, id: u16, name: &str, data: Vec<u8>) -> Self {
		self.resources.push((id, name.to_owned(), data));
		self
	}

	/// Append a layer record; records are given top-most first.
	pub fn layer(mut self, spec: LayerSpec) -> Self {
		self.layers.push(spec);
		self
	}

	/// Write a negative layer count.
	pub fn merged_alpha(mut self) -> Self {
		self.merged_alpha = true;
		self
	}

	/// Append global layer mask info.
	pub fn global_mask(mut self, color_space: i16, components: [u16; 4], opacity: u16, kind: u8) -> Self {
		self.global_mask = Some((color_space, components, opacity, kind));
		self
	}

	/// Encode the composite image with PackBits.
	pub fn rle(mut self) -> Self {
		self.rle = true;
		self
	}

	/// Explicit composite planes, one per channel, `row_bytes * height` each.
	pub fn planes(mut self, planes: Vec<Vec<u8>>) -> Self {
		self.planes = Some(planes);
		self
	}

	/// Bytes per row of one composite plane.
	pub fn row_bytes(&self) -> usize {
		(self.width as usize * usize::from(self.depth)).div_ceil(8)
	}

	/// Composite planes that `build` will write.
	pub fn composite_planes(&self) -> Vec<Vec<u8>> {
		if let Some(planes) = &self.planes {
			return planes.clone();
		}
		let plane_len = self.row_bytes() * self.height as usize;
		(0..self.channels).map(|channel| (0..plane_len).map(|i| (i as u8).wrapping_add(channel as u8 * 10)).collect()).collect()
	}

	/// Serialize the document.
	pub fn build(&self) -> Vec<u8> {
		self.build_with_layout().0
	}

	/// Serialize the document and report section offsets.
	pub fn build_with_layout(&self) -> (Vec<u8>, Layout) {
		let mut out = Vec::new();
		out.extend_from_slice(b"8BPS");
		put_u16(&mut out, self.version);
		out.extend_from_slice(&[0; 6]);
		put_u16(&mut out, self.channels);
		put_u32(&mut out, self.height);
		put_u32(&mut out, self.width);
		put_u16(&mut out, self.depth);
		put_u16(&mut out, self.mode);
		put_u32(&mut out, self.color_data.len() as u32);
		out.extend_from_slice(&self.color_data);

		let resources_start = out.len();
		let resources = self.resources_bytes();
		put_u32(&mut out, resources.len() as u32);
		out.extend_from_slice(&resources);

		let layer_mask_start = out.len();
		let layer_mask = self.layer_mask_bytes();
		self.put_len(&mut out, layer_mask.len());
		out.extend_from_slice(&layer_mask);

		let image_start = out.len();
		out.extend_from_slice(&self.image_bytes());

		let len = out.len();
		(
			out,
			Layout {
				resources_start,
				layer_mask_start,
				image_start,
				len,
			},
		)
	}

	fn put_len(&self, out: &mut Vec<u8>, len: usize) {
		if self.version == 2 {
			out.extend_from_slice(&(len as u64).to_be_bytes());
		} else {
			put_u32(out, len as u32);
		}
	}

	fn resources_bytes(&self) -> Vec<u8> {
		let mut out = Vec::new();
		for (id, name, data) in &self.resources {
			out.extend_from_slice(b"8BIM");
			put_u16(&mut out, *id);
			put_pascal(&mut out, name, 2);
			put_u32(&mut out, data.len() as u32);
			out.extend_from_slice(data);
			if data.len() % 2 == 1 {
				out.push(0);
			}
		}
		out
	}

	fn layer_mask_bytes(&self) -> Vec<u8> {
		let mut out = Vec::new();
		if self.layers.is_empty() && self.global_mask.is_none() {
			return out;
		}

		let mut info = Vec::new();
		if !self.layers.is_empty() {
			let count = self.layers.len() as i16;
			put_u16(&mut info, if self.merged_alpha { (-count) as u16 } else { count as u16 });

			// File order is bottom-most first.
			let ordered: Vec<&LayerSpec> = self.layers.iter().rev().collect();
			for spec in &ordered {
				self.put_layer_record(&mut info, spec);
			}
			for spec in &ordered {
				for (_, data) in spec.channel_data() {
					put_u16(&mut info, 0);
					info.extend_from_slice(&data);
				}
			}
			if info.len() % 2 == 1 {
				info.push(0);
			}
		}
		self.put_len(&mut out, info.len());
		out.extend_from_slice(&info);

		match self.global_mask {
			Some((color_space, components, opacity, kind)) => {
				put_u32(&mut out, 16);
				put_u16(&mut out, color_space as u16);
				for component in components {
					put_u16(&mut out, component);
				}
				put_u16(&mut out, opacity);
				out.push(kind);
				out.extend_from_slice(&[0; 3]);
			}
			None => put_u32(&mut out, 0),
		}
		out
	}

	fn put_layer_record(&self, out: &mut Vec<u8>, spec: &LayerSpec) {
		let (top, left, bottom, right) = spec.bounds;
		for value in [top, left, bottom, right] {
			out.extend_from_slice(&value.to_be_bytes());
		}

		let channels = spec.channel_data();
		put_u16(out, channels.len() as u16);
		for (id, data) in &channels {
			out.extend_from_slice(&id.to_be_bytes());
			self.put_len(out, data.len() + 2);
		}

		out.extend_from_slice(b"8BIM");
		out.extend_from_slice(&spec.blend_key);
		out.push(spec.opacity);
		out.push(spec.clipping);
		out.push(if spec.hidden { 0x02 } else { 0x00 });
		out.push(0);

		let mut extra = Vec::new();
		match spec.mask {
			Some((mtop, mleft, mbottom, mright, default_color, flags)) => {
				put_u32(&mut extra, 20);
				for value in [mtop, mleft, mbottom, mright] {
					extra.extend_from_slice(&value.to_be_bytes());
				}
				extra.push(default_color);
				extra.push(flags);
				extra.extend_from_slice(&[0, 0]);
			}
			None => put_u32(&mut extra, 0),
		}
		put_u32(&mut extra, 0);
		put_pascal(&mut extra, &spec.name, 4);

		if let Some(name) = &spec.unicode_name {
			let mut data = Vec::new();
			let units: Vec<u16> = name.encode_utf16().collect();
			put_u32(&mut data, units.len() as u32);
			for unit in units {
				put_u16(&mut data, unit);
			}
			put_block(&mut extra, *b"luni", &data);
		}
		if let Some(divider) = spec.divider {
			put_block(&mut extra, *b"lsct", &divider.to_be_bytes());
		}
		if let Some(id) = spec.layer_id {
			put_block(&mut extra, *b"lyid", &id.to_be_bytes());
		}
		if let Some(knockout) = spec.knockout {
			put_block(&mut extra, *b"knko", &[u8::from(knockout), 0, 0, 0]);
		}
		if !spec.vector_mask.is_empty() {
			put_block(&mut extra, *b"vmsk", &vector_mask_bytes(&spec.vector_mask));
		}
		for (key, data) in &spec.extra {
			put_block(&mut extra, *key, data);
		}

		put_u32(out, extra.len() as u32);
		out.extend_from_slice(&extra);
	}

	fn image_bytes(&self) -> Vec<u8> {
		let planes = self.composite_planes();
		let mut out = Vec::new();
		if !self.rle {
			put_u16(&mut out, 0);
			for plane in &planes {
				out.extend_from_slice(plane);
			}
			return out;
		}

		put_u16(&mut out, 1);
		let row_bytes = self.row_bytes().max(1);
		let mut rows = Vec::new();
		for plane in &planes {
			for row in plane.chunks(row_bytes) {
				rows.push(packbits(row));
			}
		}
		for row in &rows {
			if self.version == 2 {
				put_u32(&mut out, row.len() as u32);
			} else {
				put_u16(&mut out, row.len() as u16);
			}
		}
		for row in rows {
			out.extend_from_slice(&row);
		}
		out
	}
}

/// PackBits-encode one row: repeat runs of three or more, literals otherwise.
pub fn packbits(row: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	let mut literal: Vec<u8> = Vec::new();
	let mut i = 0;
	while i < row.len() {
		let mut run = 1;
		while i + run < row.len() && row[i + run] == row[i] && run < 128 {
			run += 1;
		}
		if run >= 3 {
			flush_literal(&mut out, &mut literal);
			out.push((1_i16 - run as i16) as u8);
			out.push(row[i]);
			i += run;
		} else {
			literal.push(row[i]);
			if literal.len() == 128 {
				flush_literal(&mut out, &mut literal);
			}
			i += 1;
		}
	}
	flush_literal(&mut out, &mut literal);
	out
}

fn flush_literal(out: &mut Vec<u8>, literal: &mut Vec<u8>) {
	if literal.is_empty() {
		return;
	}
	out.push((literal.len() - 1) as u8);
	out.append(literal);
}

fn vector_mask_bytes(anchors: &[(f64, f64)]) -> Vec<u8> {
	let mut out = Vec::new();
	put_u32(&mut out, 3);
	put_u32(&mut out, 0);

	put_u16(&mut out, 6);
	out.extend_from_slice(&[0; 24]);

	put_u16(&mut out, 0);
	put_u16(&mut out, anchors.len() as u16);
	out.extend_from_slice(&[0; 22]);

	for (x, y) in anchors {
		put_u16(&mut out, 1);
		for _ in 0..3 {
			put_fixed(&mut out, *y);
			put_fixed(&mut out, *x);
		}
	}
	out
}

/// Encode a signed 8.24 fixed-point number.
pub fn fixed_8_24(value: f64) -> [u8; 4] {
	let int_part = value.floor();
	let frac = ((value - int_part) * f64::from(1_u32 << 24)).round() as u32;
	let frac = frac.to_be_bytes();
	[(int_part as i8) as u8, frac[1], frac[2], frac[3]]
}

fn put_fixed(out: &mut Vec<u8>, value: f64) {
	out.extend_from_slice(&fixed_8_24(value));
}

fn put_block(out: &mut Vec<u8>, key: [u8; 4], data: &[u8]) {
	out.extend_from_slice(b"8BIM");
	out.extend_from_slice(&key);
	let padded = data.len() + data.len() % 2;
	put_u32(out, padded as u32);
	out.extend_from_slice(data);
	if data.len() % 2 == 1 {
		out.push(0);
	}
}

fn put_pascal(out: &mut Vec<u8>, text: &str, pad: usize) {
	let bytes = text.as_bytes();
	out.push(bytes.len() as u8);
	out.extend_from_slice(bytes);
	let used = bytes.len() + 1;
	let padded = used.div_ceil(pad) * pad;
	out.resize(out.len() + (padded - used), 0);
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
	out.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
	out.extend_from_slice(&value.to_be_bytes());
}

/// Parse a successful command's stdout as JSON.
pub fn stdout_json(output: &Output) -> serde_json::Value {
	assert!(
		output.status.success(),
		"command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
