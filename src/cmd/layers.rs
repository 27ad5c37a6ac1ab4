use std::path::PathBuf;

use psdoc::psd::{Divider, Result};

use crate::cmd::util::{emit_json, open_parsed, render_code};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Include hidden group-end records.
	#[arg(long)]
	pub all: bool,
	#[arg(long)]
	pub json: bool,
}

#[derive(serde::Serialize)]
struct LayerRow {
	index: usize,
	name: String,
	kind: &'static str,
	visible: bool,
	opacity: u8,
	blend_mode: String,
	clipping: bool,
	top: i32,
	left: i32,
	bottom: i32,
	right: i32,
	channels: Vec<i16>,
	layer_id: Option<u32>,
	has_mask: bool,
	vector_anchors: usize,
	extra_blocks: Vec<String>,
}

#[derive(serde::Serialize)]
struct LayersJson {
	path: String,
	count: usize,
	merged_alpha: bool,
	layers: Vec<LayerRow>,
}

/// Decode and list layer records, top-most first.
pub fn run(args: Args) -> Result<()> {
	let mut doc = open_parsed(&args.path)?;
	let section = doc.layer_mask()?;

	let mut rows = Vec::new();
	for (index, layer) in section.layers.iter().enumerate() {
		if layer.is_folder_end() && !args.all {
			continue;
		}
		rows.push(LayerRow {
			index,
			name: layer.name().to_owned(),
			kind: divider_label(layer.divider),
			visible: layer.visible(),
			opacity: layer.opacity,
			blend_mode: layer.blend_mode.clone(),
			clipping: layer.clipping != 0,
			top: layer.top,
			left: layer.left,
			bottom: layer.bottom,
			right: layer.right,
			channels: layer.channels.iter().map(|channel| channel.id).collect(),
			layer_id: layer.layer_id,
			has_mask: layer.mask.is_some(),
			vector_anchors: layer.vector_mask.as_ref().map_or(0, |mask| mask.anchors().len()),
			extra_blocks: layer.unknown_blocks.iter().map(|(key, _)| render_code(*key)).collect(),
		});
	}

	let payload = LayersJson {
		path: args.path.display().to_string(),
		count: rows.len(),
		merged_alpha: section.merged_alpha,
		layers: rows,
	};

	if args.json {
		return emit_json(&payload);
	}

	println!("path: {}", payload.path);
	println!("layers: {}", payload.count);
	println!("merged_alpha: {}", payload.merged_alpha);
	println!("index\tkind\tvisible\topacity\tblend\tbounds\tname");
	for row in &payload.layers {
		println!(
			"{}\t{}\t{}\t{}\t{}\t{},{},{},{}\t{}",
			row.index, row.kind, row.visible, row.opacity, row.blend_mode, row.top, row.left, row.bottom, row.right, row.name
		);
	}
	Ok(())
}

fn divider_label(divider: Divider) -> &'static str {
	match divider {
		Divider::Other => "layer",
		Divider::OpenFolder => "group",
		Divider::ClosedFolder => "group_closed",
		Divider::BoundingDivider => "group_end",
	}
}
