use std::io::SeekFrom;

use psdoc_testkit::{LayerSpec, PsdBuilder};

use crate::psd::bytes::Cursor;
use crate::psd::deferred::SectionHandle;
use crate::psd::layer::Divider;
use crate::psd::layer_mask::LayerMaskSection;
use crate::psd::path::PathRecord;
use crate::psd::{Header, LayerMask, PsdError};

fn staged(builder: &PsdBuilder) -> (Cursor, SectionHandle<LayerMaskSection>, psdoc_testkit::Layout) {
	let (bytes, layout) = builder.build_with_layout();
	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	cursor.seek(SeekFrom::Start(layout.layer_mask_start as u64));
	let handle = SectionHandle::skip_now(LayerMaskSection::new(&header), &mut cursor).expect("skip succeeds");
	(cursor, handle, layout)
}

fn materialize(builder: &PsdBuilder) -> LayerMask {
	let (mut cursor, mut handle, _) = staged(builder);
	handle.get_or_materialize(&mut cursor).expect("parse succeeds").clone()
}

#[test]
fn skip_lands_on_image_section() {
	let builder = PsdBuilder::new(8, 8).layer(LayerSpec::new("Background").bounds(0, 0, 8, 8));
	let (cursor, handle, layout) = staged(&builder);

	assert_eq!(cursor.tell(), layout.image_start);
	assert_eq!(handle.start_offset(), layout.layer_mask_start);
	assert_eq!(handle.skipped_len(), Some(layout.image_start - layout.layer_mask_start));
	assert!(!handle.is_materialized());
}

#[test]
fn layers_come_back_top_most_first() {
	let mut top = LayerSpec::new("legacy").bounds(1, 2, 5, 7);
	top.unicode_name = Some("Tête".to_owned());
	top.layer_id = Some(42);
	top.opacity = 128;
	top.knockout = Some(true);
	let builder = PsdBuilder::new(8, 8)
		.layer(top)
		.layer(LayerSpec::new("Background").bounds(0, 0, 8, 8).hidden());

	let layer_mask = materialize(&builder);
	assert_eq!(layer_mask.layers.len(), 2);

	let first = &layer_mask.layers[0];
	assert_eq!(first.name(), "Tête");
	assert_eq!(first.legacy_name, "legacy");
	assert_eq!((first.top, first.left, first.bottom, first.right), (1, 2, 5, 7));
	assert_eq!((first.width(), first.height()), (5, 4));
	assert_eq!(first.layer_id, Some(42));
	assert_eq!(first.opacity, 128);
	assert_eq!(first.knockout, Some(true));
	assert_eq!(first.blend_mode, "norm");
	assert!(first.visible());

	let second = &layer_mask.layers[1];
	assert_eq!(second.name(), "Background");
	assert!(!second.visible());
	assert_eq!(second.channels.len(), 4);
}

#[test]
fn channel_offsets_point_at_compression_tags() {
	let builder = PsdBuilder::new(4, 4)
		.layer(LayerSpec::new("top").bounds(0, 0, 2, 2))
		.layer(LayerSpec::new("bottom").bounds(0, 0, 1, 3));
	let (mut cursor, mut handle, _) = staged(&builder);
	let layer_mask = handle.get_or_materialize(&mut cursor).expect("parse succeeds").clone();

	for layer in &layer_mask.layers {
		for channel in &layer.channels {
			assert_eq!(channel.length, u64::from(layer.width() * layer.height()) + 2);
			cursor.seek(SeekFrom::Start(channel.data_offset as u64));
			assert_eq!(cursor.read_u16().expect("compression tag"), 0);
		}
	}

	let bottom = &layer_mask.layers[1];
	let top = &layer_mask.layers[0];
	assert!(bottom.channels[0].data_offset < top.channels[0].data_offset, "bottom layer data is stored first");
}

#[test]
fn dividers_and_masks_are_decoded() {
	let mut child = LayerSpec::new("child").bounds(0, 0, 2, 2);
	child.mask = Some((0, 0, 2, 2, 255, 0x03));
	let builder = PsdBuilder::new(4, 4)
		.layer(LayerSpec::group("Group"))
		.layer(child)
		.layer(LayerSpec::group_end());

	let layer_mask = materialize(&builder);
	assert_eq!(layer_mask.layers[0].divider, Divider::OpenFolder);
	assert!(layer_mask.layers[0].is_folder());
	assert_eq!(layer_mask.layers[0].blend_mode, "pass");
	assert!(layer_mask.layers[2].is_folder_end());

	let mask = layer_mask.layers[1].mask.expect("mask present");
	assert_eq!(mask.default_color, 255);
	assert!(mask.relative());
	assert!(mask.disabled());
}

#[test]
fn vector_mask_anchors_use_fixed_point() {
	let mut shape = LayerSpec::new("shape").bounds(0, 0, 4, 4);
	shape.vector_mask = vec![(0.25, 0.5), (0.75, 0.5), (0.5, 1.0)];
	let layer_mask = materialize(&PsdBuilder::new(4, 4).layer(shape));

	let mask = layer_mask.layers[0].vector_mask.as_ref().expect("vector mask present");
	assert_eq!(mask.version, 3);
	assert!(matches!(mask.records[0], PathRecord::FillRule));
	assert!(matches!(mask.records[1], PathRecord::Subpath { closed: true, knots: 3 }));
	let anchors: Vec<(f64, f64)> = mask.anchors().into_iter().map(|point| (point.x, point.y)).collect();
	assert_eq!(anchors, vec![(0.25, 0.5), (0.75, 0.5), (0.5, 1.0)]);
}

#[test]
fn unknown_blocks_are_recorded_and_skipped() {
	let mut layer = LayerSpec::new("fx");
	layer.extra = vec![(*b"lfx2", vec![9; 5]), (*b"iOpa", vec![200, 0, 0, 0])];
	layer.layer_id = Some(7);
	let layer_mask = materialize(&PsdBuilder::new(2, 2).layer(layer));

	let layer = &layer_mask.layers[0];
	assert_eq!(layer.layer_id, Some(7));
	assert_eq!(layer.unknown_blocks, vec![(*b"lfx2", 6), (*b"iOpa", 4)]);
}

#[test]
fn merged_alpha_and_global_mask() {
	let builder = PsdBuilder::new(2, 2)
		.layer(LayerSpec::new("only").bounds(0, 0, 2, 2))
		.merged_alpha()
		.global_mask(0, [0xFFFF, 0x8000, 0, 0x0100], 50, 128);
	let layer_mask = materialize(&builder);

	assert!(layer_mask.merged_alpha);
	let global = layer_mask.global_mask.expect("global mask present");
	assert_eq!(global.overlay.components, [0xFF, 0x80, 0x00, 0x01]);
	assert_eq!(global.opacity, 50);
	assert_eq!(global.kind, 128);
}

#[test]
fn empty_section_has_no_layers() {
	let layer_mask = materialize(&PsdBuilder::new(2, 2));
	assert!(layer_mask.layers.is_empty());
	assert!(layer_mask.global_mask.is_none());
}

#[test]
fn large_document_uses_wide_lengths() {
	let builder = PsdBuilder::new(4, 4).psb().layer(LayerSpec::new("big").bounds(0, 0, 4, 4));
	let (mut cursor, mut handle, layout) = staged(&builder);
	assert_eq!(cursor.tell(), layout.image_start);

	let layer_mask = handle.get_or_materialize(&mut cursor).expect("parse succeeds");
	assert_eq!(layer_mask.layers[0].name(), "big");
	assert_eq!(layer_mask.layers[0].channels[0].length, 18);
}

#[test]
fn bad_blend_signature_surfaces_on_access() {
	let builder = PsdBuilder::new(2, 2).layer(LayerSpec::new("x"));
	let (mut bytes, layout) = builder.build_with_layout();
	let pos = bytes.windows(4).position(|window| window == b"8BIM").expect("blend signature present");
	assert!(pos > layout.layer_mask_start);
	bytes[pos..pos + 4].copy_from_slice(b"nope");

	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	cursor.seek(SeekFrom::Start(layout.layer_mask_start as u64));
	let mut handle = SectionHandle::skip_now(LayerMaskSection::new(&header), &mut cursor).expect("skip succeeds");

	let err = handle.get_or_materialize(&mut cursor).expect_err("signature is invalid");
	assert!(matches!(err, PsdError::MaterializationFailure { section: "layer_mask", .. }));
}

fn patched_failure(mut bytes: Vec<u8>, layout: &psdoc_testkit::Layout, patch: impl FnOnce(&mut Vec<u8>)) -> std::sync::Arc<PsdError> {
	patch(&mut bytes);
	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	cursor.seek(SeekFrom::Start(layout.layer_mask_start as u64));
	let mut handle = SectionHandle::skip_now(LayerMaskSection::new(&header), &mut cursor).expect("skip only reads the outer length");

	let err = handle.get_or_materialize(&mut cursor).expect_err("declared length cannot be decoded");
	let PsdError::MaterializationFailure { section: "layer_mask", source } = err else {
		panic!("expected materialization failure");
	};
	source
}

#[test]
fn oversized_wide_layer_info_length_fails_on_access() {
	let (bytes, layout) = PsdBuilder::new(4, 4).psb().layer(LayerSpec::new("big").bounds(0, 0, 4, 4)).build_with_layout();
	let at = layout.layer_mask_start + 8;
	let source = patched_failure(bytes, &layout, |bytes| bytes[at..at + 8].copy_from_slice(&i64::MAX.to_be_bytes()));
	assert!(matches!(*source, PsdError::OutOfBounds { .. }));
}

#[test]
fn oversized_wide_channel_length_fails_on_access() {
	let (bytes, layout) = PsdBuilder::new(4, 4).psb().layer(LayerSpec::new("big").bounds(0, 0, 4, 4)).build_with_layout();
	// Section length, layer info length, count, bounds, channel count, first channel id.
	let at = layout.layer_mask_start + 8 + 8 + 2 + 16 + 2 + 2;
	let source = patched_failure(bytes, &layout, |bytes| bytes[at..at + 8].copy_from_slice(&i64::MAX.to_be_bytes()));
	assert!(matches!(*source, PsdError::MalformedSection { section: "layer_mask", .. }));
}

#[test]
fn oversized_vector_mask_length_fails_on_access() {
	let mut shape = LayerSpec::new("shape").bounds(0, 0, 4, 4);
	shape.vector_mask = vec![(0.25, 0.5), (0.75, 0.5), (0.5, 1.0)];
	let (bytes, layout) = PsdBuilder::new(4, 4).layer(shape).build_with_layout();
	let key = bytes.windows(4).position(|window| window == b"vmsk").expect("vector mask block present");
	let source = patched_failure(bytes, &layout, |bytes| bytes[key + 4..key + 8].copy_from_slice(&0xFFFF_FFF0_u32.to_be_bytes()));
	assert!(matches!(*source, PsdError::MalformedSection { section: "vector_mask", .. }));
}
