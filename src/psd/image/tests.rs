use std::io::SeekFrom;

use psdoc_testkit::PsdBuilder;

use crate::psd::bytes::Cursor;
use crate::psd::deferred::SectionHandle;
use crate::psd::image::{Compression, ImageSection};
use crate::psd::{Header, PsdError};

fn deferred(builder: &PsdBuilder) -> (Cursor, SectionHandle<ImageSection>) {
	let (bytes, layout) = builder.build_with_layout();
	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	cursor.seek(SeekFrom::Start(layout.image_start as u64));
	let handle = SectionHandle::defer(ImageSection::new(&header), &cursor);
	(cursor, handle)
}

#[test]
fn raw_planes_decode_from_recorded_offset() {
	let builder = PsdBuilder::new(3, 2);
	let (mut cursor, mut handle) = deferred(&builder);
	cursor.seek(SeekFrom::Start(0));

	let image = handle.get_or_materialize(&mut cursor).expect("image decodes");
	assert_eq!(image.compression, Compression::Raw);
	assert_eq!(image.planes, builder.composite_planes());
	assert_eq!(image.channel_count(), 3);
	assert_eq!(image.sample_u8(1, 2, 1), Some(15));
	assert_eq!(image.sample_u8(1, 3, 0), None);
}

#[test]
fn rle_planes_decode() {
	let planes = vec![vec![1, 1, 1, 1, 2, 3, 4, 5], vec![9; 8], vec![0, 1, 0, 1, 0, 1, 0, 1]];
	let builder = PsdBuilder::new(4, 2).rle().planes(planes.clone());
	let (mut cursor, mut handle) = deferred(&builder);

	let image = handle.get_or_materialize(&mut cursor).expect("image decodes");
	assert_eq!(image.compression, Compression::Rle);
	assert_eq!(image.planes, planes);
}

#[test]
fn rle_large_document_uses_wide_row_counts() {
	let planes = vec![vec![7; 6], vec![8; 6], vec![1, 2, 3, 4, 5, 6]];
	let builder = PsdBuilder::new(3, 2).psb().rle().planes(planes.clone());
	let (mut cursor, mut handle) = deferred(&builder);

	assert_eq!(handle.get_or_materialize(&mut cursor).expect("image decodes").planes, planes);
}

#[test]
fn sixteen_bit_rows_are_twice_as_wide() {
	let builder = PsdBuilder::new(2, 2).depth(16).channels(1);
	let (mut cursor, mut handle) = deferred(&builder);

	let image = handle.get_or_materialize(&mut cursor).expect("image decodes");
	assert_eq!(image.planes[0].len(), 8);
	assert_eq!(image.sample_u8(0, 0, 0), None);
}

#[test]
fn width_and_height_are_exempt() {
	let (_cursor, handle) = deferred(&PsdBuilder::new(640, 1).channels(1));
	assert_eq!(handle.exempt().width(), 640);
	assert_eq!(handle.exempt().height(), 1);
	assert!(!handle.is_materialized());
}

#[test]
fn zip_compression_is_reported() {
	let (mut bytes, layout) = PsdBuilder::new(1, 1).build_with_layout();
	bytes[layout.image_start + 1] = 2;
	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	cursor.seek(SeekFrom::Start(layout.image_start as u64));
	let mut handle = SectionHandle::defer(ImageSection::new(&header), &cursor);

	let err = handle.get_or_materialize(&mut cursor).expect_err("zip is not decoded");
	let PsdError::MaterializationFailure { source, .. } = err else {
		panic!("expected materialization failure");
	};
	assert!(matches!(*source, PsdError::UnsupportedCompression { code: 2 }));
}

#[test]
fn truncated_pixels_fail_at_access() {
	let (mut bytes, _) = PsdBuilder::new(4, 4).build_with_layout();
	bytes.truncate(bytes.len() - 3);
	let mut cursor = Cursor::new(bytes);
	let header = Header::parse(&mut cursor).expect("header parses");
	let image_start = cursor.len() - (4 * 4 * 3 - 3) - 2;
	cursor.seek(SeekFrom::Start(image_start as u64));
	let mut handle = SectionHandle::defer(ImageSection::new(&header), &cursor);

	let err = handle.get_or_materialize(&mut cursor).expect_err("pixels are truncated");
	let PsdError::MaterializationFailure { source, .. } = err else {
		panic!("expected materialization failure");
	};
	assert!(matches!(*source, PsdError::OutOfBounds { .. }));
}

fn materialization_source(builder: &PsdBuilder) -> std::sync::Arc<PsdError> {
	let (mut cursor, mut handle) = deferred(builder);
	let err = handle.get_or_materialize(&mut cursor).expect_err("declared size cannot be decoded");
	let PsdError::MaterializationFailure { section: "image", source } = err else {
		panic!("expected materialization failure");
	};
	source
}

#[test]
fn overflowing_dimensions_are_malformed() {
	let builder = PsdBuilder::new(u32::MAX, u32::MAX).depth(16).planes(Vec::new());
	let source = materialization_source(&builder);
	assert!(matches!(*source, PsdError::MalformedSection { section: "image", .. }));
}

#[test]
fn raw_planes_larger_than_the_buffer_fail_before_decoding() {
	let builder = PsdBuilder::new(1, u32::MAX).planes(Vec::new());
	let source = materialization_source(&builder);
	assert!(matches!(*source, PsdError::OutOfBounds { need, rem: 0, .. } if need == 3 * u32::MAX as usize));
}

#[test]
fn rle_count_table_larger_than_the_buffer_fails() {
	let builder = PsdBuilder::new(1, u32::MAX).rle().planes(Vec::new());
	let source = materialization_source(&builder);
	assert!(matches!(*source, PsdError::OutOfBounds { need, .. } if need == 3 * u32::MAX as usize * 2));

	let builder = PsdBuilder::new(1, u32::MAX).psb().rle().planes(Vec::new());
	let source = materialization_source(&builder);
	assert!(matches!(*source, PsdError::OutOfBounds { need, .. } if need == 3 * u32::MAX as usize * 4));
}
