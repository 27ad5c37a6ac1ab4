use std::path::Path;

use tracing::{debug, warn};

use crate::psd::bytes::Cursor;
use crate::psd::deferred::SectionHandle;
use crate::psd::image::ImageSection;
use crate::psd::layer_mask::LayerMaskSection;
use crate::psd::resources::ResourcesSection;
use crate::psd::source::{self, LoadOptions, Wrapping};
use crate::psd::{Header, Image, Layer, LayerMask, PsdError, Resources, Result};

/// Parse pipeline position. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
	/// Nothing read yet.
	Unparsed,
	/// Header and color mode data decoded.
	HeaderParsed,
	/// Image resources skipped.
	ResourcesStaged,
	/// Layer/mask section skipped.
	LayerMaskStaged,
	/// Composite image deferred.
	ImageStaged,
	/// All stages complete.
	Parsed,
}

impl Stage {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unparsed => "unparsed",
			Self::HeaderParsed => "header",
			Self::ResourcesStaged => "resources",
			Self::LayerMaskStaged => "layer_mask",
			Self::ImageStaged => "image",
			Self::Parsed => "parsed",
		}
	}
}

/// A document buffer plus its section handles.
///
/// `parse()` reads the header and skips over the remaining sections; each
/// section is decoded on first access through its accessor.
#[derive(Debug)]
pub struct Document {
	cursor: Cursor,
	wrapping: Wrapping,
	stage: Stage,
	failed: bool,
	header: Option<Header>,
	resources: Option<SectionHandle<ResourcesSection>>,
	layer_mask: Option<SectionHandle<LayerMaskSection>>,
	image: Option<SectionHandle<ImageSection>>,
}

impl Document {
	/// Wrap a complete document buffer.
	pub fn from_bytes(bytes: Vec<u8>) -> Self {
		Self::with_wrapping(bytes, Wrapping::None)
	}

	/// Read a document from disk with default limits.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		Self::open_with(path, &LoadOptions::default())
	}

	/// Read a document from disk.
	pub fn open_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
		let (wrapping, bytes) = source::load(path, options)?;
		Ok(Self::with_wrapping(bytes, wrapping))
	}

	fn with_wrapping(bytes: Vec<u8>, wrapping: Wrapping) -> Self {
		Self {
			cursor: Cursor::new(bytes),
			wrapping,
			stage: Stage::Unparsed,
			failed: false,
			header: None,
			resources: None,
			layer_mask: None,
			image: None,
		}
	}

	/// Run the pipeline. Idempotent once it has succeeded.
	pub fn parse(&mut self) -> Result<()> {
		if self.stage == Stage::Parsed {
			return Ok(());
		}
		if self.failed {
			return Err(PsdError::ParseAborted { stage: self.stage.as_str() });
		}

		match self.run_stages() {
			Ok(()) => {
				self.stage = Stage::Parsed;
				debug!(len = self.cursor.len(), "document parsed");
				Ok(())
			}
			Err(err) => {
				warn!(stage = self.stage.as_str(), error = %err, "document parse failed");
				self.failed = true;
				Err(err)
			}
		}
	}

	fn run_stages(&mut self) -> Result<()> {
		let header = Header::parse(&mut self.cursor)?;
		let layer_mask = LayerMaskSection::new(&header);
		let image = ImageSection::new(&header);
		self.header = Some(header);
		self.advance(Stage::HeaderParsed);

		self.resources = Some(SectionHandle::skip_now(ResourcesSection, &mut self.cursor)?);
		self.advance(Stage::ResourcesStaged);

		self.layer_mask = Some(SectionHandle::skip_now(layer_mask, &mut self.cursor)?);
		self.advance(Stage::LayerMaskStaged);

		self.image = Some(SectionHandle::defer(image, &self.cursor));
		self.advance(Stage::ImageStaged);
		Ok(())
	}

	fn advance(&mut self, stage: Stage) {
		debug!(stage = stage.as_str(), at = self.cursor.tell(), "stage complete");
		self.stage = stage;
	}

	/// Current pipeline stage.
	pub fn stage(&self) -> Stage {
		self.stage
	}

	/// Whether `parse()` completed.
	pub fn is_parsed(&self) -> bool {
		self.stage == Stage::Parsed
	}

	/// How the source bytes were stored.
	pub fn wrapping(&self) -> Wrapping {
		self.wrapping
	}

	/// Shared cursor, for position and read-count inspection.
	pub fn cursor(&self) -> &Cursor {
		&self.cursor
	}

	/// Parsed header, once the header stage completed.
	pub fn header(&self) -> Option<&Header> {
		self.header.as_ref()
	}

	/// Resources handle, once staged.
	pub fn resources_handle(&self) -> Option<&SectionHandle<ResourcesSection>> {
		self.resources.as_ref()
	}

	/// Layer/mask handle, once staged.
	pub fn layer_mask_handle(&self) -> Option<&SectionHandle<LayerMaskSection>> {
		self.layer_mask.as_ref()
	}

	/// Composite image handle, once staged.
	pub fn image_handle(&self) -> Option<&SectionHandle<ImageSection>> {
		self.image.as_ref()
	}

	/// Decoded image resources.
	pub fn resources(&mut self) -> Result<&Resources> {
		self.resources.as_mut().ok_or(PsdError::NotParsed)?.get_or_materialize(&mut self.cursor)
	}

	/// Decoded layer/mask section.
	pub fn layer_mask(&mut self) -> Result<&LayerMask> {
		self.layer_mask.as_mut().ok_or(PsdError::NotParsed)?.get_or_materialize(&mut self.cursor)
	}

	/// Layers, top-most first.
	pub fn layers(&mut self) -> Result<&[Layer]> {
		Ok(&self.layer_mask()?.layers)
	}

	/// Decoded composite image.
	pub fn image(&mut self) -> Result<&Image> {
		self.image.as_mut().ok_or(PsdError::NotParsed)?.get_or_materialize(&mut self.cursor)
	}

	/// Composite width without decoding pixels.
	pub fn image_width(&self) -> Result<u32> {
		Ok(self.image.as_ref().ok_or(PsdError::NotParsed)?.exempt().width())
	}

	/// Composite height without decoding pixels.
	pub fn image_height(&self) -> Result<u32> {
		Ok(self.image.as_ref().ok_or(PsdError::NotParsed)?.exempt().height())
	}
}
