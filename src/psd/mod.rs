mod bytes;
mod deferred;
mod document;
mod error;
mod header;
mod image;
mod layer;
mod layer_mask;
mod packbits;
mod path;
mod resources;
mod source;
mod tree;

/// Byte cursor, primitive format table, and color records.
pub use bytes::{ColorRecord, Cursor, DOUBLE, FLOAT, Format, INT, LONG_LONG, SHORT, UINT, USHORT};
/// Deferred materialization wrapper and section traits.
pub use deferred::{Materialization, Section, SectionHandle, Skip};
/// Parse pipeline entry points.
pub use document::{Document, Stage};
/// Error and result aliases.
pub use error::{PsdError, Result};
/// File header representation.
pub use header::{ColorMode, Header};
/// Composite image decoder and output.
pub use image::{Compression, Image, ImageSection};
/// Layer record types.
pub use layer::{ChannelInfo, Divider, Layer, MaskData};
/// Layer/mask section decoder and output.
pub use layer_mask::{GlobalMask, LayerMask, LayerMaskSection};
/// Vector mask path records.
pub use path::{Knot, PathPoint, PathRecord, VectorMask};
/// Image resource decoder and output.
pub use resources::{ResolutionInfo, Resource, Resources, ResourcesSection, resource_label};
/// Byte acquisition helpers.
pub use source::{LoadOptions, Wrapping, load, unwrap_bytes};
/// Layer hierarchy and export.
pub use tree::{DocumentInfo, Node, NodeKind, Tree};
