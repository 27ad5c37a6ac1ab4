/// Composite image summary command.
pub mod image;
/// File-level information command.
pub mod info;
/// Layer listing command.
pub mod layers;
/// Image resource listing command.
pub mod resources;
/// Layer hierarchy command.
pub mod tree;
/// Shared command helpers.
pub(crate) mod util;
