//! Public library API for reading Photoshop `.psd` / `.psb` documents lazily.

/// Byte cursor, deferred section handles, parse pipeline, and section decoders.
pub mod psd;
