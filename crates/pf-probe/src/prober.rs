//! The [`Prober`] trait defining the interface for metadata extraction.

use std::path::Path;

use crate::types::MediaInfo;

/// Produces a [`MediaInfo`] snapshot for a media file.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the batch driver probes files from several workers.
pub trait Prober: Send + Sync {
    /// Human-readable name identifying this prober implementation.
    fn name(&self) -> &'static str;

    /// Extract metadata for the file at `path`.
    fn probe(&self, path: &Path) -> pf_core::Result<MediaInfo>;

    /// Whether this prober can handle the given file.
    ///
    /// A return value of `true` does not guarantee that [`Prober::probe`]
    /// will succeed.
    fn supports(&self, path: &Path) -> bool;
}
