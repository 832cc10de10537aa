//! # pf-probe
//!
//! Media metadata snapshots consumed by skip-condition evaluation.
//!
//! The phase engine never inspects media files itself. It receives a
//! [`MediaInfo`] snapshot, produced once per file before the run begins, and
//! evaluates every `skip_when` block against that snapshot. This crate
//! defines the snapshot types, the [`Prober`] interface that produces them,
//! and [`SnapshotProber`], which reads a pre-probed JSON sidecar.
//!
//! ## Quick start
//!
//! ```no_run
//! use pf_probe::{Prober, SnapshotProber};
//! use std::path::Path;
//!
//! let prober = SnapshotProber::default();
//! let info = prober.probe(Path::new("movie.mkv")).unwrap();
//! if let Some(v) = info.primary_video() {
//!     println!("Video: {:?} {:?}p", v.codec, v.height);
//! }
//! ```

pub mod prober;
pub mod snapshot;
pub mod types;

pub use prober::Prober;
pub use snapshot::SnapshotProber;
pub use types::{AudioTrack, MediaInfo, SubtitleTrack, VideoTrack};
