//! Load object containers and track geometry from disk.
//!
//! This crate wraps the byte-slice decoders of [`wipeout_decode`] with file
//! access, caching and a procedural fallback mesh, producing
//! renderer-agnostic meshes.
//!
//! # Design principles
//!
//! - **Synchronous**: One whole-file read per file, then a pure decode
//! - **Best effort**: Damaged containers still yield the objects before the
//!   damage, with the reason carried in [`Decoded::outcome`]
//! - **Shareable**: A [`Loader`] holds no decode state; caches lock internally
//!
//! # Example
//!
//! ```no_run
//! use wipeout::{Loader, TrackPaths};
//!
//! let loader = Loader::new();
//!
//! // Pull one ship out of a multi-object container.
//! let ship = loader.load_object("wipeout/common/allsh.prm", 0)?;
//! println!("{} has {} triangles", ship.value.name, ship.value.triangle_count());
//!
//! // Load a track with its section graph.
//! let track = loader.load_track(&TrackPaths::in_dir("wipeout/track02"))?;
//! println!("{} sections", track.sections.len());
//! # Ok::<(), wipeout::Error>(())
//! ```

pub mod cache;
mod error;
mod loader;
pub mod types;

pub use cache::{Cache, MemoryCache, NoCache};
pub use error::{Error, Result};
pub use loader::{Loader, LoaderConfig};
pub use types::{Track, TrackPaths};

// Re-export decode types for convenience.
pub use wipeout_decode::{
    DecodeError, Decoded, FaceFlags, Mesh, ObjectEntry, Outcome, Polygon, Rgba, SectionFlags,
    SectionGraph, TrackFace, TrackGeometry, TrackSection, Uv,
};
