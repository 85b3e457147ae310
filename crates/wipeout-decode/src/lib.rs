//! Decode big-endian geometry from a PlayStation-era racing game.
//!
//! This crate provides pure synchronous decoders over byte slices. It never
//! touches the filesystem: callers read a whole file and hand over its bytes.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Best effort**: Damaged data yields whatever decoded cleanly, tagged
//!   with an [`Outcome`] saying why decoding stopped
//! - **No global state**: Diagnostics live in a caller-owned [`DecodeSession`]
//!
//! # Key functions
//!
//! - [`decode_object`]: Decode one object from a multi-object container
//! - [`scan_objects`]: List a container's objects without decoding polygons
//! - [`decode_track_geometry`]: Assemble a track mesh from vertex and face files
//! - [`decode_track_sections`]: Decode and link track sections
//! - [`mock_mesh`]: Build a deterministic stand-in mesh

mod cursor;
mod error;
mod session;

pub mod container;
pub mod mesh;
pub mod mock;
pub mod record;
pub mod sections;
pub mod track;

pub use container::{
    MAX_ELEMENT_COUNT, OBJECT_HEADER_LEN, ObjectEntry, decode_object, decode_objects, scan_objects,
};
pub use cursor::Cursor;
pub use error::{DecodeError, DecodeResult};
pub use mesh::{Mesh, Polygon, Rgba, Uv};
pub use mock::mock_mesh;
pub use record::{Emitted, PrimitiveKind, Record, decode_record, next_record};
pub use sections::{SectionFlags, SectionGraph, TrackSection, decode_track_sections};
pub use session::DecodeSession;
pub use track::{
    FaceFlags, TrackFace, TrackGeometry, assemble_track_mesh, decode_track_faces,
    decode_track_geometry, decode_track_vertices,
};

/// Scale applied to 4.12 fixed-point normal components.
pub const NORMAL_SCALE: f32 = 1.0 / 4096.0;

/// How a best-effort decode ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All input was consumed.
    Complete,
    /// Decoding stopped early; the value holds everything completed before.
    Partial { reason: DecodeError },
}

/// A decoded value together with how decoding ended.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub value: T,
    pub outcome: Outcome,
}

impl<T> Decoded<T> {
    #[must_use]
    pub fn complete(value: T) -> Self {
        Self {
            value,
            outcome: Outcome::Complete,
        }
    }

    #[must_use]
    pub fn partial(value: T, reason: DecodeError) -> Self {
        Self {
            value,
            outcome: Outcome::Partial { reason },
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Complete
    }

    /// Why decoding stopped early, if it did.
    #[must_use]
    pub fn reason(&self) -> Option<&DecodeError> {
        match &self.outcome {
            Outcome::Complete => None,
            Outcome::Partial { reason } => Some(reason),
        }
    }

    /// Discard the outcome.
    pub fn into_value(self) -> T {
        self.value
    }
}
