//! Error types for decoding operations.

use std::fmt;

/// Errors that can occur while decoding geometry data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A read ran past the end of the buffer.
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// An object header declared element counts outside the sane range.
    CorruptCounts {
        object: usize,
        vertices: i16,
        normals: i16,
        primitives: i16,
    },
    /// A primitive record carried a tag with no known layout.
    UnknownPrimitive { tag: i16, offset: usize },
    /// Index out of bounds.
    IndexOutOfBounds { index: usize, len: usize },
    /// The requested object does not exist in the container.
    ObjectNotFound { index: usize, available: usize },
    /// The walk stopped on damaged data before reaching the requested object.
    ObjectUnreachable {
        index: usize,
        available: usize,
        reason: Box<DecodeError>,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                offset,
                needed,
                remaining,
            } => {
                write!(
                    f,
                    "unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} remaining"
                )
            }
            Self::CorruptCounts {
                object,
                vertices,
                normals,
                primitives,
            } => {
                write!(
                    f,
                    "object {object} has corrupt counts: {vertices} vertices, {normals} normals, {primitives} primitives"
                )
            }
            Self::UnknownPrimitive { tag, offset } => {
                write!(f, "unknown primitive tag {tag} at offset {offset}")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::ObjectNotFound { index, available } => {
                write!(
                    f,
                    "object {index} not found: container holds {available} objects with vertices"
                )
            }
            Self::ObjectUnreachable {
                index,
                available,
                reason,
            } => {
                write!(
                    f,
                    "object {index} unreachable: walk stopped after {available} objects with vertices: {reason}"
                )
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ObjectUnreachable { reason, .. } => Some(reason.as_ref()),
            _ => None,
        }
    }
}

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
