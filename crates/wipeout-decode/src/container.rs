//! Multi-object container decoding.
//!
//! A container is a run of objects laid out back to back. Each object is a
//! 144-byte header followed by its vertex, normal and primitive arrays. The
//! header also stores file pointers to those arrays, but they only mean
//! something to the original in-memory loader, so decoding relies purely on
//! sequential layout.
//!
//! Walking stops at the first object whose counts are out of range, or at a
//! primitive whose tag is unknown. Anything completed before that point is
//! still returned, flagged as [`Outcome::Partial`](crate::Outcome::Partial).

use glam::Vec3;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::mesh::Mesh;
use crate::record::{decode_record, next_record};
use crate::session::DecodeSession;
use crate::{Decoded, NORMAL_SCALE};

/// Size of an object header.
pub const OBJECT_HEADER_LEN: usize = 144;

/// Largest vertex, normal or primitive count accepted in a header.
pub const MAX_ELEMENT_COUNT: i16 = 10_000;

/// Size of one vertex or normal record (3 × i16 + padding).
const VECTOR_RECORD_LEN: usize = 8;

/// Summary of a vertex-bearing object, produced without decoding polygons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Position among the container's vertex-bearing objects.
    pub index: usize,
    pub name: String,
    pub vertex_count: usize,
    pub normal_count: usize,
    pub primitive_count: usize,
    /// Offset of the object header in the container.
    pub offset: usize,
}

/// The fields of an object header the decoder keeps.
#[derive(Debug, Clone)]
struct ObjectHeader {
    offset: usize,
    name: String,
    vertex_count: i16,
    normal_count: i16,
    primitive_count: i16,
    flags: u16,
    origin: Vec3,
}

impl ObjectHeader {
    fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let offset = cursor.position();
        let name = cursor.read_fixed_str(16)?;

        let vertex_count = cursor.read_i16()?;
        cursor.skip(2)?;
        cursor.skip(4)?; // Vertices pointer.
        let normal_count = cursor.read_i16()?;
        cursor.skip(2)?;
        cursor.skip(4)?; // Normals pointer.
        let primitive_count = cursor.read_i16()?;
        cursor.skip(2)?;
        cursor.skip(4)?; // Primitives pointer.
        cursor.skip(8)?; // Two unused pointers.
        let _skeleton = cursor.read_i32()?;
        let _extent = cursor.read_i32()?;
        let flags = cursor.read_u16()?;
        cursor.skip(2)?;
        cursor.skip(4)?; // Next-object pointer.
        cursor.skip(9 * 2 + 2)?; // Relative rotation matrix.
        let origin = read_ivec3(cursor)?;
        cursor.skip(9 * 2 + 2)?; // Absolute rotation matrix.
        cursor.skip(3 * 4)?; // Absolute translation.
        cursor.skip(4)?; // Skeleton update flag.
        cursor.skip(3 * 4)?; // Skeleton super, sub and next.

        debug_assert_eq!(cursor.position() - offset, OBJECT_HEADER_LEN);

        Ok(Self {
            offset,
            name,
            vertex_count,
            normal_count,
            primitive_count,
            flags,
            origin,
        })
    }

    fn counts_are_sane(&self) -> bool {
        let range = 0..=MAX_ELEMENT_COUNT;
        range.contains(&self.vertex_count)
            && range.contains(&self.normal_count)
            && range.contains(&self.primitive_count)
    }

    fn count(value: i16) -> usize {
        // Only called once counts are known to be non-negative.
        usize::from(value.cast_unsigned())
    }

    fn vertices(&self) -> usize {
        Self::count(self.vertex_count)
    }

    fn normals(&self) -> usize {
        Self::count(self.normal_count)
    }

    fn primitives(&self) -> usize {
        Self::count(self.primitive_count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn read_ivec3(cursor: &mut Cursor<'_>) -> DecodeResult<Vec3> {
    let x = cursor.read_i32()?;
    let y = cursor.read_i32()?;
    let z = cursor.read_i32()?;
    Ok(Vec3::new(x as f32, y as f32, z as f32))
}

fn read_svec3(cursor: &mut Cursor<'_>) -> DecodeResult<Vec3> {
    let x = cursor.read_i16()?;
    let y = cursor.read_i16()?;
    let z = cursor.read_i16()?;
    cursor.skip(2)?;
    Ok(Vec3::new(f32::from(x), f32::from(y), f32::from(z)))
}

fn read_vectors(cursor: &mut Cursor<'_>, count: usize, scale: f32) -> DecodeResult<Vec<Vec3>> {
    (0..count).map(|_| read_svec3(cursor).map(|v| v * scale)).collect()
}

/// Sequential walk over the objects of a container.
struct Walker<'a> {
    cursor: Cursor<'a>,
    ordinal: usize,
    stopped: Option<DecodeError>,
}

impl<'a> Walker<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            ordinal: 0,
            stopped: None,
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.is_some()
    }

    fn stop(&mut self, reason: DecodeError) {
        tracing::warn!(
            offset = self.cursor.position(),
            object = self.ordinal,
            %reason,
            "stopping object walk"
        );
        self.stopped = Some(reason);
    }

    /// Read the next header, or `None` once the walk is over.
    fn next_header(&mut self) -> Option<ObjectHeader> {
        if self.is_stopped() || self.cursor.remaining() < OBJECT_HEADER_LEN {
            return None;
        }

        let header = match ObjectHeader::read(&mut self.cursor) {
            Ok(header) => header,
            Err(e) => {
                self.stop(e);
                return None;
            }
        };

        if !header.counts_are_sane() {
            self.stop(DecodeError::CorruptCounts {
                object: self.ordinal,
                vertices: header.vertex_count,
                normals: header.normal_count,
                primitives: header.primitive_count,
            });
            return None;
        }

        self.ordinal += 1;
        Some(header)
    }

    /// Consume an object body without building anything.
    ///
    /// Returns `false` if the vertex or normal arrays were cut short, in which
    /// case the object is unusable. A failure inside the primitive list stops
    /// the walk but leaves the object usable.
    fn skip_body(&mut self, header: &ObjectHeader) -> bool {
        let arrays = (header.vertices() + header.normals()) * VECTOR_RECORD_LEN;
        if let Err(e) = self.cursor.skip(arrays) {
            self.stop(e);
            return false;
        }

        for _ in 0..header.primitives() {
            if let Err(e) = next_record(&mut self.cursor) {
                self.stop(e);
                break;
            }
        }
        true
    }

    /// Decode an object body into a mesh.
    ///
    /// Returns `None` if the vertex or normal arrays were cut short.
    fn read_body(&mut self, header: &ObjectHeader, session: &mut DecodeSession) -> Option<Mesh> {
        let mut mesh = Mesh::new(header.name.clone());
        mesh.origin = header.origin;
        mesh.flags = header.flags;

        let arrays = read_vectors(&mut self.cursor, header.vertices(), 1.0).and_then(|vertices| {
            let normals = read_vectors(&mut self.cursor, header.normals(), NORMAL_SCALE)?;
            Ok((vertices, normals))
        });

        match arrays {
            Ok((vertices, normals)) => {
                mesh.vertices = vertices;
                mesh.normals = normals;
            }
            Err(e) => {
                self.stop(e);
                return None;
            }
        }
        mesh.update_radius();

        for _ in 0..header.primitives() {
            let record = match next_record(&mut self.cursor) {
                Ok(record) => record,
                Err(e) => {
                    self.stop(e);
                    break;
                }
            };
            session.note(record.kind, record.offset);

            match decode_record(&record, mesh.vertices.len()) {
                Ok(emitted) => mesh.polygons.extend(emitted),
                Err(e) => {
                    tracing::warn!(
                        object = %mesh.name,
                        offset = record.offset,
                        kind = ?record.kind,
                        error = %e,
                        "skipping primitive"
                    );
                }
            }
        }

        Some(mesh)
    }

    /// The error for an object the walk never produced.
    fn unreachable(self, index: usize, available: usize) -> DecodeError {
        match self.stopped {
            Some(reason) => DecodeError::ObjectUnreachable {
                index,
                available,
                reason: Box::new(reason),
            },
            None => DecodeError::ObjectNotFound { index, available },
        }
    }

    fn finish<T>(self, value: T) -> Decoded<T> {
        match self.stopped {
            Some(reason) => Decoded::partial(value, reason),
            None => Decoded::complete(value),
        }
    }
}

/// Decode the `index`-th object that has at least one vertex.
///
/// Objects without vertices (markers, lights) are walked over but never
/// counted. If the container ends before the object is reached,
/// [`DecodeError::ObjectNotFound`] is returned. If the walk stops on damaged
/// data first, [`DecodeError::ObjectUnreachable`] carries the stop reason.
pub fn decode_object(
    data: &[u8],
    index: usize,
    session: &mut DecodeSession,
) -> DecodeResult<Decoded<Mesh>> {
    let mut walker = Walker::new(data);
    let mut available = 0;

    while let Some(header) = walker.next_header() {
        if header.vertex_count > 0 && available == index {
            return match walker.read_body(&header, session) {
                Some(mesh) => Ok(walker.finish(mesh)),
                None => Err(walker.unreachable(index, available)),
            };
        }

        if walker.skip_body(&header) && header.vertex_count > 0 {
            available += 1;
        }
        if walker.is_stopped() {
            break;
        }
    }

    Err(walker.unreachable(index, available))
}

/// Decode every object that has at least one vertex.
pub fn decode_objects(data: &[u8], session: &mut DecodeSession) -> Decoded<Vec<Mesh>> {
    let mut walker = Walker::new(data);
    let mut meshes = Vec::new();

    while let Some(header) = walker.next_header() {
        if header.vertex_count == 0 {
            walker.skip_body(&header);
        } else if let Some(mesh) = walker.read_body(&header, session) {
            meshes.push(mesh);
        }
    }

    walker.finish(meshes)
}

/// List the vertex-bearing objects of a container without decoding polygons.
///
/// Entries are numbered the same way [`decode_object`] counts objects.
#[must_use]
pub fn scan_objects(data: &[u8]) -> Decoded<Vec<ObjectEntry>> {
    let mut walker = Walker::new(data);
    let mut entries = Vec::new();

    while let Some(header) = walker.next_header() {
        let usable = walker.skip_body(&header);
        if usable && header.vertex_count > 0 {
            entries.push(ObjectEntry {
                index: entries.len(),
                name: header.name.clone(),
                vertex_count: header.vertices(),
                normal_count: header.normals(),
                primitive_count: header.primitives(),
                offset: header.offset,
            });
        }
    }

    walker.finish(entries)
}
