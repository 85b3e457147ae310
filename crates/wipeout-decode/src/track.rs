//! Track geometry decoding.
//!
//! Track geometry lives in two header-less files: a vertex array and a quad
//! face array. Both are plain fixed-stride record runs; any trailing bytes
//! shorter than one record are ignored.

use bitflags::bitflags;
use glam::Vec3;

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::mesh::{Mesh, Polygon, Rgba, Uv};
use crate::NORMAL_SCALE;

/// Size of one track vertex record (3 × i32 + padding).
pub const TRACK_VERTEX_LEN: usize = 16;

/// Size of one track face record.
pub const TRACK_FACE_LEN: usize = 20;

/// Accumulated normals shorter than this fall back to straight up.
const MIN_NORMAL_LENGTH: f32 = 1e-6;

bitflags! {
    /// Per-face gameplay and rendering flags.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FaceFlags: u8 {
        const TRACK = 1;
        const WEAPON_LEFT = 1 << 1;
        /// Selects the mirrored UV table.
        const FLIP_TEXTURE = 1 << 2;
        const WEAPON_RIGHT = 1 << 3;
        const START_GRID = 1 << 4;
        const BOOST = 1 << 5;
        const WEAPON_COLLECTED = 1 << 6;
        const WEAPON_ACTIVE = 1 << 7;
    }
}

/// UV corners for the unflipped and flipped texture orientations.
const FACE_UVS: [[Uv; 4]; 2] = [
    [
        Uv::new(255, 0),
        Uv::new(0, 0),
        Uv::new(0, 255),
        Uv::new(255, 255),
    ],
    [
        Uv::new(0, 0),
        Uv::new(255, 0),
        Uv::new(255, 255),
        Uv::new(0, 255),
    ],
];

/// One quad of the track surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFace {
    /// Raw vertex indices as stored; negative values are invalid.
    pub indices: [i16; 4],
    pub normal: Vec3,
    pub texture: u8,
    pub flags: FaceFlags,
    pub color: Rgba,
}

impl TrackFace {
    fn read(cursor: &mut Cursor<'_>) -> DecodeResult<Self> {
        let mut indices = [0; 4];
        for index in &mut indices {
            *index = cursor.read_i16()?;
        }
        let nx = cursor.read_i16()?;
        let ny = cursor.read_i16()?;
        let nz = cursor.read_i16()?;
        let texture = cursor.read_u8()?;
        let flags = FaceFlags::from_bits_retain(cursor.read_u8()?);
        let color = Rgba::from_packed(cursor.read_u32()?);

        Ok(Self {
            indices,
            normal: Vec3::new(f32::from(nx), f32::from(ny), f32::from(nz)) * NORMAL_SCALE,
            texture,
            flags,
            color,
        })
    }

    /// The UV corners for this face's texture orientation.
    #[must_use]
    pub fn uvs(&self) -> [Uv; 4] {
        FACE_UVS[usize::from(self.flags.contains(FaceFlags::FLIP_TEXTURE))]
    }

    /// Indices checked against a vertex count.
    fn checked_indices(&self, vertex_count: usize) -> DecodeResult<[u16; 4]> {
        let mut out = [0; 4];
        for (slot, &raw) in out.iter_mut().zip(&self.indices) {
            let unsigned = raw.cast_unsigned();
            if raw < 0 || usize::from(unsigned) >= vertex_count {
                return Err(DecodeError::IndexOutOfBounds {
                    index: usize::from(unsigned),
                    len: vertex_count,
                });
            }
            *slot = unsigned;
        }
        Ok(out)
    }
}

/// Track geometry assembled from vertex and face files.
#[derive(Debug, Clone)]
pub struct TrackGeometry {
    /// Textured triangle mesh, two triangles per usable face, with one
    /// averaged normal per vertex.
    pub mesh: Mesh,
    /// Every face record in file order, including skipped ones, so that
    /// section face ranges stay valid.
    pub faces: Vec<TrackFace>,
    /// Faces left out of the mesh because they referenced missing vertices.
    pub skipped_faces: usize,
}

/// Decode a track vertex file.
#[allow(clippy::cast_precision_loss)]
pub fn decode_track_vertices(data: &[u8]) -> DecodeResult<Vec<Vec3>> {
    let mut cursor = Cursor::new(data);
    let count = data.len() / TRACK_VERTEX_LEN;
    let mut vertices = Vec::with_capacity(count);

    for _ in 0..count {
        let x = cursor.read_i32()?;
        let y = cursor.read_i32()?;
        let z = cursor.read_i32()?;
        cursor.skip(4)?;
        vertices.push(Vec3::new(x as f32, y as f32, z as f32));
    }

    Ok(vertices)
}

/// Decode a track face file.
pub fn decode_track_faces(data: &[u8]) -> DecodeResult<Vec<TrackFace>> {
    let mut cursor = Cursor::new(data);
    (0..data.len() / TRACK_FACE_LEN)
        .map(|_| TrackFace::read(&mut cursor))
        .collect()
}

/// Build the track mesh from decoded vertices and faces.
///
/// Each quad `(v0, v1, v2, v3)` becomes the triangles `(v2, v1, v0)` and
/// `(v2, v0, v3)`. Faces with an index outside `vertices` are skipped.
#[must_use]
pub fn assemble_track_mesh(
    name: &str,
    vertices: Vec<Vec3>,
    faces: Vec<TrackFace>,
) -> TrackGeometry {
    let vertex_count = vertices.len();
    let mut polygons = Vec::with_capacity(faces.len() * 2);
    let mut normal_sums = vec![Vec3::ZERO; vertex_count];
    let mut contributions = vec![0u32; vertex_count];
    let mut skipped_faces = 0;

    for (face_index, face) in faces.iter().enumerate() {
        let [v0, v1, v2, v3] = match face.checked_indices(vertex_count) {
            Ok(indices) => indices,
            Err(e) => {
                tracing::warn!(face = face_index, error = %e, "skipping track face");
                skipped_faces += 1;
                continue;
            }
        };

        for v in [v0, v1, v2, v3] {
            normal_sums[usize::from(v)] += face.normal;
            contributions[usize::from(v)] += 1;
        }

        let [uv0, uv1, uv2, uv3] = face.uvs();
        let texture = i16::from(face.texture);
        polygons.push(Polygon::FlatTexturedTriangle {
            indices: [v2, v1, v0],
            texture,
            uvs: [uv2, uv1, uv0],
            color: face.color,
        });
        polygons.push(Polygon::FlatTexturedTriangle {
            indices: [v2, v0, v3],
            texture,
            uvs: [uv2, uv0, uv3],
            color: face.color,
        });
    }

    #[allow(clippy::cast_precision_loss)]
    let normals = normal_sums
        .into_iter()
        .zip(contributions)
        .map(|(sum, count)| {
            if count == 0 {
                return Vec3::Y;
            }
            let average = sum / count as f32;
            if average.length() < MIN_NORMAL_LENGTH {
                Vec3::Y
            } else {
                average.normalize()
            }
        })
        .collect();

    let mut mesh = Mesh::new(name);
    mesh.vertices = vertices;
    mesh.normals = normals;
    mesh.polygons = polygons;
    mesh.update_radius();

    if skipped_faces > 0 {
        tracing::warn!(
            track = name,
            skipped_faces,
            total = faces.len(),
            "track faces referenced missing vertices"
        );
    }

    TrackGeometry {
        mesh,
        faces,
        skipped_faces,
    }
}

/// Decode and assemble track geometry from raw vertex and face files.
pub fn decode_track_geometry(
    name: &str,
    vertex_data: &[u8],
    face_data: &[u8],
) -> DecodeResult<TrackGeometry> {
    let vertices = decode_track_vertices(vertex_data)?;
    let faces = decode_track_faces(face_data)?;
    tracing::debug!(
        track = name,
        vertices = vertices.len(),
        faces = faces.len(),
        "decoded track geometry"
    );
    Ok(assemble_track_mesh(name, vertices, faces))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn vertex_bytes(vertices: &[[i32; 3]]) -> Vec<u8> {
        let mut out = Vec::new();
        for v in vertices {
            for c in v {
                out.extend_from_slice(&c.to_be_bytes());
            }
            out.extend_from_slice(&[0; 4]);
        }
        out
    }

    pub(crate) fn face_bytes(
        indices: [i16; 4],
        normal: [i16; 3],
        flags: u8,
        color: u32,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        for i in indices {
            out.extend_from_slice(&i.to_be_bytes());
        }
        for n in normal {
            out.extend_from_slice(&n.to_be_bytes());
        }
        out.push(7); // Texture.
        out.push(flags);
        out.extend_from_slice(&color.to_be_bytes());
        out
    }

    fn square() -> Vec<u8> {
        vertex_bytes(&[[0, 0, 0], [1000, 0, 0], [1000, 0, 1000], [0, 0, 1000]])
    }

    #[test]
    fn test_decode_vertices_ignores_trailing_bytes() {
        let mut data = vertex_bytes(&[[1, -2, 3], [70_000, 0, -70_000]]);
        data.extend_from_slice(&[0xFF; 15]);

        let vertices = decode_track_vertices(&data).unwrap();
        assert_eq!(
            vertices,
            vec![Vec3::new(1.0, -2.0, 3.0), Vec3::new(70_000.0, 0.0, -70_000.0)]
        );
    }

    #[test]
    fn test_decode_face_fields() {
        let data = face_bytes([0, 1, 2, 3], [0, -4096, 2048], 0b0010_0101, 0xAABB_CC01);
        let faces = decode_track_faces(&data).unwrap();
        assert_eq!(faces.len(), 1);

        let face = faces[0];
        assert_eq!(face.indices, [0, 1, 2, 3]);
        assert_eq!(face.normal, Vec3::new(0.0, -1.0, 0.5));
        assert_eq!(face.texture, 7);
        assert!(face.flags.contains(FaceFlags::TRACK | FaceFlags::FLIP_TEXTURE | FaceFlags::BOOST));
        assert_eq!(face.color, Rgba::new(0xAA, 0xBB, 0xCC, 255));
    }

    #[test]
    fn test_quad_splits_into_reversed_triangles() {
        let faces = face_bytes([0, 1, 2, 3], [0, 4096, 0], 0, 0);
        let geometry = decode_track_geometry("track", &square(), &faces).unwrap();

        let indices: Vec<_> = geometry
            .mesh
            .polygons
            .iter()
            .map(Polygon::indices)
            .collect();
        assert_eq!(indices, vec![&[2, 1, 0][..], &[2, 0, 3][..]]);
        assert_eq!(geometry.skipped_faces, 0);
        assert!((geometry.mesh.radius - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_flip_flag_selects_uv_table() {
        let plain = decode_track_faces(&face_bytes([0, 1, 2, 3], [0; 3], 0, 0)).unwrap();
        let flipped =
            decode_track_faces(&face_bytes([0, 1, 2, 3], [0; 3], FaceFlags::FLIP_TEXTURE.bits(), 0))
                .unwrap();

        assert_eq!(plain[0].uvs(), FACE_UVS[0]);
        assert_eq!(flipped[0].uvs(), FACE_UVS[1]);

        let geometry = assemble_track_mesh("t", vec![Vec3::ZERO; 4], flipped);
        let Polygon::FlatTexturedTriangle { uvs, texture, .. } = &geometry.mesh.polygons[0] else {
            panic!("expected textured triangle");
        };
        assert_eq!(*texture, 7);
        assert_eq!(*uvs, [FACE_UVS[1][2], FACE_UVS[1][1], FACE_UVS[1][0]]);
    }

    #[test]
    fn test_out_of_range_face_is_skipped() {
        let mut faces = face_bytes([0, 1, 2, 3], [0, 4096, 0], 0, 0);
        faces.extend(face_bytes([0, 1, 2, 9], [0, 4096, 0], 0, 0));
        faces.extend(face_bytes([-1, 1, 2, 3], [0, 4096, 0], 0, 0));

        let geometry = decode_track_geometry("track", &square(), &faces).unwrap();
        assert_eq!(geometry.faces.len(), 3);
        assert_eq!(geometry.skipped_faces, 2);
        assert_eq!(geometry.mesh.polygons.len(), 2);
        assert!(geometry.mesh.polygons.len() < 2 * geometry.faces.len());
    }

    #[test]
    fn test_normals_are_averaged_and_normalized() {
        let vertices = vertex_bytes(&[
            [0, 0, 0],
            [1, 0, 0],
            [1, 0, 1],
            [0, 0, 1],
            [2, 0, 0],
            [2, 0, 1],
            [9, 9, 9],
        ]);
        let mut faces = face_bytes([0, 1, 2, 3], [0, 4096, 0], 0, 0);
        faces.extend(face_bytes([1, 4, 5, 2], [4096, 0, 0], 0, 0));

        let geometry = decode_track_geometry("track", &vertices, &faces).unwrap();
        let normals = &geometry.mesh.normals;
        assert_eq!(normals.len(), 7);

        // Vertex 0 only touches the first face.
        assert!((normals[0] - Vec3::Y).length() < 1e-6);
        // Vertex 1 is shared: the average of +Y and +X, normalized.
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((normals[1] - expected).length() < 1e-6);
        // Vertex 4 only touches the second face.
        assert!((normals[4] - Vec3::X).length() < 1e-6);
        // Vertex 6 is referenced by no face.
        assert_eq!(normals[6], Vec3::Y);
    }

    #[test]
    fn test_cancelling_normals_fall_back_to_up() {
        let mut faces = face_bytes([0, 1, 2, 3], [4096, 0, 0], 0, 0);
        faces.extend(face_bytes([0, 1, 2, 3], [-4096, 0, 0], 0, 0));

        let geometry = decode_track_geometry("track", &square(), &faces).unwrap();
        assert!(geometry.mesh.normals.iter().all(|&n| n == Vec3::Y));
    }

    #[test]
    fn test_empty_files() {
        let geometry = decode_track_geometry("empty", &[], &[]).unwrap();
        assert!(geometry.mesh.vertices.is_empty());
        assert!(geometry.mesh.polygons.is_empty());
        assert!(geometry.faces.is_empty());
    }
}
