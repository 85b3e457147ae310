//! Renderer-agnostic mesh model shared by every decoder.

use glam::{Vec2, Vec3};

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a color word as stored by the asset pipeline.
    ///
    /// Red lives in bits 24-31, green in 16-23 and blue in 8-15. The low byte
    /// is ignored and alpha is always opaque.
    #[must_use]
    pub const fn from_packed(word: u32) -> Self {
        let [r, g, b, _] = word.to_be_bytes();
        Self::new(r, g, b, 255)
    }
}

/// A texture coordinate in texel-page units (0-255 on each axis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Uv {
    pub u: u8,
    pub v: u8,
}

impl Uv {
    #[must_use]
    pub const fn new(u: u8, v: u8) -> Self {
        Self { u, v }
    }

    /// The coordinate normalized to `[0, 1]`.
    #[must_use]
    pub fn normalized(self) -> Vec2 {
        Vec2::new(f32::from(self.u) / 255.0, f32::from(self.v) / 255.0)
    }
}

/// One polygon of a mesh.
///
/// There is one case per record kind that produces geometry. Gouraud-textured
/// quads are always split into two [`Polygon::GouraudTexturedTriangle`]s by
/// the decoder, so they have no case of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polygon {
    FlatTriangle {
        indices: [u16; 3],
        color: Rgba,
    },
    FlatTexturedTriangle {
        indices: [u16; 3],
        texture: i16,
        uvs: [Uv; 3],
        color: Rgba,
    },
    FlatQuad {
        indices: [u16; 4],
        color: Rgba,
    },
    FlatTexturedQuad {
        indices: [u16; 4],
        texture: i16,
        uvs: [Uv; 4],
        color: Rgba,
    },
    GouraudTriangle {
        indices: [u16; 3],
        colors: [Rgba; 3],
    },
    GouraudTexturedTriangle {
        indices: [u16; 3],
        texture: i16,
        uvs: [Uv; 3],
        colors: [Rgba; 3],
    },
    GouraudQuad {
        indices: [u16; 4],
        colors: [Rgba; 4],
    },
    /// Light-sourced flat triangle. Its normal index is not kept.
    LitFlatTriangle {
        indices: [u16; 3],
        color: Rgba,
    },
    /// Light-sourced flat textured triangle. Its normal index is not kept.
    LitFlatTexturedTriangle {
        indices: [u16; 3],
        texture: i16,
        uvs: [Uv; 3],
        color: Rgba,
    },
}

impl Polygon {
    /// Vertex indices in winding order (3 or 4 entries).
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        match self {
            Self::FlatTriangle { indices, .. }
            | Self::FlatTexturedTriangle { indices, .. }
            | Self::GouraudTriangle { indices, .. }
            | Self::GouraudTexturedTriangle { indices, .. }
            | Self::LitFlatTriangle { indices, .. }
            | Self::LitFlatTexturedTriangle { indices, .. } => indices,
            Self::FlatQuad { indices, .. }
            | Self::FlatTexturedQuad { indices, .. }
            | Self::GouraudQuad { indices, .. } => indices,
        }
    }

    /// Texture page for textured cases.
    #[must_use]
    pub fn texture(&self) -> Option<i16> {
        match self {
            Self::FlatTexturedTriangle { texture, .. }
            | Self::FlatTexturedQuad { texture, .. }
            | Self::GouraudTexturedTriangle { texture, .. }
            | Self::LitFlatTexturedTriangle { texture, .. } => Some(*texture),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_textured(&self) -> bool {
        self.texture().is_some()
    }

    /// Number of triangles needed to draw this polygon.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices().len() - 2
    }
}

/// A decoded mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    /// Largest absolute coordinate over every vertex axis.
    ///
    /// This is a conservative bound for culling, not a Euclidean radius.
    pub radius: f32,
    pub origin: Vec3,
    pub flags: u16,
    pub vertices: Vec<Vec3>,
    /// Normals. The count is independent of `vertices` and may be zero.
    pub normals: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    /// Create an empty mesh with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Recompute [`Mesh::radius`] from the current vertices.
    pub fn update_radius(&mut self) {
        self.radius = bounding_radius(&self.vertices);
    }

    /// Total triangles across all polygons.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().map(Polygon::triangle_count).sum()
    }
}

/// Largest absolute coordinate on any axis of any vertex.
#[must_use]
pub fn bounding_radius(vertices: &[Vec3]) -> f32 {
    vertices
        .iter()
        .map(|v| v.abs().max_element())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_word_channel_mapping() {
        let color = Rgba::from_packed(0x1122_3344);
        assert_eq!(color, Rgba::new(0x11, 0x22, 0x33, 255));
    }

    #[test]
    fn test_color_alpha_ignores_low_byte() {
        assert_eq!(Rgba::from_packed(0x0000_0000).a, 255);
        assert_eq!(Rgba::from_packed(0xFFFF_FF00).a, 255);
    }

    #[test]
    fn test_uv_normalized() {
        let uv = Uv::new(255, 0).normalized();
        assert!((uv.x - 1.0).abs() < 1e-6);
        assert!(uv.y.abs() < 1e-6);
    }

    #[test]
    fn test_radius_is_max_abs_coordinate() {
        // Euclidean length of (3, 4, 0) is 5; the legacy bound is 4.
        let vertices = vec![Vec3::new(3.0, 4.0, 0.0), Vec3::new(-1.0, 0.0, -2.0)];
        assert!((bounding_radius(&vertices) - 4.0).abs() < 1e-6);

        let vertices = vec![Vec3::new(0.0, 0.0, -9.0)];
        assert!((bounding_radius(&vertices) - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_radius_of_empty_mesh() {
        assert!(bounding_radius(&[]).abs() < f32::EPSILON);
    }

    #[test]
    fn test_update_radius_follows_vertices() {
        let mut mesh = Mesh::new("hull");
        mesh.vertices = vec![Vec3::new(1.0, -6.0, 2.0)];
        mesh.update_radius();
        assert!((mesh.radius - 6.0).abs() < 1e-6);

        mesh.vertices.clear();
        mesh.update_radius();
        assert!(mesh.radius.abs() < f32::EPSILON);
    }

    #[test]
    fn test_polygon_helpers() {
        let quad = Polygon::FlatQuad {
            indices: [0, 1, 2, 3],
            color: Rgba::WHITE,
        };
        assert_eq!(quad.indices(), &[0, 1, 2, 3]);
        assert_eq!(quad.triangle_count(), 2);
        assert!(!quad.is_textured());

        let tri = Polygon::LitFlatTexturedTriangle {
            indices: [4, 5, 6],
            texture: 7,
            uvs: [Uv::default(); 3],
            color: Rgba::WHITE,
        };
        assert_eq!(tri.texture(), Some(7));
        assert_eq!(tri.triangle_count(), 1);
    }
}
