//! Procedural stand-in mesh.

use glam::Vec3;

use crate::mesh::{Mesh, Polygon, Rgba};

/// Wedge-shaped hull: nose, left and right wing tips, dorsal and keel points.
const HULL: [[f32; 3]; 5] = [
    [0.0, 0.0, -400.0],
    [-250.0, 0.0, 200.0],
    [250.0, 0.0, 200.0],
    [0.0, 120.0, 150.0],
    [0.0, -60.0, 150.0],
];

const HULL_TRIANGLES: [[u16; 3]; 6] = [
    [0, 1, 3],
    [0, 3, 2],
    [0, 4, 1],
    [0, 2, 4],
    [1, 2, 3],
    [1, 4, 2],
];

/// Build a deterministic placeholder mesh.
///
/// The same `seed` always gives the same mesh; different seeds change the
/// palette and stretch the hull slightly so stand-ins are distinguishable.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mock_mesh(name: &str, seed: u32) -> Mesh {
    let stretch = 1.0 + (seed % 4) as f32 * 0.125;
    let vertices: Vec<Vec3> = HULL
        .iter()
        .map(|&[x, y, z]| Vec3::new(x, y, z * stretch))
        .collect();
    let normals = vertices.iter().map(|v| v.normalize_or(Vec3::Y)).collect();

    let palette: [Rgba; 5] = std::array::from_fn(|i| {
        let [r, g, b, _] = mix(seed, i as u32).to_be_bytes();
        Rgba::new(r | 0x40, g | 0x40, b | 0x40, 255)
    });

    let polygons = HULL_TRIANGLES
        .iter()
        .map(|&indices| Polygon::GouraudTriangle {
            indices,
            colors: indices.map(|i| palette[usize::from(i)]),
        })
        .collect();

    let mut mesh = Mesh::new(name);
    mesh.vertices = vertices;
    mesh.normals = normals;
    mesh.polygons = polygons;
    mesh.update_radius();
    mesh
}

/// Integer hash used to derive colors.
fn mix(seed: u32, salt: u32) -> u32 {
    let mut x = seed ^ salt.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^ (x >> 16)
}
