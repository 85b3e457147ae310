//! Property tests over synthetic containers and track files.

use proptest::prelude::*;
use wipeout_decode::{
    DecodeSession, OBJECT_HEADER_LEN, PrimitiveKind, decode_object, decode_objects,
    decode_track_geometry, decode_track_sections, scan_objects,
};

/// Shape of one synthetic object.
#[derive(Debug, Clone)]
struct ObjectShape {
    vertices: i16,
    normals: i16,
    triangles: u8,
    lights: u8,
}

fn object_shape() -> impl Strategy<Value = ObjectShape> {
    (0i16..6, 0i16..4, 0u8..5, 0u8..3).prop_map(|(vertices, normals, triangles, lights)| {
        ObjectShape {
            vertices,
            normals,
            triangles,
            lights,
        }
    })
}

fn push_object(out: &mut Vec<u8>, ordinal: usize, shape: &ObjectShape) {
    let mut name = [0u8; 16];
    let label = format!("obj{ordinal}");
    name[..label.len()].copy_from_slice(label.as_bytes());
    out.extend_from_slice(&name);

    // Triangles need at least one vertex to be valid records.
    let triangles = if shape.vertices > 0 { shape.triangles } else { 0 };
    let primitives = i16::from(triangles) + i16::from(shape.lights);
    for count in [shape.vertices, shape.normals, primitives] {
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&[0; 6]);
    }
    out.extend_from_slice(&[0; OBJECT_HEADER_LEN - 16 - 24]);

    for i in 0..shape.vertices + shape.normals {
        for c in [i, -i, i * 3] {
            out.extend_from_slice(&c.to_be_bytes());
        }
        out.extend_from_slice(&[0; 2]);
    }

    for t in 0..triangles {
        out.extend_from_slice(&PrimitiveKind::FlatTriangle.tag().to_be_bytes());
        out.extend_from_slice(&[0; 2]);
        let last = shape.vertices - 1;
        for i in [0, i16::from(t) % shape.vertices, last] {
            out.extend_from_slice(&i.to_be_bytes());
        }
        out.extend_from_slice(&[0; 2]);
        out.extend_from_slice(&0x1020_3040u32.to_be_bytes());
    }
    for _ in 0..shape.lights {
        out.extend_from_slice(&PrimitiveKind::SpotLight.tag().to_be_bytes());
        out.extend_from_slice(&[0; 2]);
        out.extend_from_slice(&[0xFF; 36]);
    }
}

fn container(shapes: &[ObjectShape]) -> Vec<u8> {
    let mut out = Vec::new();
    for (ordinal, shape) in shapes.iter().enumerate() {
        push_object(&mut out, ordinal, shape);
    }
    out
}

proptest! {
    #[test]
    fn scan_and_targeted_decode_agree(shapes in prop::collection::vec(object_shape(), 0..8)) {
        let data = container(&shapes);
        let scan = scan_objects(&data);
        prop_assert!(scan.is_complete());

        let bearing: Vec<_> = shapes.iter().filter(|s| s.vertices > 0).collect();
        prop_assert_eq!(scan.value.len(), bearing.len());

        for (entry, shape) in scan.value.iter().zip(&bearing) {
            let decoded = decode_object(&data, entry.index, &mut DecodeSession::new()).unwrap();
            let mesh = decoded.value;
            prop_assert_eq!(&mesh.name, &entry.name);
            prop_assert_eq!(mesh.vertices.len(), entry.vertex_count);
            prop_assert_eq!(mesh.normals.len(), entry.normal_count);
            prop_assert_eq!(mesh.polygons.len(), usize::from(shape.triangles));
        }

        let all = decode_objects(&data, &mut DecodeSession::new());
        let names: Vec<_> = all.value.iter().map(|m| m.name.clone()).collect();
        let scanned: Vec<_> = scan.value.iter().map(|e| e.name.clone()).collect();
        prop_assert_eq!(names, scanned);
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        let scan = scan_objects(&data);
        let all = decode_objects(&data, &mut DecodeSession::new());
        prop_assert_eq!(scan.value.len(), all.value.len());
        for mesh in &all.value {
            for polygon in &mesh.polygons {
                let vertices = mesh.vertices.len();
                prop_assert!(polygon.indices().iter().all(|&i| usize::from(i) < vertices));
            }
        }

        let geometry = decode_track_geometry("fuzz", &data, &data).unwrap();
        prop_assert!(geometry.mesh.polygons.len() <= 2 * geometry.faces.len());
        prop_assert_eq!(geometry.mesh.normals.len(), geometry.mesh.vertices.len());

        let sections = decode_track_sections(&data).unwrap();
        for section in &sections {
            prop_assert!(section.next.is_none_or(|n| n < sections.len()));
            prop_assert!(section.previous.is_none_or(|p| p < sections.len()));
        }
    }
}
