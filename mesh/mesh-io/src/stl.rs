//! STL (Stereolithography) file format support.
//!
//! Supports both ASCII and binary STL formats.
//!
//! # Format Detection
//!
//! [`detect_stl_encoding`] applies the canonical rule: data starting with the
//! literal token `solid` is ASCII. Some CAD exporters write binary files whose
//! 80-byte header also begins with `solid`, so data whose length matches the
//! binary layout exactly (`84 + 50 * count`) is classified as binary even when
//! the prefix matches.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (ignored, often contains file info)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector (ignored, recomputed on export)
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (usually 0)
//! end
//! ```
//!
//! # ASCII Format
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//!   ...
//! endsolid name
//! ```
//!
//! A file may hold several `solid` blocks (multi-region output); the reader
//! collects the facets of all of them into one mesh.
//!
//! # Shared Vertices
//!
//! STL stores every facet corner separately. The reader shares corners whose
//! coordinates are bit-identical (`-0.0` and `0.0` count as equal), which
//! recovers the connectivity CAD exporters write without moving any vertex.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hashbrown::HashMap;
use mesh_types::{IndexedMesh, MeshTopology, Triangle, Vertex};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Token that opens an ASCII STL.
const ASCII_SIGNATURE: &[u8] = b"solid";

/// The two STL encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StlEncoding {
    /// Human-readable text, starting with `solid`.
    Ascii,
    /// Compact little-endian binary.
    Binary,
}

impl std::fmt::Display for StlEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ascii => write!(f, "ASCII"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Classify raw STL data as ASCII or binary.
///
/// # Example
///
/// ```
/// use mesh_io::{detect_stl_encoding, StlEncoding};
///
/// assert_eq!(detect_stl_encoding(b"solid part\nendsolid part\n"), StlEncoding::Ascii);
/// assert_eq!(detect_stl_encoding(&[0u8; 84]), StlEncoding::Binary);
/// ```
#[must_use]
pub fn detect_stl_encoding(bytes: &[u8]) -> StlEncoding {
    if bytes.starts_with(ASCII_SIGNATURE) && !has_binary_layout(bytes) {
        StlEncoding::Ascii
    } else {
        StlEncoding::Binary
    }
}

/// Triangle count declared in a binary header, if the header is present.
fn binary_face_count(bytes: &[u8]) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

/// True when the data length is exactly what the binary header declares.
fn has_binary_layout(bytes: &[u8]) -> bool {
    binary_face_count(bytes)
        .and_then(|count| (count as usize).checked_mul(TRIANGLE_SIZE))
        .and_then(|body| body.checked_add(HEADER_SIZE + 4))
        == Some(bytes.len())
}

/// Reader-side ASCII check: tolerates leading whitespace and upper-case
/// keywords, and rejects "solid" headers that carry NUL bytes like binary
/// headers do.
fn looks_like_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let opens_with_solid = bytes[start..]
        .get(..ASCII_SIGNATURE.len())
        .is_some_and(|token| token.eq_ignore_ascii_case(ASCII_SIGNATURE));
    let header = &bytes[..bytes.len().min(HEADER_SIZE)];
    opens_with_solid && !has_binary_layout(bytes) && !header.contains(&0)
}

/// Load a mesh from an STL file.
///
/// Automatically detects ASCII vs binary format.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist ([`IoError::FileNotFound`])
/// - The file cannot be read
/// - The file content is not valid STL
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let mesh = load_stl("model.stl").unwrap();
/// println!("Loaded {} faces", mesh.faces.len());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<IndexedMesh> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;

    let mesh = load_stl_from_bytes(&bytes)?;
    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded STL"
    );
    Ok(mesh)
}

/// Decode STL data held in memory.
///
/// # Errors
///
/// Returns an error if the data is not valid ASCII or binary STL.
pub fn load_stl_from_bytes(bytes: &[u8]) -> IoResult<IndexedMesh> {
    if bytes.len() < 6 {
        return Err(IoError::invalid_content("file too small to be valid STL"));
    }

    if looks_like_ascii(bytes) {
        parse_ascii(std::str::from_utf8(bytes)?)
    } else {
        parse_binary(bytes)
    }
}

/// Accumulates facets, sharing bit-identical corners.
#[derive(Default)]
struct VertexPool {
    lookup: HashMap<[u64; 3], u32>,
    mesh: IndexedMesh,
}

impl VertexPool {
    fn with_capacity(faces: usize) -> Self {
        Self {
            lookup: HashMap::with_capacity(faces / 2 + 3),
            mesh: IndexedMesh::with_capacity(faces / 2 + 3, faces),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    // Truncation: mesh indices are u32, meshes with >4B vertices are unsupported
    fn intern(&mut self, corner: [f64; 3]) -> u32 {
        // Adding 0.0 folds -0.0 into 0.0 so both spellings share a vertex.
        let key = corner.map(|c| (c + 0.0).to_bits());
        let Self { lookup, mesh } = self;
        *lookup.entry(key).or_insert_with(|| {
            let idx = mesh.vertices.len() as u32;
            mesh.vertices.push(Vertex::from(corner));
            idx
        })
    }

    fn push_face(&mut self, corners: [[f64; 3]; 3]) {
        let face = corners.map(|c| self.intern(c));
        self.mesh.faces.push(face);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

/// Parse binary STL data.
fn parse_binary(bytes: &[u8]) -> IoResult<IndexedMesh> {
    let face_count = binary_face_count(bytes).ok_or(IoError::InvalidHeader {
        expected: HEADER_SIZE + 4,
        got: bytes.len(),
    })?;

    let body = &bytes[HEADER_SIZE + 4..];
    let complete = body.len() / TRIANGLE_SIZE;
    if complete < face_count as usize {
        #[allow(clippy::cast_possible_truncation)]
        // complete < face_count, which is a u32
        let got = complete as u32;
        return Err(IoError::InvalidFaceCount {
            expected: face_count,
            got,
        });
    }

    let mut pool = VertexPool::with_capacity(face_count as usize);
    for record in body.chunks_exact(TRIANGLE_SIZE).take(face_count as usize) {
        // Skip normal (12 bytes), read 3 vertices (36 bytes total)
        pool.push_face([
            read_vec3(&record[12..24]),
            read_vec3(&record[24..36]),
            read_vec3(&record[36..48]),
        ]);
    }

    Ok(pool.finish())
}

/// Read 3 little-endian f32s.
fn read_vec3(buf: &[u8]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (slot, chunk) in out.iter_mut().zip(buf.chunks_exact(4)) {
        *slot = f64::from(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    out
}

/// Parse ASCII STL text, across any number of `solid` blocks.
fn parse_ascii(text: &str) -> IoResult<IndexedMesh> {
    let mut pool = VertexPool::default();
    let mut corners: Vec<[f64; 3]> = Vec::with_capacity(3);
    let mut in_loop = false;

    for (line_idx, line) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                corners.push(parse_coords(tokens, line_no)?);
            }
            "endloop" => {
                in_loop = false;
            }
            "endfacet" => {
                let [a, b, c] = corners[..] else {
                    return Err(IoError::invalid_content(format!(
                        "line {line_no}: facet has {} vertices, expected 3",
                        corners.len()
                    )));
                };
                pool.push_face([a, b, c]);
                corners.clear();
            }
            // solid / endsolid / facet normal: names are irrelevant here and
            // normals are recomputed on export
            _ => {}
        }
    }

    Ok(pool.finish())
}

fn parse_coords<'a>(mut tokens: impl Iterator<Item = &'a str>, line: usize) -> IoResult<[f64; 3]> {
    let mut out = [0.0; 3];
    for slot in &mut out {
        let token = tokens.next().ok_or_else(|| {
            IoError::invalid_content(format!("line {line}: vertex needs three coordinates"))
        })?;
        *slot = token.parse().map_err(|source| IoError::ParseFloat {
            line,
            token: token.to_string(),
            source,
        })?;
    }
    Ok(out)
}

/// Save a mesh to an STL file.
///
/// ASCII output is a single anonymous `solid` block.
///
/// # Errors
///
/// Returns an error if the file cannot be written or a face references a
/// missing vertex.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{load_stl, save_stl};
///
/// let mesh = load_stl("input.stl").unwrap();
/// save_stl(&mesh, "output.stl", true).unwrap(); // Binary
/// save_stl(&mesh, "output_ascii.stl", false).unwrap(); // ASCII
/// ```
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, binary: bool) -> IoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if binary {
        write_stl_binary(mesh, &mut writer)?;
    } else {
        write_stl_ascii(mesh, &mut writer, "")?;
    }
    writer.flush()?;
    Ok(())
}

/// Resolve faces to triangles, rejecting dangling indices up front so no
/// partial output is produced.
fn triangles(mesh: &IndexedMesh) -> IoResult<impl Iterator<Item = Triangle> + '_> {
    mesh.validate_indices().map_err(|bad| {
        IoError::invalid_content(format!(
            "face {} references vertex {} but the mesh has {} vertices",
            bad.face, bad.vertex, bad.vertex_count
        ))
    })?;
    Ok((0..mesh.face_count()).filter_map(|f| mesh.triangle(f)))
}

/// Write a mesh as binary STL.
///
/// # Errors
///
/// Returns an error if writing fails or a face references a missing vertex.
pub fn write_stl_binary<W: Write>(mesh: &IndexedMesh, writer: &mut W) -> IoResult<()> {
    let tris = triangles(mesh)?;

    // Write 80-byte header (padded with spaces)
    let mut header = [b' '; HEADER_SIZE];
    let text = b"Binary STL written by mesh-io";
    header[..text.len()].copy_from_slice(text);
    writer.write_all(&header)?;

    #[allow(clippy::cast_possible_truncation)]
    // Face count: mesh faces limited to u32 range by design
    let face_count = mesh.faces.len() as u32;
    writer.write_all(&face_count.to_le_bytes())?;

    for tri in tris {
        let n = tri.normal_or_zero();
        write_vec3_binary(writer, [n.x, n.y, n.z])?;
        for p in [tri.v0, tri.v1, tri.v2] {
            write_vec3_binary(writer, [p.x, p.y, p.z])?;
        }
        // Attribute byte count
        writer.write_all(&0u16.to_le_bytes())?;
    }

    Ok(())
}

fn write_vec3_binary<W: Write>(writer: &mut W, v: [f64; 3]) -> IoResult<()> {
    for c in v {
        #[allow(clippy::cast_possible_truncation)]
        // Truncation: f64 to f32 is intentional for STL format
        let c = c as f32;
        writer.write_all(&c.to_le_bytes())?;
    }
    Ok(())
}

/// Write a mesh as one ASCII `solid` block.
///
/// An empty `name` produces an anonymous block (`solid` / `endsolid`).
/// Coordinates use the shortest representation that parses back to the
/// same `f64`, so positions survive a text round trip exactly.
///
/// # Errors
///
/// Returns an error if writing fails or a face references a missing vertex.
pub fn write_stl_ascii<W: Write>(mesh: &IndexedMesh, writer: &mut W, name: &str) -> IoResult<()> {
    let tris = triangles(mesh)?;

    writeln!(writer, "{}", solid_marker("solid", name))?;
    for tri in tris {
        let n = tri.normal_or_zero();
        writeln!(writer, "  facet normal {:e} {:e} {:e}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for p in [tri.v0, tri.v1, tri.v2] {
            writeln!(writer, "      vertex {:e} {:e} {:e}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "{}", solid_marker("endsolid", name))?;

    Ok(())
}

/// Render a mesh as ASCII STL text in memory.
///
/// # Errors
///
/// Returns an error if a face references a missing vertex.
///
/// ```
/// use mesh_io::to_ascii_string;
/// use mesh_types::IndexedMesh;
///
/// let mesh = IndexedMesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// );
/// let text = to_ascii_string(&mesh, "inlet").unwrap();
/// assert!(text.starts_with("solid inlet\n"));
/// assert!(text.ends_with("endsolid inlet\n"));
/// ```
pub fn to_ascii_string(mesh: &IndexedMesh, name: &str) -> IoResult<String> {
    let mut buf = Vec::with_capacity(32 + mesh.faces.len() * 192);
    write_stl_ascii(mesh, &mut buf, name)?;
    String::from_utf8(buf).map_err(|e| IoError::Utf8(e.utf8_error()))
}

/// `solid <name>` / `endsolid <name>`, or the bare keyword when unnamed.
#[must_use]
pub fn solid_marker(keyword: &str, name: &str) -> String {
    if name.is_empty() {
        keyword.to_string()
    } else {
        format!("{keyword} {name}")
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::unnecessary_raw_string_hashes
)]
mod tests {
    use super::*;
    use mesh_types::Point3;

    fn create_test_square() -> IndexedMesh {
        IndexedMesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    fn binary_bytes(mesh: &IndexedMesh) -> Vec<u8> {
        let mut buf = Vec::new();
        write_stl_binary(mesh, &mut buf).unwrap();
        buf
    }

    #[test]
    fn detects_ascii_by_prefix() {
        let text = to_ascii_string(&create_test_square(), "").unwrap();
        assert_eq!(detect_stl_encoding(text.as_bytes()), StlEncoding::Ascii);
    }

    #[test]
    fn detects_binary_even_with_solid_header() {
        let mut bytes = binary_bytes(&create_test_square());
        bytes[..5].copy_from_slice(b"solid");
        assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Binary);

        let mesh = load_stl_from_bytes(&bytes).unwrap();
        assert_eq!(mesh.face_count(), 2);
    }

    #[test]
    fn leading_whitespace_is_not_canonical() {
        assert_eq!(
            detect_stl_encoding(b"  solid x\nendsolid x\n"),
            StlEncoding::Binary
        );
        // ...but the reader still accepts it
        assert!(load_stl_from_bytes(b"  solid x\nendsolid x\n").is_ok());
    }

    #[test]
    fn ascii_stl_parsing_shares_corners() {
        let ascii_stl = br#"solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid test"#;

        let mesh = load_stl_from_bytes(ascii_stl).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn negative_zero_shares_vertex() {
        let ascii_stl = b"solid z
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
facet normal 0 0 1
outer loop
vertex -0 0 -0.0
vertex 0 1 0
vertex -1 0 0
endloop
endfacet
endsolid z
";
        let mesh = load_stl_from_bytes(ascii_stl).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces[1][0], 0);
    }

    #[test]
    fn reads_every_solid_block() {
        let square = create_test_square();
        let mut text = to_ascii_string(&square, "top").unwrap();
        let mut shifted = square.clone();
        for v in &mut shifted.vertices {
            v.position.y -= 1.0;
        }
        text.push_str(&to_ascii_string(&shifted, "bottom").unwrap());

        let mesh = load_stl_from_bytes(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 4);
        // The edge y = 0 is shared between the blocks
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn ascii_text_roundtrip_is_exact() {
        let mut mesh = create_test_square();
        mesh.vertices[1].position = Point3::new(0.1 + 0.2, 1e-5 / 3.0, -7.25e-12);

        let text = to_ascii_string(&mesh, "").unwrap();
        let loaded = load_stl_from_bytes(text.as_bytes()).unwrap();

        assert_eq!(loaded.faces, mesh.faces);
        for (a, b) in loaded.vertices.iter().zip(&mesh.vertices) {
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn anonymous_block_has_bare_markers() {
        let text = to_ascii_string(&create_test_square(), "").unwrap();
        assert!(text.starts_with("solid\n"));
        assert!(text.ends_with("endsolid\n"));
        assert_eq!(text.matches("endfacet").count(), 2);
    }

    #[test]
    fn facet_with_two_vertices_is_rejected() {
        let bad = b"solid bad
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
endloop
endfacet
endsolid bad
";
        let err = load_stl_from_bytes(bad).unwrap_err();
        assert!(matches!(err, IoError::InvalidContent { .. }));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn bad_number_reports_line() {
        let bad = b"solid bad
facet normal 0 0 1
outer loop
vertex 0 0 zero
";
        match load_stl_from_bytes(bad).unwrap_err() {
            IoError::ParseFloat { line, token, .. } => {
                assert_eq!(line, 4);
                assert_eq!(token, "zero");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn binary_roundtrip_keeps_topology() {
        let original = create_test_square();
        let loaded = load_stl_from_bytes(&binary_bytes(&original)).unwrap();
        assert_eq!(loaded.faces, original.faces);
        assert_eq!(loaded.vertex_count(), 4);
    }

    #[test]
    fn truncated_binary_is_rejected() {
        let mut bytes = binary_bytes(&create_test_square());
        bytes.truncate(bytes.len() - 10);
        match load_stl_from_bytes(&bytes).unwrap_err() {
            IoError::InvalidFaceCount { expected, got } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dangling_face_is_not_written() {
        let mut mesh = create_test_square();
        mesh.faces.push([0, 1, 9]);
        let mut buf = Vec::new();
        assert!(write_stl_ascii(&mesh, &mut buf, "").is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_stl("nonexistent_file_12345.stl");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn save_and_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.stl");
        save_stl(&create_test_square(), &path, false).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Ascii);
        assert_eq!(load_stl(&path).unwrap().face_count(), 2);
    }
}
