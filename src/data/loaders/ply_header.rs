//! Reader for the header of PLY (Stanford polygon) files.
//!
//! The header is ASCII for every PLY flavour, including binary ones, and
//! declares the vertex count up front, so sizing a mesh never touches the
//! body.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use ply_rs_bw::parser::Parser;
use ply_rs_bw::ply::DefaultElement;

use crate::data::loader::MeshReader;
use crate::format::FormatError;

/// Upper bound on header bytes read before giving up.
const MAX_HEADER_BYTES: u64 = 64 * 1024;

/// Reads the `element vertex N` declaration from a PLY header.
pub struct PlyHeaderReader;

impl PlyHeaderReader {
    const MAGIC: &'static [u8] = b"ply";

    /// Parse the vertex count from a PLY header stream.
    ///
    /// At most `MAX_HEADER_BYTES` are read, so a file without line breaks
    /// cannot be pulled into memory whole.
    pub fn parse_vertex_count<R: BufRead>(reader: R, path: &Path) -> Result<usize, FormatError> {
        let mut reader = reader.take(MAX_HEADER_BYTES);
        let header = Parser::<DefaultElement>::new()
            .read_header(&mut reader)
            .map_err(|err| FormatError::invalid_ply(path, err.to_string()))?;

        header
            .elements
            .get("vertex")
            .map(|element| element.count)
            .ok_or_else(|| FormatError::invalid_ply(path, "header declares no vertex element"))
    }
}

impl MeshReader for PlyHeaderReader {
    fn id(&self) -> &'static str {
        "ply"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ply"]
    }

    fn can_read(&self, header: &[u8]) -> bool {
        header.starts_with(Self::MAGIC)
    }

    fn point_count(&self, path: &Path) -> Result<usize, FormatError> {
        let file = File::open(path)?;
        let count = Self::parse_vertex_count(BufReader::new(file), path)?;
        log::debug!("PlyHeaderReader: {:?} has {} vertices", path, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &[u8]) -> Result<usize, FormatError> {
        PlyHeaderReader::parse_vertex_count(Cursor::new(text), Path::new("test.ply"))
    }

    #[test]
    fn test_ascii_header() {
        let header = b"ply\nformat ascii 1.0\ncomment made by hand\nelement vertex 6\n\
                       property float x\nproperty float y\nproperty float z\n\
                       element face 2\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n";
        assert_eq!(parse(header).unwrap(), 6);
    }

    #[test]
    fn test_binary_body_is_not_read() {
        let mut data = b"ply\nformat binary_little_endian 1.0\nelement vertex 2\n\
                         property float x\nend_header\n"
            .to_vec();
        data.extend_from_slice(&[0xff, 0xfe, 0x00, 0x80]);
        assert_eq!(parse(&data).unwrap(), 2);
    }

    #[test]
    fn test_missing_magic() {
        assert!(matches!(
            parse(b"obj\nformat ascii 1.0\nelement vertex 3\nend_header\n"),
            Err(FormatError::InvalidPly { .. })
        ));
    }

    #[test]
    fn test_no_vertex_element() {
        let result = parse(b"ply\nformat ascii 1.0\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n");
        assert!(matches!(result, Err(FormatError::InvalidPly { .. })));
    }

    #[test]
    fn test_unterminated_header() {
        assert!(matches!(
            parse(b"ply\nformat ascii 1.0\nelement vertex 3\n"),
            Err(FormatError::InvalidPly { .. })
        ));
    }

    #[test]
    fn test_bad_count() {
        assert!(parse(b"ply\nformat ascii 1.0\nelement vertex many\nend_header\n").is_err());
    }

    #[test]
    fn test_header_read_is_bounded() {
        // Magic followed by a long run of bytes with no line break.
        let mut data = b"ply".to_vec();
        data.resize(4 * MAX_HEADER_BYTES as usize, b'a');
        let mut cursor = Cursor::new(data);

        let result = PlyHeaderReader::parse_vertex_count(&mut cursor, Path::new("test.ply"));
        assert!(matches!(result, Err(FormatError::InvalidPly { .. })));
        assert!(cursor.position() <= MAX_HEADER_BYTES);
    }

    #[test]
    fn test_point_count_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mesh.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nend_header\n0\n1\n2\n3\n",
        )
        .unwrap();
        assert_eq!(PlyHeaderReader.point_count(&path).unwrap(), 4);
    }
}
