//! Conversion of binary STL files to the ASCII encoding.

use std::fmt;
use std::path::{Path, PathBuf};

use mesh_io::{StlEncoding, detect_stl_encoding};
use tracing::{debug, info};

use crate::error::PrepResult;
use crate::preprocessor::{Preprocessor, decode, encode_ascii, owned, read_input, write_output};
use crate::validate::ValidationOutcome;

/// Outcome of [`Preprocessor::normalize_to_ascii`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// The file that was inspected.
    pub input: PathBuf,
    /// Where the ASCII mesh now lives. Equal to `input` when nothing was
    /// written.
    pub output: PathBuf,
    /// The input was already ASCII and was left untouched.
    pub already_ascii: bool,
    /// Facets written. Zero when the input was already ASCII, since it is
    /// not decoded.
    pub faces: usize,
    /// Validator verdict on the written file. `None` when nothing was
    /// written.
    pub validation: Option<ValidationOutcome>,
}

impl fmt::Display for NormalizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.already_ascii {
            return write!(f, "{} is already ASCII", self.input.display());
        }
        write!(
            f,
            "converted {} to ASCII as {} ({} facets)",
            self.input.display(),
            self.output.display(),
            self.faces
        )
    }
}

impl Preprocessor {
    /// Make sure an STL file is in the ASCII encoding.
    ///
    /// An input that is already ASCII is returned unchanged: nothing is
    /// written and `output` is ignored. A binary input is decoded and
    /// written as a single anonymous ASCII solid to `output`, or over the
    /// input itself when `output` is `None`. The written file is then handed
    /// to the validator; its verdict is logged and returned, never raised.
    ///
    /// # Errors
    ///
    /// - [`PrepError::MeshLoad`](crate::PrepError::MeshLoad) if the input
    ///   cannot be read or decoded. Nothing is written.
    /// - [`PrepError::Io`](crate::PrepError::Io) if the output cannot be
    ///   written.
    pub fn normalize_to_ascii(
        &self,
        input: impl AsRef<Path>,
        output: Option<&Path>,
    ) -> PrepResult<NormalizeReport> {
        let input = input.as_ref();
        let bytes = read_input(input)?;

        if detect_stl_encoding(&bytes) == StlEncoding::Ascii {
            if !self.is_quiet() {
                info!(path = %input.display(), "Already ASCII");
            }
            return Ok(NormalizeReport {
                input: owned(input),
                output: owned(input),
                already_ascii: true,
                faces: 0,
                validation: None,
            });
        }

        let mesh = decode(input, &bytes)?;
        let output = output.unwrap_or(input);
        debug!(
            faces = mesh.faces.len(),
            vertices = mesh.vertices.len(),
            "Decoded binary STL"
        );

        let text = encode_ascii(&mesh, output)?;
        write_output(output, text.as_bytes())?;
        if !self.is_quiet() {
            info!(
                input = %input.display(),
                output = %output.display(),
                "Converted to ASCII"
            );
        }

        let validation = self.validate_output(output);
        Ok(NormalizeReport {
            input: owned(input),
            output: owned(output),
            already_ascii: false,
            faces: mesh.faces.len(),
            validation: Some(validation),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use crate::validate::NoValidation;
    use mesh_io::{load_stl, to_ascii_string, write_stl_binary};
    use mesh_types::IndexedMesh;
    use tempfile::tempdir;

    fn triangle() -> IndexedMesh {
        IndexedMesh::from_positions(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        )
    }

    fn binary_bytes(mesh: &IndexedMesh) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_stl_binary(mesh, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn ascii_input_is_left_alone() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.stl");
        let text = to_ascii_string(&triangle(), "part").unwrap();
        std::fs::write(&input, &text).unwrap();
        let elsewhere = dir.path().join("unused.stl");

        let prep = Preprocessor::new(NoValidation);
        let report = prep.normalize_to_ascii(&input, Some(&elsewhere)).unwrap();

        assert!(report.already_ascii);
        assert_eq!(report.output, input);
        assert!(report.validation.is_none());
        assert!(!elsewhere.exists());
        assert_eq!(std::fs::read_to_string(&input).unwrap(), text);
    }

    #[test]
    fn binary_input_is_converted_in_place() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.stl");
        std::fs::write(&input, binary_bytes(&triangle())).unwrap();

        let report = Preprocessor::new(NoValidation)
            .normalize_to_ascii(&input, None)
            .unwrap();

        assert!(!report.already_ascii);
        assert_eq!(report.output, input);
        assert_eq!(report.faces, 1);
        let bytes = std::fs::read(&input).unwrap();
        assert_eq!(detect_stl_encoding(&bytes), StlEncoding::Ascii);
        assert_eq!(load_stl(&input).unwrap(), triangle());
    }

    #[test]
    fn binary_input_with_separate_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.stl");
        let output = dir.path().join("part_ascii.stl");
        let original = binary_bytes(&triangle());
        std::fs::write(&input, &original).unwrap();

        let report = Preprocessor::new(NoValidation)
            .normalize_to_ascii(&input, Some(&output))
            .unwrap();

        assert_eq!(report.output, output);
        assert_eq!(std::fs::read(&input).unwrap(), original);
        assert!(std::fs::read(&output).unwrap().starts_with(b"solid"));
        assert!(matches!(
            report.validation,
            Some(ValidationOutcome::Unavailable { .. })
        ));
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("part.stl");
        std::fs::write(&input, binary_bytes(&triangle())).unwrap();
        let prep = Preprocessor::new(NoValidation);

        prep.normalize_to_ascii(&input, None).unwrap();
        let first = std::fs::read(&input).unwrap();
        let second = prep.normalize_to_ascii(&input, None).unwrap();

        assert!(second.already_ascii);
        assert_eq!(std::fs::read(&input).unwrap(), first);
    }

    #[test]
    fn unreadable_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.stl");
        let output = dir.path().join("out.stl");
        // Declares 5 triangles, carries none.
        let mut bytes = vec![0u8; 84];
        bytes[80] = 5;
        std::fs::write(&input, &bytes).unwrap();

        let err = Preprocessor::new(NoValidation)
            .normalize_to_ascii(&input, Some(&output))
            .unwrap_err();
        assert!(matches!(err, PrepError::MeshLoad { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let dir = tempdir().unwrap();
        let err = Preprocessor::new(NoValidation)
            .normalize_to_ascii(dir.path().join("absent.stl"), None)
            .unwrap_err();
        assert!(matches!(err, PrepError::MeshLoad { .. }));
    }
}
