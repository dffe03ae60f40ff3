//! Merging several STL bodies into one multi-region file.
//!
//! OpenFOAM's `snappyHexMesh` assigns boundary conditions per `solid` block,
//! so each input body becomes one named block in the output, in input order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hashbrown::HashSet;
use mesh_io::{IoError, StlEncoding, detect_stl_encoding, solid_marker};
use tracing::{debug, info, warn};

use crate::error::{PrepError, PrepResult};
use crate::preprocessor::{Preprocessor, decode, encode_ascii, owned, read_input, write_output};
use crate::validate::ValidationOutcome;

/// A named mesh body to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Name written after `solid` / `endsolid`.
    pub name: String,
    /// STL file holding the body, ASCII or binary.
    pub path: PathBuf,
}

impl Region {
    /// Creates a region.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Check that the name can stand as a single `solid` token.
    ///
    /// # Errors
    ///
    /// Returns [`PrepError::InvalidParameter`] if the name is empty or
    /// contains whitespace.
    pub fn validate(&self) -> PrepResult<()> {
        if self.name.is_empty() {
            return Err(PrepError::InvalidParameter(format!(
                "region for {} has an empty name",
                self.path.display()
            )));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(PrepError::InvalidParameter(format!(
                "region name '{}' contains whitespace",
                self.name
            )));
        }
        Ok(())
    }
}

impl FromStr for Region {
    type Err = PrepError;

    /// Parses `NAME=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s.split_once('=').ok_or_else(|| {
            PrepError::InvalidParameter(format!("expected NAME=PATH, got '{s}'"))
        })?;
        if path.is_empty() {
            return Err(PrepError::InvalidParameter(format!(
                "region '{name}' has no path"
            )));
        }
        let region = Self::new(name, path);
        region.validate()?;
        Ok(region)
    }
}

/// Outcome of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// The file written.
    pub output: PathBuf,
    /// Region names in output order.
    pub regions: Vec<String>,
    /// How many bodies were binary and had to be converted.
    pub converted: usize,
    /// Validator verdict on the written file.
    pub validation: ValidationOutcome,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merged {} regions into {}: {}",
            self.regions.len(),
            self.output.display(),
            self.regions.join(", ")
        )
    }
}

impl Preprocessor {
    /// Merge `bodies[i]` under the name `names[i]` into `output`.
    ///
    /// See [`Preprocessor::merge_region_list`].
    ///
    /// # Errors
    ///
    /// [`PrepError::ParameterMismatch`] if the two lists differ in length,
    /// before any file is touched; otherwise as
    /// [`Preprocessor::merge_region_list`].
    pub fn merge_regions<P, S>(
        &self,
        bodies: &[P],
        names: &[S],
        output: impl AsRef<Path>,
    ) -> PrepResult<MergeReport>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        if bodies.len() != names.len() {
            return Err(PrepError::ParameterMismatch {
                bodies: bodies.len(),
                names: names.len(),
            });
        }
        let regions: Vec<Region> = bodies
            .iter()
            .zip(names)
            .map(|(body, name)| Region::new(name.as_ref(), body.as_ref()))
            .collect();
        self.merge_region_list(&regions, output)
    }

    /// Write every region as one `solid <name>` … `endsolid <name>` block
    /// of `output`, in the given order.
    ///
    /// Binary bodies are converted to ASCII in memory. Any `solid` or
    /// `endsolid` line already in a body is dropped, so a body that was
    /// itself a merge result is flattened into the new block. Lines are
    /// re-terminated with `\n`. The output is written only after every body
    /// has been read, so a failure leaves no output file behind. Duplicate
    /// names are allowed but logged.
    ///
    /// # Errors
    ///
    /// - [`PrepError::InvalidParameter`] for an empty or whitespace-bearing
    ///   region name, before any file is touched.
    /// - [`PrepError::MeshLoad`] if a body cannot be read or decoded.
    /// - [`PrepError::Io`] if the output cannot be written.
    pub fn merge_region_list(
        &self,
        regions: &[Region],
        output: impl AsRef<Path>,
    ) -> PrepResult<MergeReport> {
        let output = output.as_ref();
        for region in regions {
            region.validate()?;
        }

        let mut seen = HashSet::new();
        for region in regions {
            if !seen.insert(region.name.as_str()) {
                warn!(name = %region.name, "Region name used more than once");
            }
        }

        let mut merged = String::new();
        let mut converted = 0;
        for region in regions {
            let (body, was_binary) = ascii_body(&region.path, output)?;
            if was_binary {
                converted += 1;
            }
            append_region(&mut merged, &region.name, &body);
            debug!(
                name = %region.name,
                path = %region.path.display(),
                binary = was_binary,
                "Added region"
            );
        }

        write_output(output, merged.as_bytes())?;
        let names: Vec<String> = regions.iter().map(|r| r.name.clone()).collect();
        if !self.is_quiet() {
            info!(
                output = %output.display(),
                regions = ?names,
                "Merged regions"
            );
        }

        let validation = self.validate_output(output);
        Ok(MergeReport {
            output: owned(output),
            regions: names,
            converted,
            validation,
        })
    }
}

/// Text of one body, converting binary STL on the way.
fn ascii_body(path: &Path, output: &Path) -> PrepResult<(String, bool)> {
    let bytes = read_input(path)?;
    if detect_stl_encoding(&bytes) == StlEncoding::Binary {
        let mesh = decode(path, &bytes)?;
        return Ok((encode_ascii(&mesh, output)?, true));
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| PrepError::mesh_load(path, IoError::Utf8(e.utf8_error())))?;
    Ok((text, false))
}

fn is_region_marker(line: &str) -> bool {
    line.split_whitespace().next().is_some_and(|token| {
        token.eq_ignore_ascii_case("solid") || token.eq_ignore_ascii_case("endsolid")
    })
}

/// Append `body` to `out` as the region `name`.
fn append_region(out: &mut String, name: &str, body: &str) {
    out.push_str(&solid_marker("solid", name));
    out.push('\n');
    for line in body.lines().filter(|line| !is_region_marker(line)) {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&solid_marker("endsolid", name));
    out.push('\n');
}
