// ============================================================================
// splatreel-core/src/ply/convert.rs
// ============================================================================
//
// FORMAT CONVERTER: Native Predictor PLY to Standard 3DGS PLY
//
// The predictor's native PLY carries the Gaussians in a `vertex` element plus
// model metadata elements (extrinsic, intrinsic, image_size, frame,
// disparity, color_space, version). Standard 3DGS viewers reject those extra
// elements, so the converter rewrites the file with the `vertex` element only.
//
// GUARANTEES:
// - Pure re-projection: same properties, same types, same row order, values
//   copied bit for bit. No resampling, filtering or reordering.
// - Output is binary little-endian regardless of the input encoding.
// - Output is written to a temporary file and renamed into place, so a failed
//   conversion never leaves a partial standard file behind.
//
// AI-ASSISTANT-INFO: Streaming vertex-only PLY rewrap

// ---- Internal crate imports ----
use super::body::{BodyReader, write_row};
use super::gaussians::STANDARD_VERTEX_PROPERTIES;
use super::header::{PlyFormat, PlyHeader};
use crate::error::{CoreError, CoreResult};
use crate::utils::get_file_size;

// ---- External crate imports ----
use log::{debug, warn};
use tempfile::Builder as TempFileBuilder;

// ---- Standard library imports ----
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Name of the element that holds the Gaussians.
pub const VERTEX_ELEMENT: &str = "vertex";

/// Outcome of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub gaussian_count: usize,
    pub output_size: u64,
    /// Elements present in the native file that were not carried over.
    pub dropped_elements: Vec<String>,
    /// Set when the native file could not be deleted after conversion.
    pub native_removal_error: Option<String>,
}

/// Converts `native` to a standard vertex-only PLY at `standard`, then
/// deletes `native`.
///
/// A failure to delete the native file does not fail the conversion; it is
/// recorded in [`ConversionReport::native_removal_error`].
pub fn convert_native_to_standard(native: &Path, standard: &Path) -> CoreResult<ConversionReport> {
    let mut report = rewrap_to_standard(native, standard)?;

    if let Err(e) = fs::remove_file(native) {
        warn!("Could not remove native PLY {}: {}", native.display(), e);
        report.native_removal_error = Some(e.to_string());
    }

    Ok(report)
}

/// Converts `native` to a standard vertex-only PLY at `standard`, leaving
/// `native` in place.
pub fn rewrap_to_standard(native: &Path, standard: &Path) -> CoreResult<ConversionReport> {
    if native == standard {
        return Err(CoreError::ConversionError(format!(
            "input and output are the same file: {}",
            native.display()
        )));
    }

    let file = File::open(native).map_err(|e| {
        CoreError::ConversionError(format!("cannot open native PLY {}: {}", native.display(), e))
    })?;
    let mut reader = BufReader::with_capacity(1 << 20, file);
    let header = PlyHeader::read(&mut reader)?;

    // ========================================================================
    // STEP 1: LOCATE AND VALIDATE THE VERTEX ELEMENT
    // ========================================================================

    let vertex_index = header
        .elements
        .iter()
        .position(|e| e.name == VERTEX_ELEMENT)
        .ok_or_else(|| {
            CoreError::ConversionError(format!("vertex element not found in {}", native.display()))
        })?;
    let vertex = header.elements[vertex_index].clone();

    for required in ["x", "y", "z"] {
        if vertex.property(required).is_none() {
            return Err(CoreError::ConversionError(format!(
                "vertex element has no '{required}' property"
            )));
        }
    }
    let missing: Vec<&str> = STANDARD_VERTEX_PROPERTIES
        .iter()
        .copied()
        .filter(|name| vertex.property(name).is_none())
        .collect();
    if !missing.is_empty() {
        warn!(
            "Vertex element of {} lacks standard 3DGS properties: {}",
            native.display(),
            missing.join(", ")
        );
    }

    debug!(
        "Converting {} ({}, {} Gaussians, {} elements)",
        native.display(),
        header.format,
        vertex.count,
        header.elements.len()
    );

    // ========================================================================
    // STEP 2: STREAM ROWS INTO A TEMPORARY OUTPUT
    // ========================================================================

    let output_dir = standard
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = TempFileBuilder::new()
        .prefix(".splatreel-convert-")
        .suffix(".ply")
        .tempfile_in(output_dir)?;

    let mut out_header = PlyHeader::new(PlyFormat::BinaryLittleEndian);
    out_header.elements.push(vertex.clone());

    {
        let mut writer = BufWriter::with_capacity(1 << 20, temp.as_file());
        out_header.write(&mut writer)?;

        let mut body = BodyReader::new(reader, header.format);
        for element in &header.elements[..vertex_index] {
            body.skip_element(element)?;
        }
        for _ in 0..vertex.count {
            let row = body.read_row(&vertex)?;
            write_row(&mut writer, &vertex, &row, PlyFormat::BinaryLittleEndian)?;
        }
        // Trailing elements are read so a truncated native file is rejected.
        for element in &header.elements[vertex_index + 1..] {
            body.skip_element(element)?;
        }

        writer.flush()?;
    }

    // ========================================================================
    // STEP 3: MOVE INTO PLACE
    // ========================================================================

    temp.persist(standard).map_err(|e| {
        CoreError::ConversionError(format!("cannot write {}: {}", standard.display(), e.error))
    })?;

    let dropped_elements = header
        .elements
        .iter()
        .filter(|e| e.name != VERTEX_ELEMENT)
        .map(|e| e.name.clone())
        .collect();

    Ok(ConversionReport {
        output_path: standard.to_path_buf(),
        gaussian_count: vertex.count,
        output_size: get_file_size(standard)?,
        dropped_elements,
        native_removal_error: None,
    })
}

/// Default output path for a standalone conversion: `<stem>_standard.ply`
/// next to the input.
pub fn default_standard_path(native: &Path) -> PathBuf {
    let stem = native
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    native.with_file_name(format!("{stem}_standard.ply"))
}
