//! PLY reading, writing and the native-to-standard Gaussian converter.
//!
//! The predictor writes its output as a PLY file with a `vertex` element (one
//! row per Gaussian) followed by model metadata elements. Viewers expect a
//! file holding only the `vertex` element, so the converter rewraps it.

pub mod body;
pub mod convert;
pub mod gaussians;
pub mod header;

pub use body::{BodyReader, PropertyValue, Row, Scalar, write_row};
pub use convert::{ConversionReport, convert_native_to_standard, default_standard_path, rewrap_to_standard};
pub use gaussians::{Gaussian, GaussianSet};
pub use header::{ElementDef, PlyFormat, PlyHeader, PropertyDef, PropertyKind, ScalarType};

use crate::error::CoreResult;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A fully loaded PLY file.
///
/// Convenient for small files and tests. Large Gaussian sets go through the
/// streaming path in [`convert`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlyData {
    pub header: PlyHeader,
    /// Rows per element, in header order.
    pub elements: Vec<Vec<Row>>,
}

impl PlyData {
    pub fn read_from(path: &Path) -> CoreResult<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = PlyHeader::read(&mut reader)?;
        let mut body = BodyReader::new(reader, header.format);

        let mut elements = Vec::with_capacity(header.elements.len());
        for element in &header.elements {
            let mut rows = Vec::with_capacity(element.count.min(1 << 20));
            for _ in 0..element.count {
                rows.push(body.read_row(element)?);
            }
            elements.push(rows);
        }

        Ok(Self { header, elements })
    }

    /// Writes the file using the encoding in `self.header.format`.
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.header.write(&mut writer)?;
        for (element, rows) in self.header.elements.iter().zip(&self.elements) {
            for row in rows {
                write_row(&mut writer, element, row, self.header.format)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn rows(&self, element: &str) -> Option<&[Row]> {
        let index = self.header.elements.iter().position(|e| e.name == element)?;
        self.elements.get(index).map(Vec::as_slice)
    }
}
