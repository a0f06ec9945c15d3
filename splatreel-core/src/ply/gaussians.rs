//! Typed view of the standard 3DGS vertex layout.

use super::body::{PropertyValue, Row, Scalar};
use super::header::{ElementDef, PlyFormat, PlyHeader, PropertyDef, ScalarType};
use super::PlyData;
use crate::error::{CoreError, CoreResult};

/// Vertex properties of a standard 3DGS file, in file order.
pub const STANDARD_VERTEX_PROPERTIES: [&str; 14] = [
    "x", "y", "z",
    "f_dc_0", "f_dc_1", "f_dc_2",
    "opacity",
    "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
];

/// One Gaussian primitive as stored in a 3DGS PLY.
///
/// `color_dc` holds the degree-0 spherical harmonics coefficients, `opacity`
/// is pre-sigmoid, `scale` is log-scale and `rotation` is a `(w, x, y, z)`
/// quaternion; the values are carried as stored, never re-activated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub position: [f32; 3],
    pub color_dc: [f32; 3],
    pub opacity: f32,
    pub scale: [f32; 3],
    pub rotation: [f32; 4],
}

impl Gaussian {
    fn to_row(self) -> Row {
        self.position
            .into_iter()
            .chain(self.color_dc)
            .chain([self.opacity])
            .chain(self.scale)
            .chain(self.rotation)
            .map(|v| PropertyValue::Scalar(Scalar::Float(v)))
            .collect()
    }
}

/// An ordered set of Gaussians, e.g. one frame's point cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaussianSet {
    pub gaussians: Vec<Gaussian>,
}

impl GaussianSet {
    pub fn new(gaussians: Vec<Gaussian>) -> Self {
        Self { gaussians }
    }

    pub fn len(&self) -> usize {
        self.gaussians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaussians.is_empty()
    }

    /// The `vertex` element declaration for this set.
    pub fn vertex_element(&self) -> ElementDef {
        let mut element = ElementDef::new("vertex", self.gaussians.len());
        element.properties = STANDARD_VERTEX_PROPERTIES
            .iter()
            .map(|name| PropertyDef::scalar(*name, ScalarType::Float))
            .collect();
        element
    }

    pub fn vertex_rows(&self) -> Vec<Row> {
        self.gaussians.iter().map(|g| g.to_row()).collect()
    }

    /// A standard (vertex-only) PLY document for this set.
    pub fn to_standard_ply(&self, format: PlyFormat) -> PlyData {
        let mut header = PlyHeader::new(format);
        header.elements.push(self.vertex_element());
        PlyData {
            header,
            elements: vec![self.vertex_rows()],
        }
    }

    /// Reads the `vertex` element of a loaded PLY into typed Gaussians.
    ///
    /// Every standard property must be present as a scalar; extra properties
    /// are ignored.
    pub fn from_ply(data: &PlyData) -> CoreResult<Self> {
        let element = data
            .header
            .element("vertex")
            .ok_or_else(|| CoreError::ConversionError("no 'vertex' element".to_string()))?;
        let rows = data.rows("vertex").unwrap_or_default();

        let mut columns = [0usize; 14];
        for (slot, name) in columns.iter_mut().zip(STANDARD_VERTEX_PROPERTIES) {
            *slot = element
                .properties
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| CoreError::ConversionError(format!("vertex property '{name}' missing")))?;
        }

        let mut gaussians = Vec::with_capacity(rows.len());
        for row in rows {
            let mut values = [0f32; 14];
            for (value, &column) in values.iter_mut().zip(&columns) {
                let scalar = row.get(column).and_then(PropertyValue::as_scalar).ok_or_else(|| {
                    CoreError::ConversionError("vertex property is not a scalar".to_string())
                })?;
                *value = scalar.as_f64() as f32;
            }
            gaussians.push(Gaussian {
                position: [values[0], values[1], values[2]],
                color_dc: [values[3], values[4], values[5]],
                opacity: values[6],
                scale: [values[7], values[8], values[9]],
                rotation: [values[10], values[11], values[12], values[13]],
            });
        }

        Ok(Self { gaussians })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(seed: f32) -> Gaussian {
        Gaussian {
            position: [seed, seed + 1.0, seed + 2.0],
            color_dc: [0.1, 0.2, 0.3],
            opacity: -seed,
            scale: [-4.0, -4.5, -5.0],
            rotation: [1.0, 0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn test_row_layout_matches_property_order() {
        let set = GaussianSet::new(vec![gaussian(7.0)]);
        let rows = set.vertex_rows();
        assert_eq!(rows[0].len(), STANDARD_VERTEX_PROPERTIES.len());
        assert_eq!(rows[0][2], PropertyValue::Scalar(Scalar::Float(9.0)));
        assert_eq!(rows[0][6], PropertyValue::Scalar(Scalar::Float(-7.0)));
        assert_eq!(rows[0][10], PropertyValue::Scalar(Scalar::Float(1.0)));
    }

    #[test]
    fn test_from_ply_reads_back_typed_values() {
        let set = GaussianSet::new(vec![gaussian(1.0), gaussian(2.0), gaussian(3.0)]);
        let data = set.to_standard_ply(PlyFormat::BinaryLittleEndian);
        assert_eq!(GaussianSet::from_ply(&data).unwrap(), set);
    }

    #[test]
    fn test_from_ply_requires_standard_properties() {
        let mut data = GaussianSet::new(vec![gaussian(1.0)]).to_standard_ply(PlyFormat::Ascii);
        data.header.elements[0].properties.retain(|p| p.name != "opacity");
        for row in &mut data.elements[0] {
            row.remove(6);
        }
        let err = GaussianSet::from_ply(&data).unwrap_err();
        assert!(err.to_string().contains("opacity"));
    }
}
