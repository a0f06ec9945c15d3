//! PLY body codec.
//!
//! Values keep their declared type end to end (`Scalar`), so decoding a row
//! and encoding it again in another format is bit-exact.

use super::header::{ElementDef, PlyFormat, PropertyKind, ScalarType};
use crate::error::{CoreError, CoreResult};

use std::io::{BufRead, Read, Write};

/// One typed scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::Char(_) => ScalarType::Char,
            Scalar::UChar(_) => ScalarType::UChar,
            Scalar::Short(_) => ScalarType::Short,
            Scalar::UShort(_) => ScalarType::UShort,
            Scalar::Int(_) => ScalarType::Int,
            Scalar::UInt(_) => ScalarType::UInt,
            Scalar::Float(_) => ScalarType::Float,
            Scalar::Double(_) => ScalarType::Double,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Char(v) => f64::from(v),
            Scalar::UChar(v) => f64::from(v),
            Scalar::Short(v) => f64::from(v),
            Scalar::UShort(v) => f64::from(v),
            Scalar::Int(v) => f64::from(v),
            Scalar::UInt(v) => f64::from(v),
            Scalar::Float(v) => f64::from(v),
            Scalar::Double(v) => v,
        }
    }

    /// Interprets an integer value as a list length.
    fn as_len(&self) -> Option<usize> {
        match *self {
            Scalar::Char(v) => usize::try_from(v).ok(),
            Scalar::UChar(v) => Some(usize::from(v)),
            Scalar::Short(v) => usize::try_from(v).ok(),
            Scalar::UShort(v) => Some(usize::from(v)),
            Scalar::Int(v) => usize::try_from(v).ok(),
            Scalar::UInt(v) => usize::try_from(v).ok(),
            Scalar::Float(_) | Scalar::Double(_) => None,
        }
    }

    fn from_len(ty: ScalarType, len: usize) -> CoreResult<Self> {
        let overflow = || CoreError::ConversionError(format!("list length {len} does not fit {}", ty.as_str()));
        Ok(match ty {
            ScalarType::Char => Scalar::Char(i8::try_from(len).map_err(|_| overflow())?),
            ScalarType::UChar => Scalar::UChar(u8::try_from(len).map_err(|_| overflow())?),
            ScalarType::Short => Scalar::Short(i16::try_from(len).map_err(|_| overflow())?),
            ScalarType::UShort => Scalar::UShort(u16::try_from(len).map_err(|_| overflow())?),
            ScalarType::Int => Scalar::Int(i32::try_from(len).map_err(|_| overflow())?),
            ScalarType::UInt => Scalar::UInt(u32::try_from(len).map_err(|_| overflow())?),
            ScalarType::Float | ScalarType::Double => return Err(overflow()),
        })
    }

    fn parse_ascii(ty: ScalarType, token: &str) -> Option<Self> {
        Some(match ty {
            ScalarType::Char => Scalar::Char(token.parse().ok()?),
            ScalarType::UChar => Scalar::UChar(token.parse().ok()?),
            ScalarType::Short => Scalar::Short(token.parse().ok()?),
            ScalarType::UShort => Scalar::UShort(token.parse().ok()?),
            ScalarType::Int => Scalar::Int(token.parse().ok()?),
            ScalarType::UInt => Scalar::UInt(token.parse().ok()?),
            ScalarType::Float => Scalar::Float(token.parse().ok()?),
            ScalarType::Double => Scalar::Double(token.parse().ok()?),
        })
    }

    fn decode(ty: ScalarType, bytes: &[u8], big_endian: bool) -> Self {
        macro_rules! decode_as {
            ($t:ty, $n:literal) => {{
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&bytes[..$n]);
                if big_endian { <$t>::from_be_bytes(raw) } else { <$t>::from_le_bytes(raw) }
            }};
        }
        match ty {
            ScalarType::Char => Scalar::Char(decode_as!(i8, 1)),
            ScalarType::UChar => Scalar::UChar(decode_as!(u8, 1)),
            ScalarType::Short => Scalar::Short(decode_as!(i16, 2)),
            ScalarType::UShort => Scalar::UShort(decode_as!(u16, 2)),
            ScalarType::Int => Scalar::Int(decode_as!(i32, 4)),
            ScalarType::UInt => Scalar::UInt(decode_as!(u32, 4)),
            ScalarType::Float => Scalar::Float(decode_as!(f32, 4)),
            ScalarType::Double => Scalar::Double(decode_as!(f64, 8)),
        }
    }

    fn encode<W: Write>(&self, writer: &mut W, big_endian: bool) -> std::io::Result<()> {
        macro_rules! encode_as {
            ($v:expr) => {
                if big_endian {
                    writer.write_all(&$v.to_be_bytes())
                } else {
                    writer.write_all(&$v.to_le_bytes())
                }
            };
        }
        match *self {
            Scalar::Char(v) => encode_as!(v),
            Scalar::UChar(v) => encode_as!(v),
            Scalar::Short(v) => encode_as!(v),
            Scalar::UShort(v) => encode_as!(v),
            Scalar::Int(v) => encode_as!(v),
            Scalar::UInt(v) => encode_as!(v),
            Scalar::Float(v) => encode_as!(v),
            Scalar::Double(v) => encode_as!(v),
        }
    }

    fn write_ascii<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match *self {
            Scalar::Char(v) => write!(writer, "{v}"),
            Scalar::UChar(v) => write!(writer, "{v}"),
            Scalar::Short(v) => write!(writer, "{v}"),
            Scalar::UShort(v) => write!(writer, "{v}"),
            Scalar::Int(v) => write!(writer, "{v}"),
            Scalar::UInt(v) => write!(writer, "{v}"),
            Scalar::Float(v) => write!(writer, "{v:?}"),
            Scalar::Double(v) => write!(writer, "{v:?}"),
        }
    }
}

/// Value of one property in one row.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(*s),
            PropertyValue::List(_) => None,
        }
    }
}

pub type Row = Vec<PropertyValue>;

// ============================================================================
// READING
// ============================================================================

/// Reads rows of a PLY body in any of the three encodings.
pub struct BodyReader<R> {
    reader: R,
    format: PlyFormat,
    token: String,
}

impl<R: BufRead> BodyReader<R> {
    pub fn new(reader: R, format: PlyFormat) -> Self {
        Self {
            reader,
            format,
            token: String::new(),
        }
    }

    /// Reads one row of `element`.
    pub fn read_row(&mut self, element: &ElementDef) -> CoreResult<Row> {
        let mut row = Vec::with_capacity(element.properties.len());
        for property in &element.properties {
            let value = match property.kind {
                PropertyKind::Scalar(ty) => PropertyValue::Scalar(self.read_scalar(ty, element)?),
                PropertyKind::List { count, item } => {
                    let len_value = self.read_scalar(count, element)?;
                    let len = len_value.as_len().ok_or_else(|| {
                        CoreError::ConversionError(format!(
                            "negative list length in property '{}' of element '{}'",
                            property.name, element.name
                        ))
                    })?;
                    let mut items = Vec::with_capacity(len.min(1024));
                    for _ in 0..len {
                        items.push(self.read_scalar(item, element)?);
                    }
                    PropertyValue::List(items)
                }
            };
            row.push(value);
        }
        Ok(row)
    }

    /// Reads and discards all rows of `element`.
    pub fn skip_element(&mut self, element: &ElementDef) -> CoreResult<()> {
        if self.format != PlyFormat::Ascii {
            if let Some(row_size) = element.fixed_row_size() {
                let total = row_size as u64 * element.count as u64;
                let skipped = std::io::copy(&mut (&mut self.reader).take(total), &mut std::io::sink())?;
                if skipped != total {
                    return Err(truncated(element));
                }
                return Ok(());
            }
        }
        for _ in 0..element.count {
            self.read_row(element)?;
        }
        Ok(())
    }

    fn read_scalar(&mut self, ty: ScalarType, element: &ElementDef) -> CoreResult<Scalar> {
        match self.format {
            PlyFormat::Ascii => {
                if !self.next_token()? {
                    return Err(truncated(element));
                }
                Scalar::parse_ascii(ty, &self.token).ok_or_else(|| {
                    CoreError::ConversionError(format!(
                        "invalid {} value '{}' in element '{}'",
                        ty.as_str(),
                        self.token,
                        element.name
                    ))
                })
            }
            PlyFormat::BinaryLittleEndian | PlyFormat::BinaryBigEndian => {
                let mut buf = [0u8; 8];
                let size = ty.size();
                self.reader.read_exact(&mut buf[..size]).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::UnexpectedEof {
                        truncated(element)
                    } else {
                        CoreError::Io(e)
                    }
                })?;
                Ok(Scalar::decode(ty, &buf[..size], self.format == PlyFormat::BinaryBigEndian))
            }
        }
    }

    /// Loads the next whitespace-separated token into `self.token`.
    fn next_token(&mut self) -> CoreResult<bool> {
        self.token.clear();
        loop {
            let (consumed, done) = {
                let buf = self.reader.fill_buf()?;
                if buf.is_empty() {
                    return Ok(!self.token.is_empty());
                }
                let mut consumed = 0;
                let mut done = false;
                for &byte in buf {
                    consumed += 1;
                    if byte.is_ascii_whitespace() {
                        if !self.token.is_empty() {
                            done = true;
                            break;
                        }
                    } else {
                        self.token.push(char::from(byte));
                    }
                }
                (consumed, done)
            };
            self.reader.consume(consumed);
            if done {
                return Ok(true);
            }
        }
    }
}

fn truncated(element: &ElementDef) -> CoreError {
    CoreError::ConversionError(format!(
        "PLY body ends before all {} rows of element '{}' were read",
        element.count, element.name
    ))
}

// ============================================================================
// WRITING
// ============================================================================

/// Writes one row of `element` in the given encoding.
pub fn write_row<W: Write>(
    writer: &mut W,
    element: &ElementDef,
    row: &[PropertyValue],
    format: PlyFormat,
) -> CoreResult<()> {
    if row.len() != element.properties.len() {
        return Err(CoreError::ConversionError(format!(
            "row has {} values but element '{}' declares {} properties",
            row.len(),
            element.name,
            element.properties.len()
        )));
    }

    let big_endian = format == PlyFormat::BinaryBigEndian;
    let mut first = true;
    let mut put = |writer: &mut W, scalar: &Scalar| -> std::io::Result<()> {
        if format == PlyFormat::Ascii {
            if !first {
                writer.write_all(b" ")?;
            }
            first = false;
            scalar.write_ascii(writer)
        } else {
            scalar.encode(writer, big_endian)
        }
    };

    for (property, value) in element.properties.iter().zip(row) {
        match (property.kind, value) {
            (PropertyKind::Scalar(ty), PropertyValue::Scalar(scalar)) if scalar.scalar_type() == ty => {
                put(&mut *writer, scalar)?;
            }
            (PropertyKind::List { count, item }, PropertyValue::List(items))
                if items.iter().all(|s| s.scalar_type() == item) =>
            {
                put(&mut *writer, &Scalar::from_len(count, items.len())?)?;
                for scalar in items {
                    put(&mut *writer, scalar)?;
                }
            }
            _ => {
                return Err(CoreError::ConversionError(format!(
                    "value for property '{}' of element '{}' does not match its declared type",
                    property.name, element.name
                )));
            }
        }
    }

    if format == PlyFormat::Ascii {
        writer.write_all(b"\n")?;
    }
    Ok(())
}
