// ============================================================================
// splatreel-core/src/ply/header.rs
// ============================================================================
//
// PLY HEADER: Parsing and Writing of PLY Headers
//
// A PLY header is a block of ASCII lines terminated by `end_header`:
//
//   ply
//   format binary_little_endian 1.0
//   comment ...
//   element vertex 1179648
//   property float x
//   ...
//   element extrinsic 16
//   property float extrinsic
//   end_header
//
// Property types accept both the classic names (char, uchar, short, ushort,
// int, uint, float, double) and the sized aliases (int8 ... float64).
//
// AI-ASSISTANT-INFO: PLY header model, parser and writer

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::fmt;
use std::io::{BufRead, Write};

/// Upper bound on header size; anything longer is not a PLY header.
const MAX_HEADER_LINES: usize = 10_000;

// ============================================================================
// FORMAT AND TYPES
// ============================================================================

/// Body encoding declared by the `format` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyFormat {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl ScalarType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "char" | "int8" => Some(Self::Char),
            "uchar" | "uint8" => Some(Self::UChar),
            "short" | "int16" => Some(Self::Short),
            "ushort" | "uint16" => Some(Self::UShort),
            "int" | "int32" => Some(Self::Int),
            "uint" | "uint32" => Some(Self::UInt),
            "float" | "float32" => Some(Self::Float),
            "double" | "float64" => Some(Self::Double),
            _ => None,
        }
    }

    /// Canonical header spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Size in bytes in a binary body.
    pub fn size(&self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    fn is_integer(&self) -> bool {
        !matches!(self, Self::Float | Self::Double)
    }
}

/// Property type: a scalar, or a length-prefixed list of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDef {
    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Scalar(ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Row size in a binary body, if the element has no list properties.
    pub fn fixed_row_size(&self) -> Option<usize> {
        self.properties
            .iter()
            .map(|p| match p.kind {
                PropertyKind::Scalar(ty) => Some(ty.size()),
                PropertyKind::List { .. } => None,
            })
            .sum()
    }
}

// ============================================================================
// HEADER
// ============================================================================

/// Parsed PLY header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
    pub elements: Vec<ElementDef>,
}

impl PlyHeader {
    pub fn new(format: PlyFormat) -> Self {
        Self {
            format,
            comments: Vec::new(),
            obj_info: Vec::new(),
            elements: Vec::new(),
        }
    }

    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Reads a header, leaving `reader` positioned at the first body byte.
    pub fn read<R: BufRead>(reader: &mut R) -> CoreResult<Self> {
        let magic = read_header_line(reader)?
            .ok_or_else(|| malformed("file is empty"))?;
        if magic != "ply" {
            return Err(malformed(format!("missing 'ply' magic, found '{magic}'")));
        }

        let mut format: Option<PlyFormat> = None;
        let mut comments = Vec::new();
        let mut obj_info = Vec::new();
        let mut elements: Vec<ElementDef> = Vec::new();
        let mut terminated = false;

        for _ in 0..MAX_HEADER_LINES {
            let Some(line) = read_header_line(reader)? else {
                break;
            };
            let mut tokens = line.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };

            match keyword {
                "format" => {
                    if format.is_some() {
                        return Err(malformed("duplicate 'format' line"));
                    }
                    let encoding = tokens.next().ok_or_else(|| malformed("'format' without encoding"))?;
                    let parsed = PlyFormat::parse(encoding)
                        .ok_or_else(|| malformed(format!("unknown format '{encoding}'")))?;
                    match tokens.next() {
                        Some("1.0") => {}
                        Some(other) => return Err(malformed(format!("unsupported PLY version '{other}'"))),
                        None => return Err(malformed("'format' without version")),
                    }
                    format = Some(parsed);
                }
                "comment" => comments.push(rest_of_line(&line, "comment")),
                "obj_info" => obj_info.push(rest_of_line(&line, "obj_info")),
                "element" => {
                    let name = tokens.next().ok_or_else(|| malformed("'element' without name"))?;
                    let count = tokens
                        .next()
                        .ok_or_else(|| malformed(format!("element '{name}' without count")))?
                        .parse::<usize>()
                        .map_err(|_| malformed(format!("element '{name}' has an invalid count")))?;
                    elements.push(ElementDef::new(name, count));
                }
                "property" => {
                    let element = elements
                        .last_mut()
                        .ok_or_else(|| malformed("'property' before any 'element'"))?;
                    let property = parse_property(&mut tokens)?;
                    if element.property(&property.name).is_some() {
                        return Err(malformed(format!(
                            "duplicate property '{}' in element '{}'",
                            property.name, element.name
                        )));
                    }
                    element.properties.push(property);
                }
                "end_header" => {
                    terminated = true;
                    break;
                }
                other => return Err(malformed(format!("unexpected header keyword '{other}'"))),
            }
        }

        if !terminated {
            return Err(malformed("missing 'end_header'"));
        }
        let format = format.ok_or_else(|| malformed("missing 'format' line"))?;

        Ok(Self {
            format,
            comments,
            obj_info,
            elements,
        })
    }

    /// Writes the header including the trailing `end_header` line.
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "ply")?;
        writeln!(writer, "format {} 1.0", self.format)?;
        for comment in &self.comments {
            writeln!(writer, "comment {comment}")?;
        }
        for info in &self.obj_info {
            writeln!(writer, "obj_info {info}")?;
        }
        for element in &self.elements {
            writeln!(writer, "element {} {}", element.name, element.count)?;
            for property in &element.properties {
                match property.kind {
                    PropertyKind::Scalar(ty) => {
                        writeln!(writer, "property {} {}", ty.as_str(), property.name)?
                    }
                    PropertyKind::List { count, item } => writeln!(
                        writer,
                        "property list {} {} {}",
                        count.as_str(),
                        item.as_str(),
                        property.name
                    )?,
                }
            }
        }
        writeln!(writer, "end_header")
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn malformed(reason: impl fmt::Display) -> CoreError {
    CoreError::ConversionError(format!("malformed PLY header: {reason}"))
}

/// Reads one header line as ASCII, trimming the line terminator.
fn read_header_line<R: BufRead>(reader: &mut R) -> CoreResult<Option<String>> {
    let mut buf = Vec::new();
    let read = reader.read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    let line = String::from_utf8(buf).map_err(|_| malformed("header is not ASCII"))?;
    Ok(Some(line))
}

fn rest_of_line(line: &str, keyword: &str) -> String {
    line.trim_start()
        .strip_prefix(keyword)
        .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        .unwrap_or_default()
        .to_string()
}

fn parse_property<'a, I>(tokens: &mut I) -> CoreResult<PropertyDef>
where
    I: Iterator<Item = &'a str>,
{
    let first = tokens.next().ok_or_else(|| malformed("'property' without type"))?;

    let kind = if first == "list" {
        let count_token = tokens.next().ok_or_else(|| malformed("list property without count type"))?;
        let item_token = tokens.next().ok_or_else(|| malformed("list property without item type"))?;
        let count = ScalarType::parse(count_token)
            .ok_or_else(|| malformed(format!("unknown type '{count_token}'")))?;
        if !count.is_integer() {
            return Err(malformed(format!("list count type '{count_token}' is not an integer")));
        }
        let item = ScalarType::parse(item_token)
            .ok_or_else(|| malformed(format!("unknown type '{item_token}'")))?;
        PropertyKind::List { count, item }
    } else {
        PropertyKind::Scalar(
            ScalarType::parse(first).ok_or_else(|| malformed(format!("unknown type '{first}'")))?,
        )
    };

    let name = tokens.next().ok_or_else(|| malformed("'property' without name"))?;
    Ok(PropertyDef {
        name: name.to_string(),
        kind,
    })
}
