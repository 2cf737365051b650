//! Sequential attribute decoding: descriptors, portable integer values,
//! prediction and dequantization.

use super::DracoError;
use super::buffer::DecoderBuffer;
use super::rans::decode_symbols;

/// Semantic of a Draco attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Normal,
    Color,
    TexCoord,
    Generic,
}

impl AttributeKind {
    fn from_u8(value: u8) -> Result<Self, DracoError> {
        Ok(match value {
            0 => Self::Position,
            1 => Self::Normal,
            2 => Self::Color,
            3 => Self::TexCoord,
            4 => Self::Generic,
            _ => return Err(DracoError::Corrupt("unknown attribute type")),
        })
    }
}

/// Storage type of an attribute's original values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Bool,
}

impl DataType {
    fn from_u8(value: u8) -> Result<Self, DracoError> {
        Ok(match value {
            1 => Self::Int8,
            2 => Self::Uint8,
            3 => Self::Int16,
            4 => Self::Uint16,
            5 => Self::Int32,
            6 => Self::Uint32,
            7 => Self::Int64,
            8 => Self::Uint64,
            9 => Self::Float32,
            10 => Self::Float64,
            11 => Self::Bool,
            _ => return Err(DracoError::Corrupt("unknown attribute data type")),
        })
    }

    fn size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Bool => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    /// Read one little-endian value as `f32`, mapped to [0, 1] or [-1, 1]
    /// when `normalized`.
    fn read_f32(self, bytes: &[u8], normalized: bool) -> f32 {
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        let wide = u64::from_le_bytes(raw);
        match self {
            Self::Float32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            Self::Float64 => f64::from_le_bytes(raw) as f32,
            _ => integer_to_f32(self, wide, normalized),
        }
    }
}

fn integer_to_f32(data_type: DataType, wide: u64, normalized: bool) -> f32 {
    let (value, scale) = match data_type {
        DataType::Int8 => (f64::from(wide as u8 as i8), f64::from(i8::MAX)),
        DataType::Uint8 | DataType::Bool => (f64::from(wide as u8), f64::from(u8::MAX)),
        DataType::Int16 => (f64::from(wide as u16 as i16), f64::from(i16::MAX)),
        DataType::Uint16 => (f64::from(wide as u16), f64::from(u16::MAX)),
        DataType::Int32 => (f64::from(wide as u32 as i32), f64::from(i32::MAX)),
        DataType::Uint32 => (f64::from(wide as u32), f64::from(u32::MAX)),
        DataType::Int64 => (wide as i64 as f64, i64::MAX as f64),
        DataType::Uint64 => (wide as f64, u64::MAX as f64),
        // Integer-coded float attributes hold whole numbers.
        DataType::Float32 | DataType::Float64 => (wide as i64 as f64, 1.0),
    };
    if normalized {
        (value / scale).max(-1.0) as f32
    } else {
        value as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coding {
    Generic,
    Integer,
    Quantized,
    Normals,
}

/// Values as decoded, before conversion to floats.
#[derive(Debug, Clone, PartialEq)]
enum Values {
    Pending,
    /// Original bytes, one `data_type` entry per component.
    Raw(Vec<u8>),
    /// Integers that already are the original values.
    Integers(Vec<i32>),
    Quantized {
        values: Vec<i32>,
        min: Vec<f32>,
        range: f32,
        bits: u8,
    },
    /// Octahedral normals, kept encoded.
    Octahedral(Vec<i32>),
}

/// One decoded attribute, one value per point.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub data_type: DataType,
    pub components: usize,
    pub normalized: bool,
    pub unique_id: u32,
    coding: Coding,
    values: Values,
}

impl Attribute {
    /// Flattened values, `components` per point. Octahedral normals are not
    /// expanded and yield `None`.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        match &self.values {
            Values::Raw(bytes) => Some(
                bytes
                    .chunks_exact(self.data_type.size())
                    .map(|b| self.data_type.read_f32(b, self.normalized))
                    .collect(),
            ),
            Values::Integers(values) => Some(
                values
                    .iter()
                    .map(|&v| {
                        integer_to_f32(self.data_type, i64::from(v) as u64, self.normalized)
                    })
                    .collect(),
            ),
            Values::Quantized {
                values,
                min,
                range,
                bits,
            } => {
                let max_quantized = ((1u32 << bits) - 1) as f32;
                let delta = range / max_quantized;
                Some(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, &q)| q as f32 * delta + min[i % self.components])
                        .collect(),
                )
            }
            Values::Octahedral(_) | Values::Pending => None,
        }
    }

    /// Components per point in the portable (integer) form.
    fn portable_components(&self) -> usize {
        match self.coding {
            Coding::Normals => 2,
            _ => self.components,
        }
    }
}

/// Read one attribute decoder's descriptors and per-attribute coding.
pub(crate) fn read_descriptors(buf: &mut DecoderBuffer<'_>) -> Result<Vec<Attribute>, DracoError> {
    let count = buf.varint_u32()?;
    if count == 0 {
        return Err(DracoError::Corrupt("attribute decoder without attributes"));
    }
    let mut attributes = Vec::new();
    for _ in 0..count {
        let kind = AttributeKind::from_u8(buf.u8()?)?;
        let data_type = DataType::from_u8(buf.u8()?)?;
        let components = usize::from(buf.u8()?);
        if components == 0 {
            return Err(DracoError::Corrupt("attribute without components"));
        }
        let normalized = buf.u8()? != 0;
        let unique_id = buf.varint_u32()?;
        attributes.push(Attribute {
            kind,
            data_type,
            components,
            normalized,
            unique_id,
            coding: Coding::Generic,
            values: Values::Pending,
        });
    }
    for attribute in &mut attributes {
        attribute.coding = match buf.u8()? {
            0 => Coding::Generic,
            1 => Coding::Integer,
            2 => Coding::Quantized,
            3 => Coding::Normals,
            _ => return Err(DracoError::Corrupt("unknown sequential attribute coding")),
        };
    }
    Ok(attributes)
}

/// Decode the values of one decoder's attributes for `num_points` points.
/// All portable values come first, then the data their transforms need.
pub(crate) fn decode_values(
    buf: &mut DecoderBuffer<'_>,
    attributes: &mut [Attribute],
    num_points: usize,
) -> Result<(), DracoError> {
    for attribute in attributes.iter_mut() {
        attribute.values = match attribute.coding {
            Coding::Generic => {
                let len = num_points
                    .checked_mul(attribute.components * attribute.data_type.size())
                    .ok_or(DracoError::Corrupt("attribute size overflows"))?;
                Values::Raw(buf.bytes(len)?.to_vec())
            }
            _ => Values::Integers(decode_portable(
                buf,
                num_points,
                attribute.portable_components(),
                attribute.coding,
            )?),
        };
    }

    for attribute in attributes.iter_mut() {
        let values = std::mem::replace(&mut attribute.values, Values::Pending);
        attribute.values = match (attribute.coding, values) {
            (Coding::Quantized, Values::Integers(values)) => {
                let min = (0..attribute.components)
                    .map(|_| buf.f32())
                    .collect::<Result<Vec<_>, _>>()?;
                let range = buf.f32()?;
                let bits = buf.u8()?;
                if !(1..=30).contains(&bits) {
                    return Err(DracoError::Corrupt("quantization bits out of range"));
                }
                Values::Quantized {
                    values,
                    min,
                    range,
                    bits,
                }
            }
            (Coding::Normals, Values::Integers(values)) => {
                let _bits = buf.u8()?;
                Values::Octahedral(values)
            }
            (_, values) => values,
        };
    }
    Ok(())
}

/// Prediction applied to portable integers before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prediction {
    None,
    /// Each value is stored as its difference from the previous one.
    Difference(Transform),
}

/// How a prediction correction combines with the predicted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Delta,
    /// Corrections wrap around the decoded `[min, max]` interval.
    Wrap,
    /// Octahedral normal corrections, always non-negative.
    Octahedron,
}

impl Transform {
    fn corrections_positive(self) -> bool {
        self == Self::Octahedron
    }
}

fn read_prediction(buf: &mut DecoderBuffer<'_>, coding: Coding) -> Result<Prediction, DracoError> {
    let method = buf.i8()?;
    if method == -2 {
        return Ok(Prediction::None);
    }
    let transform = match (buf.i8()?, coding) {
        (1, Coding::Integer | Coding::Quantized) => Transform::Wrap,
        (0, _) => Transform::Delta,
        (2 | 3, Coding::Normals) => Transform::Octahedron,
        _ => return Err(DracoError::Unsupported("prediction transform".into())),
    };
    match method {
        0 => Ok(Prediction::Difference(transform)),
        _ => Err(DracoError::Unsupported(format!(
            "prediction method {method} outside sequential encoding"
        ))),
    }
}

fn to_signed(symbol: u32) -> i32 {
    let magnitude = (symbol >> 1) as i32;
    if symbol & 1 == 0 {
        magnitude
    } else {
        -magnitude - 1
    }
}

fn decode_portable(
    buf: &mut DecoderBuffer<'_>,
    num_points: usize,
    components: usize,
    coding: Coding,
) -> Result<Vec<i32>, DracoError> {
    let prediction = read_prediction(buf, coding)?;
    let num_values = num_points
        .checked_mul(components)
        .ok_or(DracoError::Corrupt("attribute size overflows"))?;

    let symbols = if buf.u8()? > 0 {
        decode_symbols(buf, num_values, components)?
    } else {
        let width = usize::from(buf.u8()?);
        if !(1..=4).contains(&width) {
            return Err(DracoError::Corrupt("integer width out of range"));
        }
        let raw = buf.bytes(num_values * width)?;
        raw.chunks_exact(width)
            .map(|c| c.iter().rev().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
            .collect()
    };

    let positive = matches!(prediction, Prediction::Difference(t) if t.corrections_positive());
    let corrections: Vec<i32> = if positive {
        symbols.into_iter().map(|s| s as i32).collect()
    } else {
        symbols.into_iter().map(to_signed).collect()
    };

    match prediction {
        Prediction::None => Ok(corrections),
        Prediction::Difference(Transform::Delta) => {
            Ok(difference(&corrections, components, |pred, corr| pred.wrapping_add(corr)))
        }
        Prediction::Difference(Transform::Wrap) => {
            let wrap = Wrap::read(buf)?;
            Ok(difference(&corrections, components, |pred, corr| wrap.apply(pred, corr)))
        }
        Prediction::Difference(Transform::Octahedron) => {
            // Normals stay encoded; consume the transform's parameters.
            let _max_quantized = buf.i32()?;
            Ok(corrections)
        }
    }
}

/// Undo difference prediction: the first value is predicted from zero, each
/// later value from the one before it.
fn difference(
    corrections: &[i32],
    components: usize,
    combine: impl Fn(i32, i32) -> i32,
) -> Vec<i32> {
    let mut out = Vec::with_capacity(corrections.len());
    for (i, &corr) in corrections.iter().enumerate() {
        let pred = if i < components { 0 } else { out[i - components] };
        out.push(combine(pred, corr));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Wrap {
    min: i32,
    max: i32,
}

impl Wrap {
    fn read(buf: &mut DecoderBuffer<'_>) -> Result<Self, DracoError> {
        let min = buf.i32()?;
        let max = buf.i32()?;
        if min > max {
            return Err(DracoError::Corrupt("wrap interval is inverted"));
        }
        Ok(Self { min, max })
    }

    fn apply(self, pred: i32, corr: i32) -> i32 {
        let span = i64::from(self.max) - i64::from(self.min) + 1;
        let pred = i64::from(pred.clamp(self.min, self.max));
        let mut value = pred + i64::from(corr);
        if value > i64::from(self.max) {
            value -= span;
        } else if value < i64::from(self.min) {
            value += span;
        }
        value as i32
    }
}
