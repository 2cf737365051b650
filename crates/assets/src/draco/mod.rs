//! Decoder for Draco-compressed triangle meshes (bitstream 2.2) as carried
//! by `KHR_draco_mesh_compression`.
//!
//! Supports the sequential mesh encoding: rANS-coded or plain face indices,
//! and generic, integer, quantized or normal attributes with optional
//! difference prediction. Edgebreaker connectivity is reported as
//! [`DracoError::Unsupported`].

mod attributes;
mod buffer;
mod rans;

pub use attributes::{Attribute, AttributeKind, DataType};

use buffer::DecoderBuffer;

const MAGIC: &[u8] = b"DRACO";
const VERSION: (u8, u8) = (2, 2);
const TRIANGULAR_MESH: u8 = 1;
const SEQUENTIAL: u8 = 0;
const EDGEBREAKER: u8 = 1;
const METADATA_FLAG: u16 = 0x8000;
const MAX_METADATA_DEPTH: u32 = 32;

#[derive(Debug, thiserror::Error)]
pub enum DracoError {
    #[error("not a Draco bitstream")]
    NotDraco,
    #[error("unsupported Draco version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("unsupported Draco feature: {0}")]
    Unsupported(String),
    #[error("truncated Draco data")]
    UnexpectedEnd,
    #[error("corrupt Draco data: {0}")]
    Corrupt(&'static str),
    #[error("no Draco attribute with id {0}")]
    MissingAttribute(u32),
}

/// A decoded mesh: triangles indexing points, and per-point attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DracoMesh {
    pub num_points: usize,
    pub faces: Vec<[u32; 3]>,
    pub attributes: Vec<Attribute>,
}

impl DracoMesh {
    pub fn attribute(&self, unique_id: u32) -> Result<&Attribute, DracoError> {
        self.attributes
            .iter()
            .find(|a| a.unique_id == unique_id)
            .ok_or(DracoError::MissingAttribute(unique_id))
    }

    /// Values of attribute `unique_id` as `N`-component points.
    pub fn read<const N: usize>(&self, unique_id: u32) -> Result<Vec<[f32; N]>, DracoError> {
        let attribute = self.attribute(unique_id)?;
        if attribute.components < N {
            return Err(DracoError::Unsupported(format!(
                "{:?} attribute {unique_id} has {} components, {N} needed",
                attribute.kind, attribute.components
            )));
        }
        let values = attribute.to_f32().ok_or_else(|| {
            DracoError::Unsupported(format!("octahedral values of attribute {unique_id}"))
        })?;
        Ok(values
            .chunks_exact(attribute.components)
            .map(|c| std::array::from_fn(|i| c[i]))
            .collect())
    }

    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

/// Decode a Draco triangle mesh.
pub fn decode(data: &[u8]) -> Result<DracoMesh, DracoError> {
    let mut buf = DecoderBuffer::new(data);
    if buf.bytes(MAGIC.len()).map_err(|_| DracoError::NotDraco)? != MAGIC {
        return Err(DracoError::NotDraco);
    }
    let major = buf.u8()?;
    let minor = buf.u8()?;
    if (major, minor) != VERSION {
        return Err(DracoError::UnsupportedVersion(major, minor));
    }
    let encoder_type = buf.u8()?;
    let method = buf.u8()?;
    let flags = buf.u16()?;
    if encoder_type != TRIANGULAR_MESH {
        return Err(DracoError::Unsupported("point cloud geometry".into()));
    }
    match method {
        SEQUENTIAL => {}
        EDGEBREAKER => return Err(DracoError::Unsupported("edgebreaker connectivity".into())),
        _ => return Err(DracoError::Corrupt("unknown encoding method")),
    }
    if flags & METADATA_FLAG != 0 {
        skip_geometry_metadata(&mut buf)?;
    }

    let (num_points, faces) = decode_sequential_connectivity(&mut buf)?;

    let num_decoders = buf.u8()?;
    let mut decoders = Vec::with_capacity(usize::from(num_decoders));
    for _ in 0..num_decoders {
        decoders.push(attributes::read_descriptors(&mut buf)?);
    }
    for decoder in &mut decoders {
        attributes::decode_values(&mut buf, decoder, num_points)?;
    }

    let mesh = DracoMesh {
        num_points,
        faces,
        attributes: decoders.into_iter().flatten().collect(),
    };
    tracing::trace!(
        "decoded Draco mesh: {} points, {} faces, {} attributes",
        mesh.num_points,
        mesh.faces.len(),
        mesh.attributes.len()
    );
    Ok(mesh)
}

fn decode_sequential_connectivity(
    buf: &mut DecoderBuffer<'_>,
) -> Result<(usize, Vec<[u32; 3]>), DracoError> {
    let num_faces = buf.varint_u32()? as usize;
    let num_points = buf.varint_u32()?;
    let num_indices = num_faces
        .checked_mul(3)
        .ok_or(DracoError::Corrupt("face count overflows"))?;

    let indices: Vec<u32> = match buf.u8()? {
        0 => {
            // Each index is stored as a zigzag delta from the previous one.
            let mut last = 0i64;
            rans::decode_symbols(buf, num_indices, 1)?
                .into_iter()
                .map(|encoded| {
                    let magnitude = i64::from(encoded >> 1);
                    last += if encoded & 1 == 1 { -magnitude } else { magnitude };
                    u32::try_from(last).map_err(|_| DracoError::Corrupt("negative face index"))
                })
                .collect::<Result<_, _>>()?
        }
        1 => {
            let mut indices = Vec::with_capacity(num_indices.min(buf.remaining()));
            for _ in 0..num_indices {
                indices.push(match num_points {
                    0..256 => u32::from(buf.u8()?),
                    256..65_536 => u32::from(buf.u16()?),
                    65_536..2_097_152 => buf.varint_u32()?,
                    _ => buf.u32()?,
                });
            }
            indices
        }
        _ => return Err(DracoError::Corrupt("unknown connectivity method")),
    };

    if indices.iter().any(|&i| i >= num_points) {
        return Err(DracoError::Corrupt("face index out of range"));
    }
    let faces = indices
        .chunks_exact(3)
        .map(|f| [f[0], f[1], f[2]])
        .collect();
    Ok((num_points as usize, faces))
}

/// Metadata carries names and user data only; mesh decoding skips it.
fn skip_geometry_metadata(buf: &mut DecoderBuffer<'_>) -> Result<(), DracoError> {
    let num_attribute_metadata = buf.varint_u32()?;
    for _ in 0..num_attribute_metadata {
        let _attribute_id = buf.varint_u32()?;
        skip_metadata(buf, 0)?;
    }
    skip_metadata(buf, 0)
}

fn skip_metadata(buf: &mut DecoderBuffer<'_>, depth: u32) -> Result<(), DracoError> {
    if depth > MAX_METADATA_DEPTH {
        return Err(DracoError::Corrupt("metadata nested too deeply"));
    }
    let num_entries = buf.varint_u32()?;
    for _ in 0..num_entries {
        let name_len = usize::from(buf.u8()?);
        buf.bytes(name_len)?;
        let value_len = buf.varint_u32()? as usize;
        if value_len == 0 {
            return Err(DracoError::Corrupt("empty metadata value"));
        }
        buf.bytes(value_len)?;
    }
    let num_children = buf.varint_u32()?;
    for _ in 0..num_children {
        let name_len = usize::from(buf.u8()?);
        buf.bytes(name_len)?;
        skip_metadata(buf, depth + 1)?;
    }
    Ok(())
}

/// Hand-assembled bitstreams shared by the decoder and loader tests.
#[cfg(test)]
pub(crate) mod fixtures {
    /// Bitstream header for a sequentially encoded triangle mesh.
    pub fn header(flags: u16) -> Vec<u8> {
        let mut out = b"DRACO".to_vec();
        out.extend_from_slice(&[2, 2, 1, 0]);
        out.extend_from_slice(&flags.to_le_bytes());
        out
    }

    /// One triangle with 10-bit quantized positions spanning [0, 2] and
    /// plain float UVs. Positions use unique id 0, UVs unique id 1.
    pub fn triangle() -> Vec<u8> {
        let mut out = header(0);
        // One face, three points, plain u8 indices.
        out.extend_from_slice(&[1, 3, 1, 0, 1, 2]);
        // One attribute decoder with POSITION (float32 x3) and TEX_COORD
        // (float32 x2), coded as quantized and generic.
        out.extend_from_slice(&[1, 2, 0, 9, 3, 0, 0, 3, 9, 2, 0, 1, 2, 0]);
        // Positions: no prediction, plain 2-byte symbols of zigzag values.
        out.extend_from_slice(&[0xfe, 0, 2]);
        for q in [0u16, 0, 0, 1023, 0, 0, 0, 1023, 0] {
            out.extend_from_slice(&(q * 2).to_le_bytes());
        }
        for c in [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0] {
            out.extend_from_slice(&c.to_le_bytes());
        }
        // Quantization: min, range, bits.
        for c in [0.0f32, 0.0, 0.0, 2.0] {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.push(10);
        out
    }
}
