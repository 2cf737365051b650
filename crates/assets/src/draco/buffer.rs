use super::DracoError;

/// Little-endian cursor over a Draco bitstream.
#[derive(Debug, Clone)]
pub(crate) struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DracoError> {
        if len > self.remaining() {
            return Err(DracoError::UnexpectedEnd);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DracoError> {
        let mut out = [0; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, DracoError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn i8(&mut self) -> Result<i8, DracoError> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    pub fn u16(&mut self) -> Result<u16, DracoError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, DracoError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn i32(&mut self) -> Result<i32, DracoError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn f32(&mut self) -> Result<f32, DracoError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    /// Unsigned LEB128, seven bits per byte, low group first.
    pub fn varint_u64(&mut self) -> Result<u64, DracoError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DracoError::Corrupt("varint too long"))
    }

    pub fn varint_u32(&mut self) -> Result<u32, DracoError> {
        u32::try_from(self.varint_u64()?).map_err(|_| DracoError::Corrupt("varint overflows u32"))
    }

    /// Bit reader over the unread bytes. Nothing is consumed until
    /// [`end_bits`](Self::end_bits).
    pub fn bit_reader(&self) -> BitReader<'a> {
        BitReader {
            data: &self.data[self.pos..],
            bit: 0,
        }
    }

    /// Skip the whole bytes a finished bit reader touched.
    pub fn end_bits(&mut self, reader: &BitReader<'_>) {
        self.pos += reader.bit.div_ceil(8);
    }
}

/// Reads bit fields least significant bit first.
#[derive(Debug)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    bit: usize,
}

impl BitReader<'_> {
    pub fn bits(&mut self, count: u32) -> Result<u32, DracoError> {
        if count > 32 {
            return Err(DracoError::Corrupt("bit field wider than 32 bits"));
        }
        let mut value = 0u32;
        for i in 0..count {
            let byte = self
                .data
                .get(self.bit / 8)
                .ok_or(DracoError::UnexpectedEnd)?;
            value |= u32::from((byte >> (self.bit % 8)) & 1) << i;
            self.bit += 1;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varints_are_little_endian_groups() {
        let mut buf = DecoderBuffer::new(&[0x05, 0xac, 0x02, 0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(buf.varint_u32().unwrap(), 5);
        assert_eq!(buf.varint_u32().unwrap(), 300);
        assert_eq!(buf.varint_u32().unwrap(), u32::MAX);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let mut buf = DecoderBuffer::new(&[1, 2, 3]);
        assert!(matches!(buf.u32(), Err(DracoError::UnexpectedEnd)));
        assert_eq!(buf.u16().unwrap(), 0x0201);
    }

    #[test]
    fn bit_fields_advance_by_whole_bytes() {
        let mut buf = DecoderBuffer::new(&[0b1010_0110, 0b0000_0001, 0x7f]);
        let mut bits = buf.bit_reader();
        assert_eq!(bits.bits(3).unwrap(), 0b110);
        assert_eq!(bits.bits(6).unwrap(), 0b11_0100);
        buf.end_bits(&bits);
        assert_eq!(buf.u8().unwrap(), 0x7f);
    }
}
