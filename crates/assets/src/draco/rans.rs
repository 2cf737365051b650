//! rANS entropy decoding of symbol streams.

use super::DracoError;
use super::buffer::DecoderBuffer;

const IO_BASE: u32 = 256;
const TAGGED: u8 = 0;
const RAW: u8 = 1;
/// Bit length the tag alphabet is sized for.
const TAG_BIT_LENGTH: u32 = 5;

/// Table precision for an alphabet whose symbols need `bit_length` bits.
fn precision_bits(bit_length: u32) -> u32 {
    (3 * bit_length / 2).clamp(12, 20)
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    prob: u32,
    cum_prob: u32,
}

/// Symbol probabilities plus a lookup from cumulative slot to symbol.
#[derive(Debug)]
struct SymbolTable {
    precision: u32,
    entries: Vec<Entry>,
    lookup: Vec<u32>,
}

impl SymbolTable {
    fn read(buf: &mut DecoderBuffer<'_>, precision_bits: u32) -> Result<Self, DracoError> {
        let num_symbols = buf.varint_u32()? as usize;
        // A zero-run byte covers at most 64 symbols.
        if num_symbols > buf.remaining().saturating_mul(64) {
            return Err(DracoError::Corrupt("symbol table larger than stream"));
        }
        let mut probs = vec![0u32; num_symbols];
        let mut i = 0;
        while i < num_symbols {
            let data = buf.u8()?;
            let token = data & 3;
            if token == 3 {
                // Run of zero-probability symbols.
                let run = usize::from(data >> 2) + 1;
                if i + run > num_symbols {
                    return Err(DracoError::Corrupt("zero run past alphabet end"));
                }
                i += run;
                continue;
            }
            let mut prob = u32::from(data >> 2);
            for b in 0..u32::from(token) {
                prob |= u32::from(buf.u8()?) << (8 * (b + 1) - 2);
            }
            probs[i] = prob;
            i += 1;
        }

        let precision = 1u32 << precision_bits;
        let mut entries = Vec::with_capacity(num_symbols);
        let mut lookup = Vec::with_capacity(precision as usize);
        let mut cum_prob = 0u32;
        for (symbol, &prob) in probs.iter().enumerate() {
            entries.push(Entry { prob, cum_prob });
            cum_prob = cum_prob
                .checked_add(prob)
                .filter(|&c| c <= precision)
                .ok_or(DracoError::Corrupt("symbol probabilities exceed precision"))?;
            lookup.resize(cum_prob as usize, symbol as u32);
        }
        if num_symbols > 0 && cum_prob != precision {
            return Err(DracoError::Corrupt("symbol probabilities do not sum to precision"));
        }
        Ok(Self {
            precision,
            entries,
            lookup,
        })
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decoder state over one encoded chunk, consumed back to front.
#[derive(Debug)]
struct RansReader<'t, 'a> {
    table: &'t SymbolTable,
    data: &'a [u8],
    offset: usize,
    state: u32,
}

impl<'t, 'a> RansReader<'t, 'a> {
    fn start(table: &'t SymbolTable, buf: &mut DecoderBuffer<'a>) -> Result<Self, DracoError> {
        let len = usize::try_from(buf.varint_u64()?)
            .map_err(|_| DracoError::Corrupt("rANS chunk length overflows"))?;
        let data = buf.bytes(len)?;
        let last = *data.last().ok_or(DracoError::Corrupt("empty rANS chunk"))?;
        let (head, mask) = match last >> 6 {
            0 => (1, 0x3f),
            1 => (2, 0x3fff),
            2 => (3, 0x3f_ffff),
            _ => (4, 0x3fff_ffff),
        };
        if len < head {
            return Err(DracoError::Corrupt("truncated rANS state"));
        }
        let offset = len - head;
        let state = data[offset..]
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
            & mask;
        let base = table.precision * 4;
        let state = state + base;
        if state >= base * IO_BASE {
            return Err(DracoError::Corrupt("rANS state out of range"));
        }
        Ok(Self {
            table,
            data,
            offset,
            state,
        })
    }

    fn read(&mut self) -> Result<u32, DracoError> {
        let precision = self.table.precision;
        while self.state < precision * 4 && self.offset > 0 {
            self.offset -= 1;
            self.state = self.state * IO_BASE + u32::from(self.data[self.offset]);
        }
        let quo = self.state / precision;
        let rem = self.state % precision;
        let symbol = *self
            .table
            .lookup
            .get(rem as usize)
            .ok_or(DracoError::Corrupt("rANS slot outside table"))?;
        let entry = self.table.entries[symbol as usize];
        self.state = quo * entry.prob + rem - entry.cum_prob;
        Ok(symbol)
    }
}

/// Decode `num_values` symbols stored with either symbol coding scheme.
/// Tagged streams share one bit length across each group of
/// `num_components` values.
pub(crate) fn decode_symbols(
    buf: &mut DecoderBuffer<'_>,
    num_values: usize,
    num_components: usize,
) -> Result<Vec<u32>, DracoError> {
    if num_values == 0 {
        return Ok(Vec::new());
    }
    match buf.u8()? {
        TAGGED => decode_tagged(buf, num_values, num_components.max(1)),
        RAW => decode_raw(buf, num_values),
        _ => Err(DracoError::Corrupt("unknown symbol coding scheme")),
    }
}

fn decode_raw(buf: &mut DecoderBuffer<'_>, num_values: usize) -> Result<Vec<u32>, DracoError> {
    let max_bit_length = u32::from(buf.u8()?);
    if !(1..=18).contains(&max_bit_length) {
        return Err(DracoError::Corrupt("raw symbol bit length out of range"));
    }
    let table = SymbolTable::read(buf, precision_bits(max_bit_length))?;
    if table.is_empty() {
        return Err(DracoError::Corrupt("empty symbol alphabet"));
    }
    let mut reader = RansReader::start(&table, buf)?;
    (0..num_values).map(|_| reader.read()).collect()
}

fn decode_tagged(
    buf: &mut DecoderBuffer<'_>,
    num_values: usize,
    num_components: usize,
) -> Result<Vec<u32>, DracoError> {
    let table = SymbolTable::read(buf, precision_bits(TAG_BIT_LENGTH))?;
    let mut tags = RansReader::start(&table, buf)?;
    if table.is_empty() {
        return Err(DracoError::Corrupt("empty tag alphabet"));
    }

    let mut bits = buf.bit_reader();
    let mut values = Vec::with_capacity(num_values);
    while values.len() < num_values {
        let bit_length = tags.read()?;
        for _ in 0..num_components {
            values.push(bits.bits(bit_length)?);
        }
    }
    buf.end_bits(&bits);
    values.truncate(num_values);
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_follows_alphabet_width() {
        assert_eq!(precision_bits(1), 12);
        assert_eq!(precision_bits(5), 12);
        assert_eq!(precision_bits(10), 15);
        assert_eq!(precision_bits(18), 20);
    }

    #[test]
    fn single_symbol_alphabet_repeats() {
        // Raw scheme, 1-bit symbols, one symbol holding all 4096 slots.
        let bytes = [RAW, 1, 1, 0x01, 0x40, 1, 0x00];
        let mut buf = DecoderBuffer::new(&bytes);
        assert_eq!(decode_symbols(&mut buf, 4, 1).unwrap(), vec![0; 4]);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn raw_symbols_decode_in_encoding_order() {
        // Two equiprobable symbols encoding 1, 0, 1, 1, 0.
        let bytes = [RAW, 1, 2, 0x01, 0x20, 0x01, 0x20, 3, 0x00, 0x28, 0x88];
        let mut buf = DecoderBuffer::new(&bytes);
        assert_eq!(decode_symbols(&mut buf, 5, 1).unwrap(), vec![1, 0, 1, 1, 0]);
    }

    #[test]
    fn probabilities_must_fill_the_table() {
        // One symbol with half of the slots.
        let bytes = [RAW, 1, 1, 0x01, 0x20, 1, 0x00];
        let mut buf = DecoderBuffer::new(&bytes);
        assert!(matches!(
            decode_symbols(&mut buf, 1, 1),
            Err(DracoError::Corrupt(_))
        ));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let mut buf = DecoderBuffer::new(&[7]);
        assert!(decode_symbols(&mut buf, 1, 1).is_err());
    }
}
