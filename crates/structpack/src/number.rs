//! Fixed-width numeric primitives.

use std::fmt;

use crate::{
    bytes::{self, Cursor},
    errors::Error,
    value::Value,
};

/// The eight numeric schemas. They are the only schemas with a native
/// fixed-width representation, which `array` exploits for bulk transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Number {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl Number {
    pub const ALL: [Number; 8] = [
        Number::Int8,
        Number::Uint8,
        Number::Int16,
        Number::Uint16,
        Number::Int32,
        Number::Uint32,
        Number::Float32,
        Number::Float64,
    ];

    /// Canonical registry name.
    pub fn name(self) -> &'static str {
        match self {
            Number::Int8 => "int8",
            Number::Uint8 => "uint8",
            Number::Int16 => "int16",
            Number::Uint16 => "uint16",
            Number::Int32 => "int32",
            Number::Uint32 => "uint32",
            Number::Float32 => "float32",
            Number::Float64 => "float64",
        }
    }

    /// Alternative registry names (Pascal-style type names).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Number::Int8 => &["shortint"],
            Number::Uint8 => &["byte"],
            Number::Int16 => &["smallint"],
            Number::Uint16 => &["word"],
            Number::Int32 => &["longint"],
            Number::Uint32 => &["longword"],
            Number::Float32 => &["single"],
            Number::Float64 => &["double"],
        }
    }

    /// Width in bytes.
    pub fn size(self) -> usize {
        match self {
            Number::Int8 | Number::Uint8 => 1,
            Number::Int16 | Number::Uint16 => 2,
            Number::Int32 | Number::Uint32 | Number::Float32 => 4,
            Number::Float64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Number::Float32 | Number::Float64)
    }

    /// Largest element count a prefix of this kind stores exactly.
    pub fn max_count(self) -> u64 {
        match self {
            Number::Int8 => i8::MAX as u64,
            Number::Uint8 => u8::MAX.into(),
            Number::Int16 => i16::MAX as u64,
            Number::Uint16 => u16::MAX.into(),
            Number::Int32 => i32::MAX as u64,
            Number::Uint32 => u32::MAX.into(),
            Number::Float32 => 1 << f32::MANTISSA_DIGITS,
            Number::Float64 => 1 << f64::MANTISSA_DIGITS,
        }
    }

    /// Packs an element count. Unlike [`Number::pack`] this never wraps: a
    /// count above [`Number::max_count`] is a [`Error::CountOverflow`].
    pub fn pack_count(
        self,
        count: usize,
        little_endian: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let max = self.max_count();
        if count as u64 > max {
            return Err(Error::CountOverflow {
                count,
                prefix: self.name(),
                max,
            });
        }

        self.pack(&Value::from(count), little_endian, out)
    }

    /// Reads one value at the cursor and advances it by `self.size()`.
    pub fn unpack(self, cursor: &mut Cursor<'_>, little_endian: bool) -> Result<Value, Error> {
        let raw = cursor.take(self.size())?;
        Ok(self.decode(raw, little_endian))
    }

    /// Decodes exactly `self.size()` bytes.
    fn decode(self, raw: &[u8], little_endian: bool) -> Value {
        match self {
            Number::Int8 => Value::Int((raw[0] as i8).into()),
            Number::Uint8 => Value::Int(raw[0].into()),
            Number::Int16 => Value::Int(i16::from_le_bytes(le_array(raw, little_endian)).into()),
            Number::Uint16 => Value::Int(u16::from_le_bytes(le_array(raw, little_endian)).into()),
            Number::Int32 => Value::Int(i32::from_le_bytes(le_array(raw, little_endian)).into()),
            Number::Uint32 => Value::Int(u32::from_le_bytes(le_array(raw, little_endian)).into()),
            Number::Float32 => {
                Value::Float(f32::from_le_bytes(le_array(raw, little_endian)).into())
            }
            Number::Float64 => Value::Float(f64::from_le_bytes(le_array(raw, little_endian))),
        }
    }

    /// Appends `value` in the requested byte order. `Null` packs as zero;
    /// integers wrap to the target width.
    pub fn pack(self, value: &Value, little_endian: bool, out: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            Number::Int8 => out.push(self.int(value)? as i8 as u8),
            Number::Uint8 => out.push(self.int(value)? as u8),
            Number::Int16 => {
                bytes::write_array(out, (self.int(value)? as i16).to_be_bytes(), little_endian)
            }
            Number::Uint16 => {
                bytes::write_array(out, (self.int(value)? as u16).to_be_bytes(), little_endian)
            }
            Number::Int32 => {
                bytes::write_array(out, (self.int(value)? as i32).to_be_bytes(), little_endian)
            }
            Number::Uint32 => {
                bytes::write_array(out, (self.int(value)? as u32).to_be_bytes(), little_endian)
            }
            Number::Float32 => {
                bytes::write_array(out, (self.float(value)? as f32).to_be_bytes(), little_endian)
            }
            Number::Float64 => {
                bytes::write_array(out, self.float(value)?.to_be_bytes(), little_endian)
            }
        }

        Ok(())
    }

    fn int(self, value: &Value) -> Result<i64, Error> {
        match value {
            Value::Null => Ok(0),
            Value::Float(v) if v.is_nan() => Ok(0),
            other => other.as_i64().ok_or(Error::TypeMismatch {
                expected: self.name(),
                found: other.type_name(),
            }),
        }
    }

    fn float(self, value: &Value) -> Result<f64, Error> {
        match value {
            Value::Null => Ok(0.0),
            other => other.as_f64().ok_or(Error::TypeMismatch {
                expected: self.name(),
                found: other.type_name(),
            }),
        }
    }

    /// Whether a run of these values can be moved as one block under the given
    /// byte order.
    pub fn supports_bulk(self, little_endian: bool) -> bool {
        little_endian || self.size() == 1
    }

    /// Decodes `count` consecutive values from the cursor in one block.
    pub fn unpack_bulk(
        self,
        cursor: &mut Cursor<'_>,
        count: usize,
        little_endian: bool,
    ) -> Result<Vec<Value>, Error> {
        let block = cursor.take(self.size() * count)?;
        let le = little_endian;

        Ok(match self {
            Number::Int8 => block.iter().map(|&b| Value::Int((b as i8).into())).collect(),
            Number::Uint8 => block.iter().map(|&b| Value::Int(b.into())).collect(),
            Number::Int16 => {
                decode_all::<2>(block, le, |raw| Value::Int(i16::from_le_bytes(raw).into()))
            }
            Number::Uint16 => {
                decode_all::<2>(block, le, |raw| Value::Int(u16::from_le_bytes(raw).into()))
            }
            Number::Int32 => {
                decode_all::<4>(block, le, |raw| Value::Int(i32::from_le_bytes(raw).into()))
            }
            Number::Uint32 => {
                decode_all::<4>(block, le, |raw| Value::Int(u32::from_le_bytes(raw).into()))
            }
            Number::Float32 => {
                decode_all::<4>(block, le, |raw| Value::Float(f32::from_le_bytes(raw).into()))
            }
            Number::Float64 => {
                decode_all::<8>(block, le, |raw| Value::Float(f64::from_le_bytes(raw)))
            }
        })
    }

    /// Encodes exactly `count` values in one block; missing trailing values
    /// are zero-filled and extra values are dropped.
    pub fn pack_bulk(
        self,
        values: &[Value],
        count: usize,
        little_endian: bool,
        out: &mut Vec<u8>,
    ) -> Result<(), Error> {
        let start = out.len();
        let values = &values[..values.len().min(count)];
        let le = little_endian;
        out.reserve(self.size() * count);

        match self {
            Number::Int8 => {
                for value in values {
                    out.push(self.int(value)? as i8 as u8);
                }
            }
            Number::Uint8 => {
                for value in values {
                    out.push(self.int(value)? as u8);
                }
            }
            Number::Int16 => {
                encode_all(values, le, out, |v| Ok((self.int(v)? as i16).to_le_bytes()))?
            }
            Number::Uint16 => {
                encode_all(values, le, out, |v| Ok((self.int(v)? as u16).to_le_bytes()))?
            }
            Number::Int32 => {
                encode_all(values, le, out, |v| Ok((self.int(v)? as i32).to_le_bytes()))?
            }
            Number::Uint32 => {
                encode_all(values, le, out, |v| Ok((self.int(v)? as u32).to_le_bytes()))?
            }
            Number::Float32 => {
                encode_all(values, le, out, |v| Ok((self.float(v)? as f32).to_le_bytes()))?
            }
            Number::Float64 => encode_all(values, le, out, |v| Ok(self.float(v)?.to_le_bytes()))?,
        }
        out.resize(start + self.size() * count, 0);

        Ok(())
    }
}

/// Copies exactly `N` bytes into little-endian order.
fn le_array<const N: usize>(raw: &[u8], little_endian: bool) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(raw);
    if !little_endian {
        out.reverse();
    }
    out
}

fn decode_all<const N: usize>(
    block: &[u8],
    little_endian: bool,
    decode: impl Fn([u8; N]) -> Value,
) -> Vec<Value> {
    block
        .chunks_exact(N)
        .map(|chunk| decode(le_array(chunk, little_endian)))
        .collect()
}

fn encode_all<const N: usize>(
    values: &[Value],
    little_endian: bool,
    out: &mut Vec<u8>,
    encode: impl Fn(&Value) -> Result<[u8; N], Error>,
) -> Result<(), Error> {
    for value in values {
        let mut raw = encode(value)?;
        if !little_endian {
            raw.reverse();
        }
        out.extend_from_slice(&raw);
    }

    Ok(())
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(number: Number, value: impl Into<Value>, little_endian: bool) -> Vec<u8> {
        let mut out = vec![];
        number.pack(&value.into(), little_endian, &mut out).unwrap();
        out
    }

    #[test]
    fn test_uint16_big_endian() {
        assert_eq!(packed(Number::Uint16, 0x3210, false), vec![0x32, 0x10]);
    }

    #[test]
    fn test_uint32_byte_orders_are_reversed() {
        let little = packed(Number::Uint32, 0x12345678u32, true);
        let big = packed(Number::Uint32, 0x12345678u32, false);
        assert_eq!(little, vec![0x78, 0x56, 0x34, 0x12]);
        assert_eq!(big, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(packed(Number::Int8, -1, true), vec![0xff]);
        let mut cursor = Cursor::new(&[0xfe, 0xff]);
        assert_eq!(
            Number::Int16.unpack(&mut cursor, true).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_wraps_to_width() {
        assert_eq!(packed(Number::Uint8, 256 + 7, true), vec![7]);
        assert_eq!(packed(Number::Int8, 200, true), vec![200]);
    }

    #[test]
    fn test_floats() {
        let bytes = packed(Number::Float64, 2.5f64, true);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(
            Number::Float64.unpack(&mut cursor, true).unwrap(),
            Value::Float(2.5)
        );

        let bytes = packed(Number::Float32, 0.5f64, false);
        assert_eq!(bytes, vec![0x3f, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_null_packs_zero() {
        assert_eq!(packed(Number::Uint16, Value::Null, true), vec![0, 0]);
    }

    #[test]
    fn test_rejects_strings() {
        let mut out = vec![];
        assert_eq!(
            Number::Uint8
                .pack(&Value::from("x"), true, &mut out)
                .unwrap_err(),
            Error::TypeMismatch {
                expected: "uint8",
                found: "string"
            }
        );
    }

    #[test]
    fn test_underflow() {
        let mut cursor = Cursor::new(&[1, 2, 3]);
        assert!(matches!(
            Number::Uint32.unpack(&mut cursor, true),
            Err(Error::BufferUnderflow { needed: 4, .. })
        ));
    }

    #[test]
    fn test_bulk_matches_single_values() {
        let input = [Value::Int(1), Value::Int(-2), Value::Int(300), Value::Null];
        for number in Number::ALL {
            for little_endian in [true, false] {
                let mut single = vec![];
                for value in &input {
                    number.pack(value, little_endian, &mut single).unwrap();
                }
                let mut bulk = vec![];
                number
                    .pack_bulk(&input, input.len(), little_endian, &mut bulk)
                    .unwrap();
                assert_eq!(bulk, single, "{number} little_endian={little_endian}");

                let mut cursor = Cursor::new(&bulk);
                let decoded = number
                    .unpack_bulk(&mut cursor, input.len(), little_endian)
                    .unwrap();
                let mut cursor = Cursor::new(&single);
                let one_by_one: Vec<Value> = (0..input.len())
                    .map(|_| number.unpack(&mut cursor, little_endian).unwrap())
                    .collect();
                assert_eq!(decoded, one_by_one, "{number} little_endian={little_endian}");
            }
        }
    }

    #[test]
    fn test_bulk_rejects_strings() {
        let mut out = vec![];
        assert!(matches!(
            Number::Int32.pack_bulk(&[Value::from("x")], 1, true, &mut out),
            Err(Error::TypeMismatch { expected: "int32", .. })
        ));
    }

    #[test]
    fn test_pack_count_range() {
        let mut out = vec![];
        Number::Uint8.pack_count(255, true, &mut out).unwrap();
        assert_eq!(out, vec![255]);
        assert_eq!(
            Number::Uint8.pack_count(256, true, &mut out).unwrap_err(),
            Error::CountOverflow {
                count: 256,
                prefix: "uint8",
                max: 255
            }
        );
        assert_eq!(Number::Int16.max_count(), 32767);
        assert_eq!(Number::Float32.max_count(), 1 << 24);
    }

    #[test]
    fn test_bulk_pads_and_truncates() {
        let mut out = vec![];
        Number::Int16
            .pack_bulk(&[Value::Int(1), Value::Int(2)], 3, true, &mut out)
            .unwrap();
        assert_eq!(out, vec![1, 0, 2, 0, 0, 0]);

        let mut out = vec![];
        Number::Uint8
            .pack_bulk(&[1.into(), 2.into(), 3.into()], 2, true, &mut out)
            .unwrap();
        assert_eq!(out, vec![1, 2]);

        let mut cursor = Cursor::new(&[1, 0, 2, 0]);
        assert_eq!(
            Number::Uint16.unpack_bulk(&mut cursor, 2, true).unwrap(),
            vec![Value::Int(1), Value::Int(2)]
        );
    }
}
