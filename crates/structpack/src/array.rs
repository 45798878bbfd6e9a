//! `array`, `bytes` and the length-prefixed array presets, plus the raw byte
//! region helpers shared by strings and `parse`.

use log::trace;

use crate::{
    bytes::Cursor,
    context::Context,
    errors::{Error, Result},
    number::Number,
    schema::{Candidate, Count, Schema},
    together::{Arg, Constructor, take_args},
    value::{NULL, Value},
};

/// `count` elements of `item`.
pub fn array(item: impl Into<Candidate>, count: impl Into<Count>) -> Candidate {
    Schema::Array {
        item: item.into(),
        count: count.into(),
    }
    .into()
}

/// `array('uint8', count)`.
pub fn bytes(count: impl Into<Count>) -> Candidate {
    array(Number::Uint8, count)
}

/// Array prefixed with a uint8 count.
pub fn short_array(item: impl Into<Candidate>) -> Candidate {
    array(item, Number::Uint8)
}

/// Array prefixed with a uint16 count.
pub fn small_array(item: impl Into<Candidate>) -> Candidate {
    array(item, Number::Uint16)
}

/// Array prefixed with a uint32 count.
pub fn long_array(item: impl Into<Candidate>) -> Candidate {
    array(item, Number::Uint32)
}

pub static ARRAY: Constructor = Constructor {
    namespace: "array",
    arity: 2,
    build: build_array,
};

pub static BYTES: Constructor = Constructor {
    namespace: "bytes",
    arity: 1,
    build: build_bytes,
};

pub static SHORT_ARRAY: Constructor = Constructor {
    namespace: "shortArray",
    arity: 1,
    build: |args| build_prefixed("shortArray", args, Number::Uint8),
};

pub static SMALL_ARRAY: Constructor = Constructor {
    namespace: "smallArray",
    arity: 1,
    build: |args| build_prefixed("smallArray", args, Number::Uint16),
};

pub static LONG_ARRAY: Constructor = Constructor {
    namespace: "longArray",
    arity: 1,
    build: |args| build_prefixed("longArray", args, Number::Uint32),
};

fn build_array(args: Vec<Arg>) -> Result<Candidate> {
    let [item, count] = take_args("array", args)?;
    Ok(array(
        item.into_candidate("array")?,
        count.into_count("array")?,
    ))
}

fn build_bytes(args: Vec<Arg>) -> Result<Candidate> {
    let [count] = take_args("bytes", args)?;
    Ok(bytes(count.into_count("bytes")?))
}

fn build_prefixed(namespace: &'static str, args: Vec<Arg>, count: Number) -> Result<Candidate> {
    let [item] = take_args(namespace, args)?;
    Ok(array(item.into_candidate(namespace)?, count))
}

fn count_number(ctx: &Context<'_, '_>, schema: &Candidate) -> Result<Number> {
    match ctx.resolve(schema)?.as_ref() {
        Schema::Number(number) => Ok(*number),
        other => Err(Error::invalid(
            "array",
            format!("count schema {other} is not numeric"),
        )),
    }
}

/// Reads the element count; `None` means "until the input ends".
pub(crate) fn unpack_count(
    ctx: &Context<'_, '_>,
    count: &Count,
    cursor: &mut Cursor<'_>,
) -> Result<Option<usize>> {
    match count {
        Count::Static(n) => Ok(Some(*n)),
        Count::Prefixed(schema) => {
            let value = count_number(ctx, schema)?.unpack(cursor, ctx.little_endian())?;
            value.as_usize().map(Some).ok_or(Error::TypeMismatch {
                expected: "count",
                found: value.type_name(),
            })
        }
        Count::Auto => Ok(None),
    }
}

/// Writes the prefix of a prefixed count; other counts write nothing.
pub(crate) fn pack_count(
    ctx: &Context<'_, '_>,
    count: &Count,
    len: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    if let Count::Prefixed(schema) = count {
        count_number(ctx, schema)?.pack_count(len, ctx.little_endian(), out)?;
    }

    Ok(())
}

/// Reads a raw byte region sized by `count`.
pub(crate) fn unpack_raw<'a>(
    ctx: &Context<'_, '_>,
    count: &Count,
    cursor: &mut Cursor<'a>,
) -> Result<&'a [u8]> {
    match unpack_count(ctx, count, cursor)? {
        Some(n) => cursor.take(n),
        None => cursor.take(cursor.remaining()),
    }
}

/// Writes a raw byte region sized by `count`. Static regions are zero-padded
/// or truncated to their size.
pub(crate) fn pack_raw(
    ctx: &Context<'_, '_>,
    count: &Count,
    bytes: &[u8],
    out: &mut Vec<u8>,
) -> Result<()> {
    if let Count::Static(size) = count {
        let kept = bytes.len().min(*size);
        out.extend_from_slice(&bytes[..kept]);
        out.resize(out.len() + size - kept, 0);
        return Ok(());
    }

    pack_count(ctx, count, bytes.len(), out)?;
    out.extend_from_slice(bytes);

    Ok(())
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    item: &Candidate,
    count: &Count,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let length = unpack_count(ctx, count, cursor)?;
    unpack_items(ctx, item, length, cursor)
}

/// Reads `length` elements, or elements until the input ends.
pub(crate) fn unpack_items(
    ctx: &mut Context<'_, '_>,
    item: &Candidate,
    length: Option<usize>,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let schema = ctx.resolve(item)?;

    if let Schema::Number(number) = schema.as_ref() {
        let little_endian = ctx.little_endian();
        let length = length.unwrap_or(cursor.remaining() / number.size());
        if number.supports_bulk(little_endian) {
            trace!("bulk unpack of {length} x {}", number.name());
            return number
                .unpack_bulk(cursor, length, little_endian)
                .map(Value::Array);
        }

        let mut items = Vec::with_capacity(length.min(cursor.remaining()));
        for _ in 0..length {
            items.push(number.unpack(cursor, little_endian)?);
        }
        return Ok(Value::Array(items));
    }

    let mut items = vec![];
    match length {
        Some(length) => {
            items.reserve(length.min(cursor.remaining()));
            for _ in 0..length {
                items.push(schema.unpack(ctx, cursor)?);
            }
        }
        None => {
            while !cursor.is_empty() {
                let before = cursor.position();
                let value = schema.unpack(ctx, cursor)?;
                if cursor.position() == before {
                    break;
                }
                items.push(value);
            }
        }
    }

    Ok(Value::Array(items))
}

/// The elements of an array input. `Null` is the empty array.
pub(crate) fn items_of(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(&[]),
        other => Err(Error::TypeMismatch {
            expected: "array",
            found: other.type_name(),
        }),
    }
}

pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    item: &Candidate,
    count: &Count,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let items = items_of(value)?;
    let length = match count {
        Count::Static(n) => *n,
        _ => items.len(),
    };
    pack_count(ctx, count, items.len(), out)?;
    pack_items(ctx, item, items, length, out)
}

/// Writes exactly `length` elements: missing ones pack as `Null`, extra ones
/// are dropped.
pub(crate) fn pack_items(
    ctx: &mut Context<'_, '_>,
    item: &Candidate,
    items: &[Value],
    length: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let schema = ctx.resolve(item)?;

    if let Schema::Number(number) = schema.as_ref() {
        let little_endian = ctx.little_endian();
        if number.supports_bulk(little_endian) {
            trace!("bulk pack of {length} x {}", number.name());
            return number.pack_bulk(items, length, little_endian, out);
        }
    }

    for i in 0..length {
        schema.pack(ctx, items.get(i).unwrap_or(&NULL), out)?;
    }

    Ok(())
}
