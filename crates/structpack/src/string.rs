//! Text schemas: `string` has the layout of `array('uint8', size)`; `cstring`
//! is zero-terminated. Text is converted with [`Options::encoding`].
//!
//! [`Options::encoding`]: crate::options::Options::encoding

use crate::{
    array::{pack_raw, unpack_raw},
    bytes::Cursor,
    context::Context,
    errors::{Error, Result},
    number::Number,
    registry::Registry,
    schema::{Candidate, Count, Schema},
    together::{Arg, Constructor, take_args},
    value::Value,
};

pub fn string(size: impl Into<Count>) -> Candidate {
    Schema::String { size: size.into() }.into()
}

/// Zero-terminated string. With [`Count::Auto`] the terminator ends the
/// value; with a size the value occupies a fixed or prefixed region.
pub fn cstring(size: impl Into<Count>) -> Candidate {
    Schema::CString { size: size.into() }.into()
}

pub static STRING: Constructor = Constructor {
    namespace: "string",
    arity: 1,
    build: build_string,
};

pub static CSTRING: Constructor = Constructor {
    namespace: "cstring",
    arity: 1,
    build: build_cstring,
};

fn build_string(args: Vec<Arg>) -> Result<Candidate> {
    let [size] = take_args("string", args)?;
    Ok(string(size.into_count("string")?))
}

fn build_cstring(args: Vec<Arg>) -> Result<Candidate> {
    let [size] = take_args("cstring", args)?;
    Ok(cstring(size.into_count("cstring")?))
}

/// Registers `shortString`, `smallString`, `longString` and `pchar`.
pub(crate) fn install_presets(registry: &mut Registry) {
    registry
        .register("shortString", string(Number::Uint8))
        .register("smallString", string(Number::Uint16))
        .register("longString", string(Number::Uint32))
        .register("pchar", cstring(Count::Auto));
}

fn text_of(value: &Value) -> Result<&str> {
    match value {
        Value::String(text) => Ok(text),
        Value::Null => Ok(""),
        other => Err(Error::TypeMismatch {
            expected: "string",
            found: other.type_name(),
        }),
    }
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    size: &Count,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let mut raw = unpack_raw(ctx, size, cursor)?;
    if let Count::Static(_) = size {
        while let [rest @ .., 0] = raw {
            raw = rest;
        }
    }

    ctx.options().encoding.decode(raw).map(Value::String)
}

pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    size: &Count,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let bytes = ctx.options().encoding.encode(text_of(value)?)?;
    pack_raw(ctx, size, &bytes, out)
}

pub(crate) fn unpack_cstring(
    ctx: &mut Context<'_, '_>,
    size: &Count,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let raw = match size {
        Count::Auto => {
            let rest = cursor.rest();
            let Some(end) = rest.iter().position(|&b| b == 0) else {
                return Err(Error::BufferUnderflow {
                    offset: cursor.position(),
                    needed: rest.len() + 1,
                    available: rest.len(),
                });
            };
            &cursor.take(end + 1)?[..end]
        }
        _ => {
            let region = unpack_raw(ctx, size, cursor)?;
            let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
            &region[..end]
        }
    };

    ctx.options().encoding.decode(raw).map(Value::String)
}

pub(crate) fn pack_cstring(
    ctx: &mut Context<'_, '_>,
    size: &Count,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut bytes = ctx.options().encoding.encode(text_of(value)?)?;
    bytes.push(0);
    pack_raw(ctx, size, &bytes, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        array::array,
        options::{Encoding, Options},
        schema::Layout,
    };

    const GREETING: &str = "你好世界！Hello";

    #[test]
    fn test_static_string_pads_and_trims() {
        let registry = Registry::new();
        let schema = string(25);
        assert_eq!(schema.to_string(), "string(25)");
        let bytes = registry.pack(&schema, &GREETING.into()).unwrap();
        assert_eq!(bytes.len(), 25);
        assert_eq!(&bytes[..3], &[228, 189, 160]);
        assert_eq!(&bytes[20..], &[0, 0, 0, 0, 0]);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), GREETING.into());
    }

    #[test]
    fn test_prefixed_string() {
        let registry = Registry::new();
        let schema = string("int8");
        assert_eq!(schema.to_string(), "string('int8')");
        let bytes = registry.pack(&schema, &GREETING.into()).unwrap();
        assert_eq!(bytes[0], 20);
        assert_eq!(bytes.len(), 21);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), GREETING.into());
    }

    #[test]
    fn test_presets() {
        let registry = Registry::new();
        assert_eq!(
            registry.schema("shortString").unwrap().to_string(),
            "string('uint8')"
        );
        assert_eq!(
            registry.pack("shortString", &"shortString".into()).unwrap(),
            b"\x0bshortString".to_vec()
        );
        assert_eq!(
            registry
                .pack_with("smallString", &"smallString".into(), &Options::big_endian())
                .unwrap(),
            b"\x00\x0bsmallString".to_vec()
        );
        assert_eq!(
            registry
                .pack_with("longString", &"longString".into(), &Options::big_endian())
                .unwrap(),
            b"\x00\x00\x00\x0alongString".to_vec()
        );
    }

    #[test]
    fn test_prefix_overflow() {
        let registry = Registry::new();
        let text = "x".repeat(300);
        assert_eq!(
            registry.pack("shortString", &text.as_str().into()).unwrap_err(),
            Error::CountOverflow {
                count: 300,
                prefix: "uint8",
                max: 255
            }
        );
        let bytes = registry.pack("smallString", &text.as_str().into()).unwrap();
        assert_eq!(bytes[..2], [44u8, 1]);
        assert_eq!(registry.unpack("smallString", &bytes).unwrap(), text.into());
    }

    #[test]
    fn test_cstring_fixed() {
        let registry = Registry::new();
        let schema = cstring(32);
        assert_eq!(schema.to_string(), "cstring(32)");
        let bytes = registry.pack(&schema, &"Hello 你好！".into()).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[15], 0);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), "Hello 你好！".into());
    }

    #[test]
    fn test_cstring_auto() {
        let registry = Registry::new();
        let schema = cstring(Count::Auto);
        assert_eq!(schema.to_string(), "cstring(null)");
        let bytes = registry.pack(&schema, &"Hello 你好！".into()).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), "Hello 你好！".into());
    }

    #[test]
    fn test_cstring_stops_at_first_zero() {
        let registry = Registry::new();
        let schema = Layout::named().field("name", "pchar").field("tail", "uint8");
        let value = registry.unpack(schema, b"ab\0\x07\0\x09").unwrap();
        assert_eq!(value.get("name"), Some(&"ab".into()));
        assert_eq!(value.get("tail"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_cstring_without_terminator() {
        let registry = Registry::new();
        assert_eq!(
            registry.unpack("pchar", b"abc").unwrap_err(),
            Error::BufferUnderflow {
                offset: 0,
                needed: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_array_of_pchar() {
        let registry = Registry::new();
        let schema = array(registry.schema("pchar").unwrap(), "uint8");
        assert_eq!(schema.to_string(), "array(cstring(null),'uint8')");
        let value = Value::from(vec!["abc", "defghijk", "g"]);
        let bytes = registry.pack(&schema, &value).unwrap();
        assert_eq!(
            bytes,
            vec![3, 97, 98, 99, 0, 100, 101, 102, 103, 104, 105, 106, 107, 0, 103, 0]
        );
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn test_null_is_empty() {
        let registry = Registry::new();
        assert_eq!(registry.pack("shortString", &Value::Null).unwrap(), vec![0]);
        assert_eq!(registry.pack("pchar", &Value::Null).unwrap(), vec![0]);
    }

    #[test]
    fn test_ascii_encoding() {
        let registry = Registry::new();
        let mut options = Options::default();
        options.set_encoding(Encoding::Ascii);
        assert_eq!(
            registry
                .pack_with("shortString", &"héllo".into(), &options)
                .unwrap_err(),
            Error::InvalidEncoding(Encoding::Ascii)
        );
        assert_eq!(
            registry
                .unpack_with("shortString", [2, b'o', b'k'], &options)
                .unwrap(),
            "ok".into()
        );
    }

    #[test]
    fn test_rejects_numbers() {
        let registry = Registry::new();
        assert!(matches!(
            registry.pack("shortString", &Value::Int(1)),
            Err(Error::TypeMismatch { expected: "string", .. })
        ));
    }
}
