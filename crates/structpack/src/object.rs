//! `object`, `union` and `merge`.
//!
//! Both bodies open a [`Scope`] so later fields can look at earlier ones.
//! Fields are processed in layout order; after `exit` fires the rest of the
//! body is skipped and unpacks as `Null`.

use indexmap::IndexMap;
use log::debug;

use crate::{
    bytes::Cursor,
    context::{Context, Scope},
    errors::{Error, Result},
    registry::Registry,
    schema::{Candidate, Layout, Schema},
    together::{Arg, Constructor, take_args},
    value::{NULL, Value},
};

pub fn object(layout: impl Into<Layout>) -> Candidate {
    Schema::Object(layout.into()).into()
}

/// Fields that all start at the same offset of a `size`-byte region.
pub fn union(layout: impl Into<Layout>, size: usize) -> Candidate {
    Schema::Union {
        layout: layout.into(),
        size,
    }
    .into()
}

pub static OBJECT: Constructor = Constructor {
    namespace: "object",
    arity: 1,
    build: build_object,
};

pub static UNION: Constructor = Constructor {
    namespace: "union",
    arity: 2,
    build: build_union,
};

fn build_object(args: Vec<Arg>) -> Result<Candidate> {
    let [layout] = take_args("object", args)?;
    match layout {
        Arg::Schema(Candidate::Schema(schema)) if matches!(*schema, Schema::Object(_)) => {
            Ok(Candidate::Schema(schema))
        }
        other => Ok(object(other.into_layout("object")?)),
    }
}

fn build_union(args: Vec<Arg>) -> Result<Candidate> {
    let [layout, size] = take_args("union", args)?;
    Ok(union(layout.into_layout("union")?, size.into_usize("union")?))
}

/// Combines the fields of several `object` schemas into one; on name
/// collisions the later schema wins.
pub fn merge<I, C>(registry: &Registry, schemas: I) -> Result<Candidate>
where
    I: IntoIterator<Item = C>,
    C: Into<Candidate>,
{
    let mut fields = IndexMap::new();
    for candidate in schemas {
        let schema = registry.resolve(&candidate.into())?;
        let Schema::Object(layout) = schema.as_ref() else {
            return Err(Error::invalid(
                "merge",
                format!("{schema} is not an object"),
            ));
        };
        for (key, field) in layout.iter() {
            fields.insert(key.into_owned(), field.clone());
        }
    }

    Ok(object(Layout::Named(fields)))
}

/// Input of an object body: a mapping for named layouts, a list for
/// positional ones. `Null` packs every field as `Null`.
fn check_shape(layout: &Layout, value: &Value) -> Result<()> {
    match (layout, value) {
        (_, Value::Null) | (Layout::Named(_), Value::Object(_)) => Ok(()),
        (Layout::Positional(_), Value::Array(_)) => Ok(()),
        (Layout::Named(_), other) => Err(Error::TypeMismatch {
            expected: "object",
            found: other.type_name(),
        }),
        (Layout::Positional(_), other) => Err(Error::TypeMismatch {
            expected: "array",
            found: other.type_name(),
        }),
    }
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    layout: &Layout,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let mut scope = Scope::unpacking(layout);
    for (key, field) in layout.iter() {
        if scope.is_exited() {
            scope.push(&key, Value::Null);
            continue;
        }
        let value = ctx.enter(&mut scope).unpack(field, cursor)?;
        scope.push(&key, value);
    }

    Ok(scope.into_value())
}

pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    layout: &Layout,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    check_shape(layout, value)?;

    let mut scope = Scope::packing(layout, value);
    for (key, field) in layout.iter() {
        if scope.is_exited() {
            break;
        }
        scope.mark(&key, out.len());
        let field_value = value.get(&key).unwrap_or(&NULL);
        ctx.enter(&mut scope).pack(field, field_value, out)?;
    }

    Ok(())
}

/// Every field reads from the same `size`-byte window; the cursor then moves
/// past the window once.
pub(crate) fn unpack_union(
    ctx: &mut Context<'_, '_>,
    layout: &Layout,
    size: usize,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let window = cursor.take(size)?;

    let mut scope = Scope::unpacking(layout);
    for (key, field) in layout.iter() {
        if scope.is_exited() {
            scope.push(&key, Value::Null);
            continue;
        }
        let mut field_cursor = Cursor::new(window);
        let value = ctx.enter(&mut scope).unpack(field, &mut field_cursor)?;
        scope.push(&key, value);
    }

    Ok(scope.into_value())
}

/// Renders each present field into its own scratch buffer and overlays them
/// onto one zeroed `size`-byte region, later fields on top.
pub(crate) fn pack_union(
    ctx: &mut Context<'_, '_>,
    layout: &Layout,
    size: usize,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    check_shape(layout, value)?;

    let mut region = vec![0u8; size];
    let mut scope = Scope::packing(layout, value);
    for (key, field) in layout.iter() {
        if scope.is_exited() {
            break;
        }
        let Some(field_value) = value.get(&key) else {
            continue;
        };

        let mut scratch = vec![];
        ctx.enter(&mut scope).pack(field, field_value, &mut scratch)?;
        if scratch.len() > size {
            debug!(
                "union field `{key}` packed {} bytes, truncated to {size}",
                scratch.len()
            );
            scratch.truncate(size);
        }
        region[..scratch.len()].copy_from_slice(&scratch);
    }
    out.extend_from_slice(&region);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array::bytes, number::Number, options::Options, string::string};

    fn person() -> Layout {
        Layout::named()
            .field("name", "shortString")
            .field("year", "word")
    }

    fn zswang() -> Value {
        [("name", Value::from("zswang")), ("year", Value::from(1978))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_named_object() {
        let registry = Registry::new();
        let schema = object(person());
        assert_eq!(schema.to_string(), "object({name:'shortString',year:'word'})");

        let bytes = registry.pack(&schema, &zswang()).unwrap();
        assert_eq!(bytes, vec![6, 122, 115, 119, 97, 110, 103, 186, 7]);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), zswang());
    }

    #[test]
    fn test_positional_object() {
        let registry = Registry::new();
        let schema = object(
            Layout::positional()
                .item(string(Number::Uint8))
                .item(Number::Uint16),
        );
        assert_eq!(schema.to_string(), "object([string('uint8'),'uint16'])");

        let value = Value::from(vec![Value::from("zswang"), Value::from(1978)]);
        let bytes = registry.pack(&schema, &value).unwrap();
        assert_eq!(bytes, vec![6, 122, 115, 119, 97, 110, 103, 186, 7]);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn test_missing_fields_pack_as_zero() {
        let registry = Registry::new();
        let value: Value = [("year", 1)].into_iter().collect();
        assert_eq!(registry.pack(object(person()), &value).unwrap(), vec![0, 1, 0]);
        assert_eq!(
            registry.pack(object(person()), &Value::Null).unwrap(),
            vec![0, 0, 0]
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let registry = Registry::new();
        assert_eq!(
            registry
                .pack(object(person()), &Value::from(vec![1, 2]))
                .unwrap_err(),
            Error::TypeMismatch {
                expected: "object",
                found: "array"
            }
        );
    }

    #[test]
    fn test_nested_objects() {
        let mut registry = Registry::new();
        registry.register("person", person());
        let schema = Layout::named().field("a", "person").field("b", "person");
        let value: Value = [("a", zswang()), ("b", zswang())].into_iter().collect();
        let bytes = registry.pack(schema.clone(), &value).unwrap();
        assert_eq!(bytes.len(), 18);
        assert_eq!(registry.unpack(schema, &bytes).unwrap(), value);
    }

    #[test]
    fn test_union_overlay() {
        let registry = Registry::new();
        let schema = union(
            Layout::named()
                .field("length", "uint8")
                .field("content", string(Number::Uint8)),
            20,
        );
        assert_eq!(
            schema.to_string(),
            "union({length:'uint8',content:string('uint8')},20)"
        );

        let value: Value = [("content", "0123456789")].into_iter().collect();
        let bytes = registry.pack(&schema, &value).unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(bytes[0], 10);
        assert_eq!(&bytes[1..11], b"0123456789");
        assert!(bytes[11..].iter().all(|&b| b == 0));

        let unpacked = registry.unpack(&schema, &bytes).unwrap();
        assert_eq!(unpacked.get("length"), Some(&Value::Int(10)));
        assert_eq!(unpacked.get("content"), Some(&"0123456789".into()));
    }

    #[test]
    fn test_union_views_share_bytes() {
        let registry = Registry::new();
        let mut layout = Layout::named().field("bytes", bytes(8));
        for name in ["int8", "int16", "int32", "uint16", "word"] {
            layout = layout.field(name, name);
        }
        let schema = union(layout, 8);

        let value: Value = [(
            "bytes",
            Value::from(vec![0x12, 0x23, 0x34, 0x45, 0x56, 0x67, 0x78, 0x89]),
        )]
        .into_iter()
        .collect();
        let data = registry.pack(&schema, &value).unwrap();
        assert_eq!(data, vec![0x12, 0x23, 0x34, 0x45, 0x56, 0x67, 0x78, 0x89]);

        let unpacked = registry.unpack(&schema, &data).unwrap();
        assert_eq!(unpacked.get("int8"), Some(&Value::Int(18)));
        assert_eq!(unpacked.get("int16"), Some(&Value::Int(8978)));
        assert_eq!(unpacked.get("int32"), Some(&Value::Int(1161044754)));
        assert_eq!(unpacked.get("word"), Some(&Value::Int(8978)));
    }

    #[test]
    fn test_union_advances_by_size() {
        let registry = Registry::new();
        let schema = Layout::named()
            .field("u", union(Layout::named().field("a", "uint8"), 4))
            .field("tail", "uint8");
        let value = registry.unpack(schema, [1u8, 2, 3, 4, 5]).unwrap();
        assert_eq!(value.get("tail"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_union_underflow() {
        let registry = Registry::new();
        let err = registry
            .unpack(union(Layout::named().field("a", "uint8"), 4), [1u8, 2])
            .unwrap_err();
        assert!(matches!(err, Error::BufferUnderflow { needed: 4, .. }));
    }

    #[test]
    fn test_union_truncates_long_field() {
        let registry = Registry::new();
        let schema = union(Layout::named().field("text", string(Number::Uint8)), 3);
        let value: Value = [("text", "abcdef")].into_iter().collect();
        assert_eq!(registry.pack(schema, &value).unwrap(), vec![6, b'a', b'b']);
    }

    #[test]
    fn test_merge() {
        let mut registry = Registry::new();
        registry.register("head", Layout::named().field("id", "uint8").field("kind", "uint8"));
        let merged = merge(
            &registry,
            [
                Candidate::from("head"),
                object(Layout::named().field("kind", "uint16").field("body", "uint8")),
            ],
        )
        .unwrap();
        assert_eq!(
            merged.to_string(),
            "object({id:'uint8',kind:'uint16',body:'uint8'})"
        );

        let err = merge(&registry, ["uint8"]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { constructor: "merge", .. }));
    }

    #[test]
    fn test_built_from_partial() {
        let registry = Registry::new();
        let schema = UNION
            .call([person().into()])
            .unwrap()
            .then([4.into()])
            .unwrap()
            .into_candidate()
            .unwrap();
        assert_eq!(schema.to_string(), "union({name:'shortString',year:'word'},4)");
        assert_eq!(
            registry
                .pack_with(schema, &zswang(), &Options::big_endian())
                .unwrap(),
            vec![7, 0xba, b's', b'w']
        );
    }
}
