//! `enums`: symbolic names over a numeric base schema.

use crate::{
    bytes::Cursor,
    context::Context,
    errors::{Error, Result},
    number::Number,
    schema::{Candidate, Schema},
    together::{Arg, Constructor, take_args},
    value::Value,
};

/// Maps names to numbers of `base`. Names keep their declaration order, which
/// decides the winner when several names share a number.
pub fn enums<K, I>(map: I, base: impl Into<Candidate>) -> Candidate
where
    K: Into<String>,
    I: IntoIterator<Item = (K, i64)>,
{
    Schema::Enums {
        map: map.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        base: base.into(),
    }
    .into()
}

/// Names numbered by position: the first is `0`.
pub fn enums_list<K, I>(names: I, base: impl Into<Candidate>) -> Candidate
where
    K: Into<String>,
    I: IntoIterator<Item = K>,
{
    enums(names.into_iter().zip(0..), base)
}

pub static ENUMS: Constructor = Constructor {
    namespace: "enums",
    arity: 2,
    build: build_enums,
};

fn build_enums(args: Vec<Arg>) -> Result<Candidate> {
    let [map, base] = take_args("enums", args)?;
    let base = base.into_candidate("enums")?;
    match map.into_value("enums")? {
        Value::Array(names) => {
            let names = names
                .into_iter()
                .map(|name| match name {
                    Value::String(name) => Ok(name),
                    other => Err(Error::invalid("enums", format!("bad enum name {other}"))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(enums_list(names, base))
        }
        Value::Object(map) => {
            let map = map
                .into_iter()
                .map(|(name, value)| match value {
                    Value::Int(value) => Ok((name, value)),
                    other => Err(Error::invalid(
                        "enums",
                        format!("`{name}` maps to {other}, expected an integer"),
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(enums(map, base))
        }
        other => Err(Error::invalid(
            "enums",
            format!("map must be a list or an object, found {other}"),
        )),
    }
}

fn base_number(ctx: &Context<'_, '_>, base: &Candidate) -> Result<Number> {
    match ctx.resolve(base)?.as_ref() {
        Schema::Number(number) => Ok(*number),
        other => Err(Error::invalid(
            "enums",
            format!("base schema {other} is not numeric"),
        )),
    }
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    map: &[(String, i64)],
    base: &Candidate,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let raw = base_number(ctx, base)?.unpack(cursor, ctx.little_endian())?;
    let name = map
        .iter()
        .find(|(_, value)| raw.loosely_eq(&Value::Int(*value)))
        .map(|(name, _)| Value::from(name.as_str()));

    Ok(name.unwrap_or(raw))
}

/// Numbers pass through unchanged; names must be part of the map.
pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    map: &[(String, i64)],
    base: &Candidate,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let number = base_number(ctx, base)?;
    let little_endian = ctx.little_endian();
    match value {
        Value::Int(_) | Value::Float(_) | Value::Null => number.pack(value, little_endian, out),
        Value::String(name) => {
            let Some((_, mapped)) = map.iter().find(|(key, _)| key == name) else {
                return Err(Error::UnknownEnumValue(name.clone()));
            };
            number.pack(&Value::Int(*mapped), little_endian, out)
        }
        other => Err(Error::TypeMismatch {
            expected: "enum name or number",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{registry::Registry, test_util::init_logger};

    const WEEK: [&str; 7] = ["Sun", "Mon", "Tues", "Wed", "Thur", "Fri", "Sat"];

    fn http_status() -> Candidate {
        enums(
            [
                ("Unknown", -1),
                ("Continue", 100),
                ("Processing", 100),
                ("OK", 200),
                ("Created", 201),
                ("NotFound", 404),
            ],
            "int8",
        )
    }

    #[test]
    fn test_list_map() {
        init_logger();
        let registry = Registry::new();
        let schema = enums_list(WEEK, "uint8");
        assert_eq!(
            schema.to_string(),
            "enums({Sun:0,Mon:1,Tues:2,Wed:3,Thur:4,Fri:5,Sat:6},'uint8')"
        );

        let bytes = registry.pack(&schema, &"Tues".into()).unwrap();
        assert_eq!(bytes, vec![2]);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), "Tues".into());
    }

    #[test]
    fn test_object_map() {
        let registry = Registry::new();
        let schema = http_status();
        assert_eq!(
            schema.to_string(),
            "enums({Unknown:-1,Continue:100,Processing:100,OK:200,Created:201,NotFound:404},'int8')"
        );

        let bytes = registry.pack(&schema, &"Unknown".into()).unwrap();
        assert_eq!(bytes, vec![255]);
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), "Unknown".into());

        // shared numbers unpack to the first name
        let bytes = registry.pack(&schema, &"Processing".into()).unwrap();
        assert_eq!(registry.unpack(&schema, &bytes).unwrap(), "Continue".into());
    }

    #[test]
    fn test_raw_numbers_pass_through() {
        let registry = Registry::new();
        let bytes = registry.pack(http_status(), &Value::Int(2)).unwrap();
        assert_eq!(bytes, vec![2]);
        assert_eq!(registry.unpack(http_status(), &bytes).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::new();
        assert_eq!(
            registry.pack(http_status(), &"Teapot".into()).unwrap_err(),
            Error::UnknownEnumValue("Teapot".to_string())
        );
    }

    #[test]
    fn test_base_must_be_numeric() {
        let registry = Registry::new();
        let err = registry
            .pack(enums_list(WEEK, "shortString"), &"Sun".into())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { constructor: "enums", .. }));
    }

    #[test]
    fn test_constructor_accepts_list_and_object() {
        let list = ENUMS
            .call([Value::from(vec!["A", "B"]).into(), "uint8".into()])
            .unwrap()
            .into_candidate()
            .unwrap();
        assert_eq!(list.to_string(), "enums({A:0,B:1},'uint8')");

        let object: Value = [("X", 7)].into_iter().collect();
        let built = ENUMS
            .partial()
            .arg(object)
            .apply(["uint16".into()])
            .unwrap()
            .into_candidate()
            .unwrap();
        assert_eq!(built.to_string(), "enums({X:7},'uint16')");

        let err = ENUMS.call([Value::Int(1).into(), "uint8".into()]).err();
        assert!(matches!(err, Some(Error::InvalidArgument { constructor: "enums", .. })));
    }
}
