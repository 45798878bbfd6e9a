//! Schemas that look at sibling fields of the enclosing object: `depend`,
//! `link`, `cases`, `virtual` and `exit`.

use std::{fmt, sync::Arc};

use crate::{
    array::{self, ARRAY},
    bytes::{Cursor, patch_at},
    context::Context,
    errors::{Error, Result},
    schema::{Candidate, Schema},
    together::{Arg, Constructor, Partial, Selector, take_args},
    value::Value,
};

/// Operator function of `virtual`.
pub type ValueFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// First argument of `virtual`.
#[derive(Clone)]
pub enum Operator {
    /// Strings and numbers are added to the dependent value; any other value
    /// is ignored and the dependent value is returned as is.
    Value(Value),
    Function(ValueFn),
}

impl Operator {
    pub fn function<F>(operator: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Operator::Function(Arc::new(operator))
    }

    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Operator::Value(operand @ (Value::Int(_) | Value::Float(_) | Value::String(_))) => {
                add(operand, value)
            }
            Operator::Value(_) => value.clone(),
            Operator::Function(operator) => operator(value),
        }
    }
}

/// Numbers add; a string on either side concatenates the text forms.
fn add(lhs: &Value, rhs: &Value) -> Value {
    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (Value::String(_), _) | (_, Value::String(_)) => {
            Value::String(format!("{}{}", text(lhs), text(rhs)))
        }
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Value::Float(a + b),
            (Some(_), None) => a.clone(),
            _ => b.clone(),
        },
    }
}

impl From<Value> for Operator {
    fn from(value: Value) -> Self {
        Operator::Value(value)
    }
}

impl From<i32> for Operator {
    fn from(value: i32) -> Self {
        Operator::Value(value.into())
    }
}

impl From<i64> for Operator {
    fn from(value: i64) -> Self {
        Operator::Value(value.into())
    }
}

impl From<f64> for Operator {
    fn from(value: f64) -> Self {
        Operator::Value(value.into())
    }
}

impl From<&str> for Operator {
    fn from(value: &str) -> Self {
        Operator::Value(value.into())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Value(value) => write!(f, "{value}"),
            Operator::Function(_) => f.write_str("$fn"),
        }
    }
}

/// The schema of this field is chosen by `selector` from the value of the
/// sibling `field`, which must come earlier in the layout.
pub fn depend(field: impl Into<String>, selector: impl Into<Selector>) -> Candidate {
    Schema::Depend {
        field: field.into(),
        selector: selector.into(),
    }
    .into()
}

/// An array of `item` whose count is the value of `field`.
pub fn depend_array(field: impl Into<String>, item: impl Into<Candidate>) -> Candidate {
    let item: Candidate = item.into();
    depend(field, ARRAY.partial().arg(item))
}

/// An array of `item` whose count is stored in the earlier sibling `field`.
///
/// Packing ignores the input value of `field`: the count is written back
/// into the bytes of `field` once the array length is known.
pub fn link(field: impl Into<String>, item: impl Into<Candidate>) -> Candidate {
    Schema::Link {
        field: field.into(),
        item: item.into(),
    }
    .into()
}

/// A selector picking the schema paired with the first matching value.
pub fn cases<V, C, I>(patterns: I) -> Partial
where
    V: Into<Value>,
    C: Into<Candidate>,
    I: IntoIterator<Item = (V, C)>,
{
    let patterns: Vec<(Value, Candidate)> = patterns
        .into_iter()
        .map(|(value, schema)| (value.into(), schema.into()))
        .collect();
    CASES.partial().arg(patterns)
}

/// A zero-width field computed from the value it is given, typically through
/// `depend`.
pub fn r#virtual(operator: impl Into<Operator>) -> Partial {
    let operator: Operator = operator.into();
    VIRTUAL.partial().arg(operator)
}

/// Stops processing of the enclosing object.
pub fn exit() -> Candidate {
    Schema::Exit.into()
}

pub static DEPEND: Constructor = Constructor {
    namespace: "depend",
    arity: 2,
    build: build_depend,
};

pub static DEPEND_ARRAY: Constructor = Constructor {
    namespace: "dependArray",
    arity: 2,
    build: build_depend_array,
};

pub static LINK: Constructor = Constructor {
    namespace: "link",
    arity: 2,
    build: build_link,
};

pub static CASES: Constructor = Constructor {
    namespace: "cases",
    arity: 2,
    build: build_cases,
};

pub static VIRTUAL: Constructor = Constructor {
    namespace: "virtual",
    arity: 2,
    build: build_virtual,
};

pub static EXIT: Constructor = Constructor {
    namespace: "exit",
    arity: 0,
    build: |_| Ok(exit()),
};

fn build_depend(args: Vec<Arg>) -> Result<Candidate> {
    let [field, selector] = take_args("depend", args)?;
    Ok(depend(
        field.into_field("depend")?,
        selector.into_selector("depend")?,
    ))
}

fn build_depend_array(args: Vec<Arg>) -> Result<Candidate> {
    let [field, item] = take_args("dependArray", args)?;
    Ok(depend_array(
        field.into_field("dependArray")?,
        item.into_candidate("dependArray")?,
    ))
}

fn build_link(args: Vec<Arg>) -> Result<Candidate> {
    let [field, item] = take_args("link", args)?;
    Ok(link(field.into_field("link")?, item.into_candidate("link")?))
}

fn build_cases(args: Vec<Arg>) -> Result<Candidate> {
    let [patterns, value] = take_args("cases", args)?;
    let Arg::Cases(patterns) = patterns else {
        return Err(Error::invalid(
            "cases",
            format!("expected [value, schema] pairs, found {patterns}"),
        ));
    };
    let value = value.into_value("cases")?;

    patterns
        .into_iter()
        .find(|(candidate, _)| candidate.loosely_eq(&value))
        .map(|(_, schema)| schema)
        .ok_or_else(|| Error::UnregisteredSchema(format!("cases({value})")))
}

fn build_virtual(args: Vec<Arg>) -> Result<Candidate> {
    let [operator, value] = take_args("virtual", args)?;
    let operator = match operator {
        Arg::Operator(operator) => operator,
        Arg::Value(value) => Operator::Value(value),
        other => {
            return Err(Error::invalid(
                "virtual",
                format!("expected an operator, found {other}"),
            ));
        }
    };

    Ok(Schema::Virtual {
        operator,
        value: value.into_value("virtual")?,
    }
    .into())
}

/// Value of the sibling `field`, which must already be known.
fn sibling(ctx: &mut Context<'_, '_>, namespace: &'static str, field: &str) -> Result<Value> {
    ctx.require_scope(namespace)?
        .field(field)
        .cloned()
        .ok_or_else(|| Error::UndefinedDependency(field.to_string()))
}

pub(crate) fn unpack(
    ctx: &mut Context<'_, '_>,
    field: &str,
    selector: &Selector,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let dependent = sibling(ctx, "depend", field)?;
    let schema = selector.select(&dependent)?;
    ctx.unpack(&schema, cursor)
}

pub(crate) fn pack(
    ctx: &mut Context<'_, '_>,
    field: &str,
    selector: &Selector,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let dependent = sibling(ctx, "depend", field)?;
    let schema = selector.select(&dependent)?;
    ctx.pack(&schema, value, out)
}

pub(crate) fn unpack_link(
    ctx: &mut Context<'_, '_>,
    field: &str,
    item: &Candidate,
    cursor: &mut Cursor<'_>,
) -> Result<Value> {
    let count = sibling(ctx, "link", field)?;
    let Some(count) = count.as_usize() else {
        return Err(Error::TypeMismatch {
            expected: "count",
            found: count.type_name(),
        });
    };

    array::unpack_items(ctx, item, Some(count), cursor)
}

pub(crate) fn pack_link(
    ctx: &mut Context<'_, '_>,
    field: &str,
    item: &Candidate,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<()> {
    let items = array::items_of(value)?;

    let scope = ctx.require_scope("link")?;
    let (Some(count_schema), Some(offset)) = (scope.field_schema(field), scope.offset(field))
    else {
        return Err(Error::UndefinedDependency(field.to_string()));
    };

    let mut count = vec![];
    match ctx.resolve(count_schema)?.as_ref() {
        Schema::Number(number) => {
            number.pack_count(items.len(), ctx.little_endian(), &mut count)?
        }
        _ => ctx.pack(count_schema, &Value::from(items.len()), &mut count)?,
    }
    patch_at(out, offset, &count);

    array::pack_items(ctx, item, items, items.len(), out)
}

pub(crate) fn exit_scope(ctx: &mut Context<'_, '_>) -> Result<()> {
    ctx.require_scope("exit")?.exit();
    Ok(())
}
